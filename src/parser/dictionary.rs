//! Dictionary DDL. The SOURCE / LAYOUT / LIFETIME clause bodies use the
//! keyword-value parameter form rather than expressions, e.g.
//! `SOURCE(CLICKHOUSE(HOST 'localhost' PORT 9000 TABLE 'src'))`.

use crate::error::AppError;
use crate::parser::ast::*;
use crate::parser::common::Parser;
use crate::parser::expr::parse_expr;
use crate::parser::lexer::TokenKind;
use crate::parser::types::parse_data_type;

pub fn parse_create_dictionary(p: &mut Parser, or_replace: bool) -> Result<CreateDictionary, AppError> {
    let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_object_name()?;
    let cluster = p.parse_on_cluster()?;

    let mut columns = Vec::new();
    if p.eat_symbol("(") {
        loop {
            columns.push(parse_dictionary_column(p)?);
            if !p.eat_symbol(",") {
                break;
            }
        }
        p.expect_symbol(")")?;
    }

    let mut dict = CreateDictionary {
        or_replace,
        if_not_exists,
        name,
        cluster,
        columns,
        primary_key: Vec::new(),
        source: None,
        layout: None,
        lifetime: None,
        settings: Vec::new(),
        comment: None,
    };

    loop {
        if p.eat_keywords(&["PRIMARY", "KEY"]) {
            dict.primary_key = p.parse_ident_list()?;
        } else if p.eat_keyword("SOURCE") {
            p.expect_symbol("(")?;
            if p.peek().kind != TokenKind::Ident {
                return Err(p.error(&["a source kind"]));
            }
            let source_name = p.advance().text;
            p.expect_symbol("(")?;
            let params = parse_kv_params(p)?;
            p.expect_symbol(")")?;
            p.expect_symbol(")")?;
            dict.source = Some(DictionarySource { name: source_name, params });
        } else if p.eat_keyword("LAYOUT") {
            p.expect_symbol("(")?;
            if p.peek().kind != TokenKind::Ident {
                return Err(p.error(&["a layout kind"]));
            }
            let layout_name = p.advance().text;
            let mut params = Vec::new();
            if p.eat_symbol("(") {
                params = parse_kv_params(p)?;
                p.expect_symbol(")")?;
            }
            p.expect_symbol(")")?;
            dict.layout = Some(DictionaryLayout { name: layout_name, params });
        } else if p.eat_keyword("LIFETIME") {
            p.expect_symbol("(")?;
            if p.eat_keyword("MIN") {
                let min = p.parse_u64()?;
                p.expect_keyword("MAX")?;
                let max = p.parse_u64()?;
                dict.lifetime = Some(Lifetime::MinMax { min, max });
            } else {
                dict.lifetime = Some(Lifetime::Single(p.parse_u64()?));
            }
            p.expect_symbol(")")?;
        } else if p.eat_keyword("SETTINGS") {
            p.expect_symbol("(")?;
            dict.settings = p.parse_settings_list()?;
            p.expect_symbol(")")?;
        } else if p.check_keyword("COMMENT") {
            p.advance();
            dict.comment = Some(p.parse_string()?);
        } else {
            break;
        }
    }
    Ok(dict)
}

fn parse_dictionary_column(p: &mut Parser) -> Result<DictionaryColumn, AppError> {
    let name = p.parse_ident()?;
    let data_type = parse_data_type(p)?;
    let mut column = DictionaryColumn {
        name,
        data_type,
        default: None,
        expression: None,
        hierarchical: false,
        injective: false,
        is_object_id: false,
    };
    loop {
        if p.eat_keyword("DEFAULT") {
            column.default = Some(parse_expr(p)?);
        } else if p.eat_keyword("EXPRESSION") {
            column.expression = Some(parse_expr(p)?);
        } else if p.eat_keyword("HIERARCHICAL") {
            column.hierarchical = true;
        } else if p.eat_keyword("INJECTIVE") {
            column.injective = true;
        } else if p.eat_keyword("IS_OBJECT_ID") {
            column.is_object_id = true;
        } else {
            break;
        }
    }
    Ok(column)
}

/// `KEY value KEY value ...` pairs inside SOURCE/LAYOUT bodies. Values are
/// expressions, which covers literals, identifiers and nested calls.
fn parse_kv_params(p: &mut Parser) -> Result<Vec<(crate::ident::Ident, Expr)>, AppError> {
    let mut out = Vec::new();
    while matches!(p.peek().kind, TokenKind::Ident | TokenKind::QuotedIdent) {
        let key = p.parse_ident()?;
        let value = parse_expr(p)?;
        out.push((key, value));
    }
    Ok(out)
}

pub fn parse_drop_dictionary(p: &mut Parser) -> Result<DropObject, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_object_name()?;
    let cluster = p.parse_on_cluster()?;
    let sync = p.eat_keyword("SYNC");
    Ok(DropObject { kind: ObjectKind::Dictionary, if_exists, name, cluster, sync })
}
