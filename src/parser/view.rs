//! View DDL: CREATE [MATERIALIZED] VIEW with TO targets, inner engines and
//! POPULATE, plus DROP VIEW.

use crate::error::AppError;
use crate::parser::ast::*;
use crate::parser::common::Parser;
use crate::parser::expr::parse_expr;
use crate::parser::lexer::TokenKind;
use crate::parser::select::parse_select_query;
use crate::parser::table::parse_engine;

pub fn parse_create_view(p: &mut Parser, or_replace: bool, materialized: bool) -> Result<CreateView, AppError> {
    let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_object_name()?;
    let cluster = p.parse_on_cluster()?;

    let mut view = CreateView {
        or_replace,
        if_not_exists,
        materialized,
        name,
        cluster,
        to: None,
        engine: None,
        order_by: None,
        partition_by: None,
        primary_key: None,
        sample_by: None,
        populate: false,
        query: SelectQuery {
            body: SelectBody {
                with: Vec::new(),
                distinct: false,
                items: Vec::new(),
                from: None,
                where_clause: None,
                group_by: Vec::new(),
                having: None,
                order_by: Vec::new(),
                limit: None,
                settings: Vec::new(),
            },
            unions: Vec::new(),
        },
        comment: None,
    };

    if p.eat_keyword("TO") {
        view.to = Some(parse_to_target(p)?);
    }

    loop {
        if p.check_keyword("ENGINE") {
            p.advance();
            view.engine = Some(parse_engine(p)?);
        } else if p.check_keywords(&["ORDER", "BY"]) {
            p.advance();
            p.advance();
            view.order_by = Some(parse_expr(p)?);
        } else if p.check_keywords(&["PARTITION", "BY"]) {
            p.advance();
            p.advance();
            view.partition_by = Some(parse_expr(p)?);
        } else if p.check_keywords(&["PRIMARY", "KEY"]) {
            p.advance();
            p.advance();
            view.primary_key = Some(parse_expr(p)?);
        } else if p.check_keywords(&["SAMPLE", "BY"]) {
            p.advance();
            p.advance();
            view.sample_by = Some(parse_expr(p)?);
        } else if p.check_keyword("POPULATE") {
            p.advance();
            view.populate = true;
        } else {
            break;
        }
    }

    p.expect_keyword("AS")?;
    view.query = parse_select_query(p)?;
    view.comment = p.parse_opt_comment()?;
    Ok(view)
}

fn parse_to_target(p: &mut Parser) -> Result<AsSource, AppError> {
    if p.peek().kind == TokenKind::Ident && p.peek_at(1).is_symbol("(") {
        let name = p.advance().text;
        p.expect_symbol("(")?;
        let mut args = Vec::new();
        if !p.check_symbol(")") {
            loop {
                args.push(parse_expr(p)?);
                if !p.eat_symbol(",") {
                    break;
                }
            }
        }
        p.expect_symbol(")")?;
        Ok(AsSource::TableFunction { name, args })
    } else {
        Ok(AsSource::Table(p.parse_object_name()?))
    }
}

pub fn parse_drop_view(p: &mut Parser) -> Result<DropObject, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_object_name()?;
    let cluster = p.parse_on_cluster()?;
    let sync = p.eat_keyword("SYNC");
    Ok(DropObject { kind: ObjectKind::View, if_exists, name, cluster, sync })
}
