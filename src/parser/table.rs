//! Table DDL: CREATE/ALTER TABLE plus the table-element grammar (columns,
//! indexes, constraints) and the engine clause shared with databases and
//! materialized views.

use crate::error::AppError;
use crate::parser::ast::*;
use crate::parser::common::Parser;
use crate::parser::expr::parse_expr;
use crate::parser::lexer::TokenKind;
use crate::parser::types::parse_data_type;

/// `ENGINE [=] Name[(params)]`. Parameters that are not valid expressions
/// are captured verbatim as opaque tokens so newer server spellings
/// round-trip.
pub fn parse_engine(p: &mut Parser) -> Result<Engine, AppError> {
    p.eat_symbol("=");
    if p.peek().kind != TokenKind::Ident {
        return Err(p.error(&["an engine name"]));
    }
    let name = p.advance().text;
    let mut params = None;
    if p.eat_symbol("(") {
        let mut list = Vec::new();
        if !p.check_symbol(")") {
            loop {
                list.push(parse_engine_param(p)?);
                if !p.eat_symbol(",") {
                    break;
                }
            }
        }
        p.expect_symbol(")")?;
        params = Some(list);
    }
    Ok(Engine { name, params })
}

fn parse_engine_param(p: &mut Parser) -> Result<EngineParam, AppError> {
    let checkpoint = p.save();
    match parse_expr(p) {
        Ok(expr) if p.check_symbol(",") || p.check_symbol(")") => Ok(EngineParam::Expr(expr)),
        _ => {
            // Collect raw tokens until the next top-level ',' or ')'.
            p.restore(checkpoint);
            let mut depth = 0usize;
            let mut raw: Vec<String> = Vec::new();
            loop {
                let tok = p.peek();
                if tok.kind == TokenKind::Eof {
                    return Err(p.error(&["')'"]));
                }
                if depth == 0 && (tok.is_symbol(",") || tok.is_symbol(")")) {
                    break;
                }
                if tok.is_symbol("(") {
                    depth += 1;
                } else if tok.is_symbol(")") {
                    depth -= 1;
                }
                let tok = p.advance();
                raw.push(match tok.kind {
                    TokenKind::StringLit => format!("'{}'", tok.text.replace('\\', "\\\\").replace('\'', "\\'")),
                    TokenKind::QuotedIdent => format!("`{}`", tok.text),
                    _ => tok.text,
                });
            }
            if raw.is_empty() {
                return Err(p.error(&["an engine parameter"]));
            }
            Ok(EngineParam::Opaque(raw.join(" ")))
        }
    }
}

pub fn parse_create_table(p: &mut Parser, or_replace: bool) -> Result<CreateTable, AppError> {
    let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_object_name()?;
    let cluster = p.parse_on_cluster()?;

    let mut elements = Vec::new();
    let mut as_source = None;

    if p.eat_symbol("(") {
        loop {
            elements.push(parse_table_element(p)?);
            if !p.eat_symbol(",") {
                break;
            }
        }
        p.expect_symbol(")")?;
    } else if p.eat_keyword("AS") {
        as_source = Some(parse_as_source(p)?);
    }

    let mut table = CreateTable {
        or_replace,
        if_not_exists,
        name,
        cluster,
        elements,
        engine: None,
        order_by: None,
        partition_by: None,
        primary_key: None,
        sample_by: None,
        ttl: None,
        settings: Vec::new(),
        as_source,
        comment: None,
    };
    parse_table_tail(p, &mut table)?;
    Ok(table)
}

/// Trailing clauses accepted in any order; each may appear once.
fn parse_table_tail(p: &mut Parser, t: &mut CreateTable) -> Result<(), AppError> {
    loop {
        if p.check_keyword("ENGINE") {
            p.advance();
            t.engine = Some(parse_engine(p)?);
        } else if p.check_keywords(&["ORDER", "BY"]) {
            p.advance();
            p.advance();
            t.order_by = Some(parse_expr(p)?);
        } else if p.check_keywords(&["PARTITION", "BY"]) {
            p.advance();
            p.advance();
            t.partition_by = Some(parse_expr(p)?);
        } else if p.check_keywords(&["PRIMARY", "KEY"]) {
            p.advance();
            p.advance();
            t.primary_key = Some(parse_expr(p)?);
        } else if p.check_keywords(&["SAMPLE", "BY"]) {
            p.advance();
            p.advance();
            t.sample_by = Some(parse_expr(p)?);
        } else if p.check_keyword("TTL") {
            p.advance();
            t.ttl = Some(parse_expr(p)?);
        } else if p.check_keyword("SETTINGS") {
            p.advance();
            t.settings = p.parse_settings_list()?;
        } else if p.check_keyword("COMMENT") {
            p.advance();
            t.comment = Some(p.parse_string()?);
        } else if p.check_keyword("AS") && t.as_source.is_none() && t.elements.is_empty() {
            p.advance();
            t.as_source = Some(parse_as_source(p)?);
        } else {
            break;
        }
    }
    Ok(())
}

fn parse_as_source(p: &mut Parser) -> Result<AsSource, AppError> {
    // A bare name directly followed by '(' is a table function.
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

pub fn parse_table_element(p: &mut Parser) -> Result<TableElement, AppError> {
    if p.check_keyword("INDEX") {
        p.advance();
        return Ok(TableElement::Index(parse_index_def(p)?));
    }
    if p.check_keyword("CONSTRAINT") {
        p.advance();
        return Ok(TableElement::Constraint(parse_constraint_def(p)?));
    }
    Ok(TableElement::Column(parse_column_def(p)?))
}

pub fn parse_index_def(p: &mut Parser) -> Result<IndexDef, AppError> {
    let name = p.parse_ident()?;
    let expr = parse_expr(p)?;
    p.expect_keyword("TYPE")?;
    if p.peek().kind != TokenKind::Ident {
        return Err(p.error(&["an index type"]));
    }
    let type_name = p.advance().text;
    let mut params = Vec::new();
    if p.eat_symbol("(") {
        if !p.check_symbol(")") {
            loop {
                params.push(parse_expr(p)?);
                if !p.eat_symbol(",") {
                    break;
                }
            }
        }
        p.expect_symbol(")")?;
    }
    let granularity = if p.eat_keyword("GRANULARITY") { Some(p.parse_u64()?) } else { None };
    Ok(IndexDef { name, expr, index_type: IndexType { name: type_name, params }, granularity })
}

pub fn parse_constraint_def(p: &mut Parser) -> Result<ConstraintDef, AppError> {
    let name = p.parse_ident()?;
    let kind = if p.eat_keyword("ASSUME") {
        ConstraintKind::Assume
    } else {
        p.expect_keyword("CHECK")?;
        ConstraintKind::Check
    };
    let expr = parse_expr(p)?;
    Ok(ConstraintDef { name, kind, expr })
}

pub fn parse_column_def(p: &mut Parser) -> Result<ColumnDef, AppError> {
    let name = p.parse_ident()?;
    let data_type = if column_type_follows(p) { Some(parse_data_type(p)?) } else { None };

    // Attributes appear in any order: authored DDL tends to write
    // CODEC before COMMENT, SHOW CREATE emits the opposite.
    let mut default = None;
    let mut codecs = Vec::new();
    let mut ttl = None;
    let mut comment = None;
    loop {
        let mut matched_default = false;
        for kind in [DefaultKind::Default, DefaultKind::Materialized, DefaultKind::Ephemeral, DefaultKind::Alias] {
            if default.is_none() && p.eat_keyword(kind.keyword()) {
                let expr = if kind == DefaultKind::Ephemeral && !expr_follows(p) { None } else { Some(parse_expr(p)?) };
                default = Some(DefaultSpec { kind, expr });
                matched_default = true;
                break;
            }
        }
        if matched_default {
            continue;
        }
        if codecs.is_empty() && p.eat_keyword("CODEC") {
            p.expect_symbol("(")?;
            loop {
                if p.peek().kind != TokenKind::Ident {
                    return Err(p.error(&["a codec name"]));
                }
                let codec_name = p.advance().text;
                let mut params = Vec::new();
                if p.eat_symbol("(") {
                    if !p.check_symbol(")") {
                        loop {
                            params.push(parse_expr(p)?);
                            if !p.eat_symbol(",") {
                                break;
                            }
                        }
                    }
                    p.expect_symbol(")")?;
                }
                codecs.push(Codec { name: codec_name, params });
                if !p.eat_symbol(",") {
                    break;
                }
            }
            p.expect_symbol(")")?;
            continue;
        }
        if ttl.is_none() && p.eat_keyword("TTL") {
            ttl = Some(parse_expr(p)?);
            continue;
        }
        if comment.is_none() && p.check_keyword("COMMENT") {
            p.advance();
            comment = Some(p.parse_string()?);
            continue;
        }
        break;
    }

    Ok(ColumnDef { name, data_type, default, codecs, ttl, comment })
}

/// After a column name, an identifier that is not one of the column
/// attribute keywords starts the data type.
fn column_type_follows(p: &Parser) -> bool {
    if p.peek().kind != TokenKind::Ident {
        return false;
    }
    const ATTRS: &[&str] = &["DEFAULT", "MATERIALIZED", "EPHEMERAL", "ALIAS", "CODEC", "TTL", "COMMENT"];
    !ATTRS.iter().any(|a| p.check_keyword(a))
}

fn expr_follows(p: &Parser) -> bool {
    !(p.check_symbol(",") || p.check_symbol(")") || p.at_end() || p.check_keyword("CODEC") || p.check_keyword("TTL") || p.check_keyword("COMMENT"))
}

pub fn parse_alter_table(p: &mut Parser) -> Result<AlterTable, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_object_name()?;
    let cluster = p.parse_on_cluster()?;
    let mut ops = vec![parse_alter_op(p)?];
    while p.eat_symbol(",") {
        ops.push(parse_alter_op(p)?);
    }
    Ok(AlterTable { if_exists, name, cluster, ops })
}

fn parse_alter_op(p: &mut Parser) -> Result<AlterTableOp, AppError> {
    if p.eat_keyword("ADD") {
        if p.eat_keyword("COLUMN") {
            let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
            let column = parse_column_def(p)?;
            let position = if p.eat_keyword("FIRST") {
                Some(ColumnPosition::First)
            } else if p.eat_keyword("AFTER") {
                Some(ColumnPosition::After(p.parse_ident()?))
            } else {
                None
            };
            return Ok(AlterTableOp::AddColumn { if_not_exists, column, position });
        }
        if p.eat_keyword("INDEX") {
            let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
            let index = parse_index_def(p)?;
            return Ok(AlterTableOp::AddIndex { if_not_exists, index });
        }
        if p.eat_keyword("CONSTRAINT") {
            let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
            let constraint = parse_constraint_def(p)?;
            return Ok(AlterTableOp::AddConstraint { if_not_exists, constraint });
        }
        return Err(p.error(&["COLUMN", "INDEX", "CONSTRAINT"]));
    }
    if p.eat_keyword("DROP") {
        if p.eat_keyword("COLUMN") {
            let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
            return Ok(AlterTableOp::DropColumn { if_exists, name: p.parse_ident()? });
        }
        if p.eat_keyword("INDEX") {
            let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
            return Ok(AlterTableOp::DropIndex { if_exists, name: p.parse_ident()? });
        }
        if p.eat_keyword("CONSTRAINT") {
            let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
            return Ok(AlterTableOp::DropConstraint { if_exists, name: p.parse_ident()? });
        }
        return Err(p.error(&["COLUMN", "INDEX", "CONSTRAINT"]));
    }
    if p.eat_keyword("MODIFY") {
        if p.eat_keyword("COLUMN") {
            let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
            let column = parse_column_def(p)?;
            return Ok(AlterTableOp::ModifyColumn { if_exists, column });
        }
        if p.eat_keywords(&["ORDER", "BY"]) {
            return Ok(AlterTableOp::ModifyOrderBy(parse_expr(p)?));
        }
        if p.eat_keyword("TTL") {
            return Ok(AlterTableOp::ModifyTtl(parse_expr(p)?));
        }
        if p.eat_keyword("SETTING") || p.eat_keyword("SETTINGS") {
            return Ok(AlterTableOp::ModifySettings(parse_greedy_settings(p)?));
        }
        if p.eat_keyword("COMMENT") {
            return Ok(AlterTableOp::ModifyComment(p.parse_string()?));
        }
        return Err(p.error(&["COLUMN", "ORDER BY", "TTL", "SETTING", "COMMENT"]));
    }
    if p.eat_keyword("RENAME") {
        p.expect_keyword("COLUMN")?;
        let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
        let from = p.parse_ident()?;
        p.expect_keyword("TO")?;
        let to = p.parse_ident()?;
        return Ok(AlterTableOp::RenameColumn { if_exists, from, to });
    }
    if p.eat_keyword("COMMENT") {
        p.expect_keyword("COLUMN")?;
        let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
        let name = p.parse_ident()?;
        let comment = p.parse_string()?;
        return Ok(AlterTableOp::CommentColumn { if_exists, name, comment });
    }
    Err(p.error(&["ADD", "DROP", "MODIFY", "RENAME", "COMMENT"]))
}

/// `MODIFY SETTING a = 1, b = 2` shares the comma with the op separator;
/// only `<ident> =` continues the settings list.
fn parse_greedy_settings(p: &mut Parser) -> Result<Vec<Setting>, AppError> {
    let mut out = Vec::new();
    loop {
        let name = p.parse_ident()?;
        p.expect_symbol("=")?;
        let value = parse_expr(p)?;
        out.push(Setting { name, value });
        if p.check_symbol(",")
            && matches!(p.peek_at(1).kind, TokenKind::Ident | TokenKind::QuotedIdent)
            && p.peek_at(2).is_symbol("=")
        {
            p.advance();
        } else {
            break;
        }
    }
    Ok(out)
}
