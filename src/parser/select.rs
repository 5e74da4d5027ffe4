//! The SELECT subset needed inside view and materialized-view bodies:
//! WITH, DISTINCT, FROM with joins and table functions, WHERE, GROUP BY,
//! HAVING, ORDER BY, LIMIT/OFFSET, SETTINGS and UNION [ALL] chains.

use crate::error::AppError;
use crate::parser::ast::{
    CteItem, FromClause, Join, JoinConstraint, JoinKind, LimitClause, OrderExpr, SelectBody, SelectItem, SelectQuery,
    TableFactor,
};
use crate::parser::common::Parser;
use crate::parser::expr::parse_expr;
use crate::parser::lexer::TokenKind;

pub fn parse_select_query(p: &mut Parser) -> Result<SelectQuery, AppError> {
    let body = parse_select_body(p)?;
    let mut unions = Vec::new();
    while p.eat_keyword("UNION") {
        let all = p.eat_keyword("ALL");
        if !all {
            p.eat_keyword("DISTINCT");
        }
        unions.push((all, parse_select_body(p)?));
    }
    Ok(SelectQuery { body, unions })
}

fn parse_select_body(p: &mut Parser) -> Result<SelectBody, AppError> {
    let mut with = Vec::new();
    if p.eat_keyword("WITH") {
        loop {
            with.push(parse_cte_item(p)?);
            if !p.eat_symbol(",") {
                break;
            }
        }
    }

    p.expect_keyword("SELECT")?;
    let distinct = p.eat_keyword("DISTINCT");

    let mut items = vec![parse_select_item(p)?];
    while p.eat_symbol(",") {
        items.push(parse_select_item(p)?);
    }

    let from = if p.eat_keyword("FROM") { Some(parse_from(p)?) } else { None };

    let where_clause = if p.eat_keyword("WHERE") { Some(parse_expr(p)?) } else { None };

    let mut group_by = Vec::new();
    if p.eat_keywords(&["GROUP", "BY"]) {
        loop {
            group_by.push(parse_expr(p)?);
            if !p.eat_symbol(",") {
                break;
            }
        }
    }

    let having = if p.eat_keyword("HAVING") { Some(parse_expr(p)?) } else { None };

    let mut order_by = Vec::new();
    if p.eat_keywords(&["ORDER", "BY"]) {
        loop {
            order_by.push(parse_order_expr(p)?);
            if !p.eat_symbol(",") {
                break;
            }
        }
    }

    let limit = if p.eat_keyword("LIMIT") {
        let first = parse_expr(p)?;
        if p.eat_symbol(",") {
            // LIMIT offset, count
            let count = parse_expr(p)?;
            Some(LimitClause { limit: count, offset: Some(first) })
        } else if p.eat_keyword("OFFSET") {
            let offset = parse_expr(p)?;
            Some(LimitClause { limit: first, offset: Some(offset) })
        } else {
            Some(LimitClause { limit: first, offset: None })
        }
    } else {
        None
    };

    let settings = if p.eat_keyword("SETTINGS") { p.parse_settings_list()? } else { Vec::new() };

    Ok(SelectBody { with, distinct, items, from, where_clause, group_by, having, order_by, limit, settings })
}

fn parse_cte_item(p: &mut Parser) -> Result<CteItem, AppError> {
    // `name AS (SELECT ...)` or `<expr> AS name`
    if matches!(p.peek().kind, TokenKind::Ident | TokenKind::QuotedIdent)
        && p.peek_at(1).is_keyword("AS")
        && p.peek_at(2).is_symbol("(")
    {
        let name = p.parse_ident()?;
        p.expect_keyword("AS")?;
        p.expect_symbol("(")?;
        let query = parse_select_query(p)?;
        p.expect_symbol(")")?;
        return Ok(CteItem::Query { name, query: Box::new(query) });
    }
    let expr = parse_expr(p)?;
    p.expect_keyword("AS")?;
    let alias = p.parse_ident()?;
    Ok(CteItem::Scalar { expr, alias })
}

fn parse_select_item(p: &mut Parser) -> Result<SelectItem, AppError> {
    if p.check_symbol("*") {
        p.advance();
        return Ok(SelectItem::Wildcard);
    }
    // `table.*` / `db.table.*`
    if matches!(p.peek().kind, TokenKind::Ident | TokenKind::QuotedIdent) && p.peek_at(1).is_symbol(".") {
        if p.peek_at(2).is_symbol("*") {
            let name = crate::ident::ObjectName::bare(p.parse_ident()?);
            p.expect_symbol(".")?;
            p.expect_symbol("*")?;
            return Ok(SelectItem::QualifiedWildcard(name));
        }
        if matches!(p.peek_at(2).kind, TokenKind::Ident | TokenKind::QuotedIdent)
            && p.peek_at(3).is_symbol(".")
            && p.peek_at(4).is_symbol("*")
        {
            let db = p.parse_ident()?;
            p.expect_symbol(".")?;
            let table = p.parse_ident()?;
            let name = crate::ident::ObjectName::qualified(db, table);
            p.expect_symbol(".")?;
            p.expect_symbol("*")?;
            return Ok(SelectItem::QualifiedWildcard(name));
        }
    }
    let expr = parse_expr(p)?;
    let alias = if p.eat_keyword("AS") {
        Some(p.parse_ident()?)
    } else {
        None
    };
    Ok(SelectItem::Expr { expr, alias })
}

fn parse_from(p: &mut Parser) -> Result<FromClause, AppError> {
    let base = parse_table_factor(p)?;
    let mut joins = Vec::new();
    loop {
        let kind = if p.check_keywords(&["INNER", "JOIN"]) {
            p.advance();
            p.advance();
            JoinKind::Inner
        } else if p.check_keywords(&["LEFT", "JOIN"]) || p.check_keywords(&["LEFT", "OUTER", "JOIN"]) {
            p.advance();
            p.eat_keyword("OUTER");
            p.advance();
            JoinKind::Left
        } else if p.check_keywords(&["RIGHT", "JOIN"]) || p.check_keywords(&["RIGHT", "OUTER", "JOIN"]) {
            p.advance();
            p.eat_keyword("OUTER");
            p.advance();
            JoinKind::Right
        } else if p.check_keywords(&["FULL", "JOIN"]) || p.check_keywords(&["FULL", "OUTER", "JOIN"]) {
            p.advance();
            p.eat_keyword("OUTER");
            p.advance();
            JoinKind::Full
        } else if p.check_keywords(&["CROSS", "JOIN"]) {
            p.advance();
            p.advance();
            JoinKind::Cross
        } else if p.check_keyword("JOIN") {
            p.advance();
            JoinKind::Inner
        } else {
            break;
        };
        let factor = parse_table_factor(p)?;
        let constraint = if p.eat_keyword("ON") {
            JoinConstraint::On(parse_expr(p)?)
        } else if p.eat_keyword("USING") {
            let parenthesized = p.eat_symbol("(");
            let cols = p.parse_ident_list()?;
            if parenthesized {
                p.expect_symbol(")")?;
            }
            JoinConstraint::Using(cols)
        } else {
            JoinConstraint::None
        };
        joins.push(Join { kind, factor, constraint });
    }
    Ok(FromClause { base, joins })
}

fn parse_table_factor(p: &mut Parser) -> Result<TableFactor, AppError> {
    if p.eat_symbol("(") {
        let query = parse_select_query(p)?;
        p.expect_symbol(")")?;
        let alias = parse_opt_alias(p)?;
        return Ok(TableFactor::Subquery { query: Box::new(query), alias });
    }
    // Table function: bare name directly followed by '('
    if matches!(p.peek().kind, TokenKind::Ident) && p.peek_at(1).is_symbol("(") {
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
        let alias = parse_opt_alias(p)?;
        return Ok(TableFactor::Function { name, args, alias });
    }
    let name = p.parse_object_name()?;
    let final_mod = p.eat_keyword("FINAL");
    let alias = parse_opt_alias(p)?;
    Ok(TableFactor::Table { name, final_mod, alias })
}

/// `AS alias` or a bare alias identifier that is not a clause keyword.
fn parse_opt_alias(p: &mut Parser) -> Result<Option<crate::ident::Ident>, AppError> {
    if p.eat_keyword("AS") {
        return Ok(Some(p.parse_ident()?));
    }
    const CLAUSE_KEYWORDS: &[&str] = &[
        "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "SETTINGS", "UNION", "INNER", "LEFT", "RIGHT", "FULL", "CROSS",
        "JOIN", "ON", "USING", "FINAL", "FROM", "AS",
    ];
    if p.peek().kind == TokenKind::Ident && !CLAUSE_KEYWORDS.iter().any(|k| p.check_keyword(k)) {
        return Ok(Some(p.parse_ident()?));
    }
    Ok(None)
}

fn parse_order_expr(p: &mut Parser) -> Result<OrderExpr, AppError> {
    let expr = parse_expr(p)?;
    let desc = if p.eat_keyword("DESC") {
        true
    } else {
        p.eat_keyword("ASC");
        false
    };
    Ok(OrderExpr { expr, desc })
}
