//! Expression grammar. Precedence is built from layered functions, lowest
//! binding first: OR, AND, NOT, comparison (including LIKE / IN / BETWEEN /
//! IS NULL), additive, multiplicative, unary, postfix (`[]`, `::`), primary.

use crate::error::AppError;
use crate::parser::ast::{
    BinOp, Expr, FunctionCall, Literal, OrderExpr, UnaryOp, WindowSpec,
};
use crate::parser::common::Parser;
use crate::parser::lexer::TokenKind;
use crate::parser::select::parse_select_query;
use crate::parser::types::parse_data_type;

const INTERVAL_UNITS: &[&str] = &[
    "NANOSECOND", "MICROSECOND", "MILLISECOND", "SECOND", "MINUTE", "HOUR", "DAY", "WEEK", "MONTH", "QUARTER", "YEAR",
];

pub fn parse_expr(p: &mut Parser) -> Result<Expr, AppError> {
    parse_or(p)
}

fn parse_or(p: &mut Parser) -> Result<Expr, AppError> {
    let mut left = parse_and(p)?;
    while p.eat_keyword("OR") {
        let right = parse_and(p)?;
        left = Expr::Binary { left: Box::new(left), op: BinOp::Or, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_and(p: &mut Parser) -> Result<Expr, AppError> {
    let mut left = parse_not(p)?;
    while p.eat_keyword("AND") {
        let right = parse_not(p)?;
        left = Expr::Binary { left: Box::new(left), op: BinOp::And, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_not(p: &mut Parser) -> Result<Expr, AppError> {
    // NOT IN / NOT LIKE / NOT BETWEEN are handled at comparison level; a
    // leading NOT here is boolean negation.
    if p.check_keyword("NOT") && !p.peek_at(1).is_keyword("IN") && !p.peek_at(1).is_keyword("LIKE") && !p.peek_at(1).is_keyword("BETWEEN") {
        p.advance();
        let inner = parse_not(p)?;
        return Ok(Expr::Not(Box::new(inner)));
    }
    parse_comparison(p)
}

fn parse_comparison(p: &mut Parser) -> Result<Expr, AppError> {
    let mut left = parse_additive(p)?;
    loop {
        // IS [NOT] NULL postfix
        if p.check_keyword("IS") {
            p.advance();
            let negated = p.eat_keyword("NOT");
            p.expect_keyword("NULL")?;
            left = Expr::IsNull { expr: Box::new(left), negated };
            continue;
        }
        // [NOT] BETWEEN low AND high
        if p.check_keyword("BETWEEN") || p.check_keywords(&["NOT", "BETWEEN"]) {
            let negated = p.eat_keyword("NOT");
            p.expect_keyword("BETWEEN")?;
            let low = parse_additive(p)?;
            p.expect_keyword("AND")?;
            let high = parse_additive(p)?;
            left = Expr::Between { expr: Box::new(left), low: Box::new(low), high: Box::new(high), negated };
            continue;
        }
        // [NOT] IN (list | subquery)
        if p.check_keyword("IN") || p.check_keywords(&["NOT", "IN"]) {
            let negated = p.eat_keyword("NOT");
            p.expect_keyword("IN")?;
            p.expect_symbol("(")?;
            if p.check_keyword("SELECT") || p.check_keyword("WITH") {
                let query = parse_select_query(p)?;
                p.expect_symbol(")")?;
                left = Expr::InQuery { expr: Box::new(left), query: Box::new(query), negated };
            } else {
                let mut list = vec![parse_expr(p)?];
                while p.eat_symbol(",") {
                    list.push(parse_expr(p)?);
                }
                p.expect_symbol(")")?;
                left = Expr::InList { expr: Box::new(left), list, negated };
            }
            continue;
        }
        // [NOT] LIKE / ILIKE
        if p.check_keyword("LIKE") || p.check_keyword("ILIKE") || p.check_keywords(&["NOT", "LIKE"]) {
            let negated = p.eat_keyword("NOT");
            let op = if p.eat_keyword("ILIKE") {
                BinOp::ILike
            } else {
                p.expect_keyword("LIKE")?;
                if negated { BinOp::NotLike } else { BinOp::Like }
            };
            let right = parse_additive(p)?;
            let bin = Expr::Binary { left: Box::new(left), op, right: Box::new(right) };
            left = if negated && op == BinOp::ILike { Expr::Not(Box::new(bin)) } else { bin };
            continue;
        }
        let op = match p.peek().text.as_str() {
            _ if p.peek().kind != TokenKind::Symbol => break,
            "=" | "==" => BinOp::Eq,
            "!=" | "<>" => BinOp::NotEq,
            "<" => BinOp::Lt,
            ">" => BinOp::Gt,
            "<=" => BinOp::LtEq,
            ">=" => BinOp::GtEq,
            _ => break,
        };
        p.advance();
        let right = parse_additive(p)?;
        left = Expr::Binary { left: Box::new(left), op, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_additive(p: &mut Parser) -> Result<Expr, AppError> {
    let mut left = parse_multiplicative(p)?;
    loop {
        let op = if p.check_symbol("+") {
            BinOp::Plus
        } else if p.check_symbol("-") {
            BinOp::Minus
        } else if p.check_symbol("||") {
            BinOp::Concat
        } else {
            break;
        };
        p.advance();
        let right = parse_multiplicative(p)?;
        left = Expr::Binary { left: Box::new(left), op, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_multiplicative(p: &mut Parser) -> Result<Expr, AppError> {
    let mut left = parse_unary(p)?;
    loop {
        let op = if p.check_symbol("*") {
            BinOp::Multiply
        } else if p.check_symbol("/") {
            BinOp::Divide
        } else if p.check_symbol("%") {
            BinOp::Modulo
        } else {
            break;
        };
        p.advance();
        let right = parse_unary(p)?;
        left = Expr::Binary { left: Box::new(left), op, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_unary(p: &mut Parser) -> Result<Expr, AppError> {
    if p.check_symbol("-") {
        p.advance();
        let inner = parse_unary(p)?;
        return Ok(Expr::Unary { op: UnaryOp::Minus, expr: Box::new(inner) });
    }
    if p.check_symbol("+") {
        p.advance();
        let inner = parse_unary(p)?;
        return Ok(Expr::Unary { op: UnaryOp::Plus, expr: Box::new(inner) });
    }
    parse_postfix(p)
}

fn parse_postfix(p: &mut Parser) -> Result<Expr, AppError> {
    let mut base = parse_primary(p)?;
    loop {
        if p.eat_symbol("[") {
            let index = parse_expr(p)?;
            p.expect_symbol("]")?;
            base = Expr::Index { base: Box::new(base), index: Box::new(index) };
            continue;
        }
        if p.eat_symbol("::") {
            let data_type = parse_data_type(p)?;
            base = Expr::Cast { expr: Box::new(base), data_type };
            continue;
        }
        break;
    }
    Ok(base)
}

fn parse_primary(p: &mut Parser) -> Result<Expr, AppError> {
    let tok = p.peek().clone();
    match tok.kind {
        TokenKind::StringLit => {
            p.advance();
            Ok(Expr::Literal(Literal::String(tok.text)))
        }
        TokenKind::Number => {
            p.advance();
            Ok(Expr::Literal(Literal::Number(tok.text)))
        }
        TokenKind::Symbol if tok.text == "(" => parse_parenthesized(p),
        TokenKind::Symbol if tok.text == "[" => {
            p.advance();
            let mut items = Vec::new();
            if !p.check_symbol("]") {
                loop {
                    items.push(parse_expr(p)?);
                    if !p.eat_symbol(",") {
                        break;
                    }
                }
            }
            p.expect_symbol("]")?;
            Ok(Expr::Array(items))
        }
        TokenKind::Symbol if tok.text == "*" => {
            p.advance();
            Ok(Expr::Wildcard)
        }
        TokenKind::Ident => {
            if tok.is_keyword("NULL") {
                p.advance();
                return Ok(Expr::Literal(Literal::Null));
            }
            if tok.is_keyword("TRUE") {
                p.advance();
                return Ok(Expr::Literal(Literal::Bool(true)));
            }
            if tok.is_keyword("FALSE") {
                p.advance();
                return Ok(Expr::Literal(Literal::Bool(false)));
            }
            if tok.is_keyword("CASE") {
                return parse_case(p);
            }
            if tok.is_keyword("CAST") && p.peek_at(1).is_symbol("(") {
                p.advance();
                p.expect_symbol("(")?;
                let inner = parse_expr(p)?;
                p.expect_keyword("AS")?;
                let data_type = parse_data_type(p)?;
                p.expect_symbol(")")?;
                return Ok(Expr::Cast { expr: Box::new(inner), data_type });
            }
            if tok.is_keyword("INTERVAL") {
                p.advance();
                let value = parse_unary(p)?;
                for unit in INTERVAL_UNITS {
                    if p.eat_keyword(unit) {
                        return Ok(Expr::Interval { value: Box::new(value), unit: unit.to_string() });
                    }
                }
                return Err(p.error(INTERVAL_UNITS));
            }
            if tok.is_keyword("EXTRACT") && p.peek_at(1).is_symbol("(") {
                p.advance();
                p.expect_symbol("(")?;
                let unit_tok = p.advance();
                if unit_tok.kind != TokenKind::Ident {
                    return Err(p.error(&["a date part"]));
                }
                p.expect_keyword("FROM")?;
                let inner = parse_expr(p)?;
                p.expect_symbol(")")?;
                return Ok(Expr::Extract { unit: unit_tok.text.to_uppercase(), expr: Box::new(inner) });
            }
            parse_identifier_or_call(p)
        }
        TokenKind::QuotedIdent => parse_identifier_or_call(p),
        _ => Err(p.error(&["an expression"])),
    }
}

/// `(...)` is a subquery, a lambda parameter list, a tuple literal, or
/// plain grouping depending on what follows.
fn parse_parenthesized(p: &mut Parser) -> Result<Expr, AppError> {
    p.expect_symbol("(")?;
    if p.check_keyword("SELECT") || p.check_keyword("WITH") {
        let query = parse_select_query(p)?;
        p.expect_symbol(")")?;
        return Ok(Expr::Subquery(Box::new(query)));
    }
    let mut items = vec![parse_expr(p)?];
    while p.eat_symbol(",") {
        items.push(parse_expr(p)?);
    }
    p.expect_symbol(")")?;
    if p.check_symbol("->") {
        let params = lambda_params(&items).ok_or_else(|| p.error(&["identifier lambda parameters"]))?;
        p.advance();
        let body = parse_expr(p)?;
        return Ok(Expr::Lambda { params, body: Box::new(body) });
    }
    if items.len() == 1 {
        Ok(items.into_iter().next().expect("single element"))
    } else {
        Ok(Expr::Tuple(items))
    }
}

fn lambda_params(items: &[Expr]) -> Option<Vec<crate::ident::Ident>> {
    items
        .iter()
        .map(|e| match e {
            Expr::Identifier(parts) if parts.len() == 1 => Some(parts[0].clone()),
            _ => None,
        })
        .collect()
}

fn parse_case(p: &mut Parser) -> Result<Expr, AppError> {
    p.expect_keyword("CASE")?;
    let operand = if p.check_keyword("WHEN") { None } else { Some(Box::new(parse_expr(p)?)) };
    let mut branches = Vec::new();
    while p.eat_keyword("WHEN") {
        let cond = parse_expr(p)?;
        p.expect_keyword("THEN")?;
        let value = parse_expr(p)?;
        branches.push((cond, value));
    }
    if branches.is_empty() {
        return Err(p.error(&["WHEN"]));
    }
    let else_expr = if p.eat_keyword("ELSE") { Some(Box::new(parse_expr(p)?)) } else { None };
    p.expect_keyword("END")?;
    Ok(Expr::Case { operand, branches, else_expr })
}

fn parse_identifier_or_call(p: &mut Parser) -> Result<Expr, AppError> {
    let first = p.parse_ident()?;

    // Single-parameter lambda: `x -> x + 1`
    if p.check_symbol("->") {
        p.advance();
        let body = parse_expr(p)?;
        return Ok(Expr::Lambda { params: vec![first], body: Box::new(body) });
    }

    if p.check_symbol("(") {
        return parse_call(p, first.text);
    }

    let mut parts = vec![first];
    while p.check_symbol(".") && matches!(p.peek_at(1).kind, TokenKind::Ident | TokenKind::QuotedIdent) {
        p.advance();
        parts.push(p.parse_ident()?);
    }
    Ok(Expr::Identifier(parts))
}

fn parse_call(p: &mut Parser, name: String) -> Result<Expr, AppError> {
    let first_group = parse_arg_group(p)?;
    let (params, args, distinct) = if p.check_symbol("(") {
        // Parametric aggregate: first group is parameters, second is arguments.
        let second = parse_arg_group(p)?;
        (Some(first_group.0), second.0, second.1)
    } else {
        (None, first_group.0, first_group.1)
    };
    let over = if p.eat_keyword("OVER") {
        p.expect_symbol("(")?;
        let mut partition_by = Vec::new();
        let mut order_by = Vec::new();
        if p.eat_keywords(&["PARTITION", "BY"]) {
            loop {
                partition_by.push(parse_expr(p)?);
                if !p.eat_symbol(",") {
                    break;
                }
            }
        }
        if p.eat_keywords(&["ORDER", "BY"]) {
            loop {
                let expr = parse_expr(p)?;
                let desc = p.eat_keyword("DESC") || {
                    p.eat_keyword("ASC");
                    false
                };
                order_by.push(OrderExpr { expr, desc });
                if !p.eat_symbol(",") {
                    break;
                }
            }
        }
        p.expect_symbol(")")?;
        Some(WindowSpec { partition_by, order_by })
    } else {
        None
    };
    Ok(Expr::Function(FunctionCall { name, params, args, distinct, over }))
}

fn parse_arg_group(p: &mut Parser) -> Result<(Vec<Expr>, bool), AppError> {
    p.expect_symbol("(")?;
    let distinct = p.eat_keyword("DISTINCT");
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
    Ok((args, distinct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Ident;
    use crate::parser::lexer::lex;

    fn parse(input: &str) -> Expr {
        let toks: Vec<_> = lex(input, "t.sql").expect("lex").into_iter().filter(|t| !t.is_comment()).collect();
        let mut p = Parser::new(toks, "t.sql", input);
        parse_expr(&mut p).expect("expr parse failed")
    }

    #[test]
    fn precedence_or_binds_loosest() {
        // a = 1 OR b = 2 AND c = 3  =>  Or(a=1, And(b=2, c=3))
        match parse("a = 1 OR b = 2 AND c = 3") {
            Expr::Binary { op: BinOp::Or, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinOp::And, .. }));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn arithmetic_precedence() {
        // 1 + 2 * 3  =>  Plus(1, Mul(2, 3))
        match parse("1 + 2 * 3") {
            Expr::Binary { op: BinOp::Plus, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinOp::Multiply, .. }));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn comparison_chain_variants() {
        assert!(matches!(parse("x IS NOT NULL"), Expr::IsNull { negated: true, .. }));
        assert!(matches!(parse("x NOT IN (1, 2)"), Expr::InList { negated: true, .. }));
        assert!(matches!(parse("x BETWEEN 1 AND 10"), Expr::Between { negated: false, .. }));
        assert!(matches!(parse("name LIKE 'a%'"), Expr::Binary { op: BinOp::Like, .. }));
    }

    #[test]
    fn parametric_aggregate_two_groups() {
        match parse("quantile(0.9)(latency_ms)") {
            Expr::Function(f) => {
                assert_eq!(f.name, "quantile");
                assert_eq!(f.params.as_ref().map(|p| p.len()), Some(1));
                assert_eq!(f.args.len(), 1);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn window_over_clause() {
        match parse("row_number() OVER (PARTITION BY user_id ORDER BY ts DESC)") {
            Expr::Function(f) => {
                let over = f.over.expect("window spec");
                assert_eq!(over.partition_by.len(), 1);
                assert_eq!(over.order_by.len(), 1);
                assert!(over.order_by[0].desc);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn lambda_forms() {
        match parse("x -> x + 1") {
            Expr::Lambda { params, .. } => assert_eq!(params, vec![Ident::plain("x")]),
            other => panic!("{other:?}"),
        }
        match parse("(a, b) -> a * b") {
            Expr::Lambda { params, .. } => assert_eq!(params.len(), 2),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn tuples_arrays_and_casts() {
        assert!(matches!(parse("(1, 'a')"), Expr::Tuple(_)));
        assert!(matches!(parse("[1, 2, 3]"), Expr::Array(_)));
        assert!(matches!(parse("CAST(x AS UInt64)"), Expr::Cast { .. }));
        assert!(matches!(parse("x::UInt64"), Expr::Cast { .. }));
    }

    #[test]
    fn interval_extract_and_case() {
        assert!(matches!(parse("INTERVAL 3 DAY"), Expr::Interval { .. }));
        assert!(matches!(parse("EXTRACT(YEAR FROM ts)"), Expr::Extract { .. }));
        match parse("CASE WHEN x > 0 THEN 'pos' ELSE 'neg' END") {
            Expr::Case { operand, branches, else_expr } => {
                assert!(operand.is_none());
                assert_eq!(branches.len(), 1);
                assert!(else_expr.is_some());
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn qualified_identifiers() {
        match parse("db.table.column") {
            Expr::Identifier(parts) => assert_eq!(parts.len(), 3),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn count_star() {
        match parse("count(*)") {
            Expr::Function(f) => assert!(matches!(f.args[0], Expr::Wildcard)),
            other => panic!("{other:?}"),
        }
    }
}
