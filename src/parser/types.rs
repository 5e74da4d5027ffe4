//! Data type grammar: the ClickHouse composite wrappers plus parameterized
//! simple types. `Nullable(LowCardinality(..))` is rejected here, at parse
//! time, so no later stage needs to re-check the invariant.

use crate::error::AppError;
use crate::parser::ast::{DataType, NestedColumn, TupleElement, TypeParam};
use crate::parser::common::Parser;
use crate::parser::expr;
use crate::parser::lexer::TokenKind;

pub fn parse_data_type(p: &mut Parser) -> Result<DataType, AppError> {
    if p.peek().kind != TokenKind::Ident {
        return Err(p.error(&["a data type"]));
    }
    let name = p.advance().text;

    if name.eq_ignore_ascii_case("Nullable") {
        p.expect_symbol("(")?;
        if p.check_keyword("LowCardinality") {
            return Err(p.error(&["a type other than LowCardinality inside Nullable"]));
        }
        let inner = parse_data_type(p)?;
        p.expect_symbol(")")?;
        return Ok(DataType::Nullable(Box::new(inner)));
    }
    if name.eq_ignore_ascii_case("LowCardinality") {
        p.expect_symbol("(")?;
        let inner = parse_data_type(p)?;
        p.expect_symbol(")")?;
        return Ok(DataType::LowCardinality(Box::new(inner)));
    }
    if name.eq_ignore_ascii_case("Array") {
        p.expect_symbol("(")?;
        let inner = parse_data_type(p)?;
        p.expect_symbol(")")?;
        return Ok(DataType::Array(Box::new(inner)));
    }
    if name.eq_ignore_ascii_case("Map") {
        p.expect_symbol("(")?;
        let key = parse_data_type(p)?;
        p.expect_symbol(",")?;
        let value = parse_data_type(p)?;
        p.expect_symbol(")")?;
        return Ok(DataType::Map(Box::new(key), Box::new(value)));
    }
    if name.eq_ignore_ascii_case("Tuple") {
        p.expect_symbol("(")?;
        let mut elements = Vec::new();
        loop {
            elements.push(parse_tuple_element(p)?);
            if !p.eat_symbol(",") {
                break;
            }
        }
        p.expect_symbol(")")?;
        return Ok(DataType::Tuple(elements));
    }
    if name.eq_ignore_ascii_case("Nested") {
        p.expect_symbol("(")?;
        let mut columns = Vec::new();
        loop {
            let col_name = p.parse_ident()?;
            let data_type = parse_data_type(p)?;
            columns.push(NestedColumn { name: col_name, data_type });
            if !p.eat_symbol(",") {
                break;
            }
        }
        p.expect_symbol(")")?;
        return Ok(DataType::Nested(columns));
    }

    // Simple type, optionally parameterized: FixedString(16), Decimal(18, 4),
    // Enum8('a' = 1), AggregateFunction(quantiles(0.5), UInt64), ...
    let mut params = Vec::new();
    if p.eat_symbol("(") {
        if !p.check_symbol(")") {
            loop {
                params.push(parse_type_param(p)?);
                if !p.eat_symbol(",") {
                    break;
                }
            }
        }
        p.expect_symbol(")")?;
    }
    Ok(DataType::Simple { name, params })
}

/// `Tuple(a String, b UInt8)` elements may be named; `Tuple(String, UInt8)`
/// elements are not. An identifier followed by another identifier starts a
/// named element.
fn parse_tuple_element(p: &mut Parser) -> Result<TupleElement, AppError> {
    let named = matches!(p.peek().kind, TokenKind::Ident | TokenKind::QuotedIdent)
        && matches!(p.peek_at(1).kind, TokenKind::Ident | TokenKind::QuotedIdent);
    if named {
        let name = p.parse_ident()?;
        let data_type = parse_data_type(p)?;
        Ok(TupleElement { name: Some(name), data_type })
    } else {
        let data_type = parse_data_type(p)?;
        Ok(TupleElement { name: None, data_type })
    }
}

/// Parameters of simple types mix nested types and expressions. A bare
/// capitalized identifier or a known wrapper is a type; everything else is
/// an expression (so `AggregateFunction(sum, UInt64)` keeps `sum` as an
/// expression and `UInt64` as a type).
fn parse_type_param(p: &mut Parser) -> Result<TypeParam, AppError> {
    if p.peek().kind == TokenKind::Ident {
        let name = &p.peek().text;
        let wrapper = ["Nullable", "LowCardinality", "Array", "Map", "Tuple", "Nested"]
            .iter()
            .any(|w| name.eq_ignore_ascii_case(w));
        let followed_by_paren = p.peek_at(1).is_symbol("(");
        let capitalized = name.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false);
        if wrapper || (capitalized && !followed_by_paren) || (capitalized && followed_by_paren && is_parametric_type_name(name)) {
            return Ok(TypeParam::Type(parse_data_type(p)?));
        }
    }
    Ok(TypeParam::Expr(expr::parse_expr(p)?))
}

fn is_parametric_type_name(name: &str) -> bool {
    const NAMES: &[&str] = &[
        "FixedString",
        "DateTime",
        "DateTime64",
        "Decimal",
        "Decimal32",
        "Decimal64",
        "Decimal128",
        "Decimal256",
        "Enum",
        "Enum8",
        "Enum16",
        "AggregateFunction",
        "SimpleAggregateFunction",
        "Variant",
        "JSON",
    ];
    NAMES.iter().any(|n| name.eq_ignore_ascii_case(n))
}
