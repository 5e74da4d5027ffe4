//! User-defined function DDL: CREATE FUNCTION name AS (a, b) -> expr and
//! DROP FUNCTION.

use crate::error::AppError;
use crate::parser::ast::{CreateFunction, DropFunction, Expr};
use crate::parser::common::Parser;
use crate::parser::expr::parse_expr;

pub fn parse_create_function(p: &mut Parser, or_replace: bool) -> Result<CreateFunction, AppError> {
    let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    p.expect_keyword("AS")?;
    let body = parse_expr(p)?;
    if !matches!(body, Expr::Lambda { .. }) {
        return Err(p.error(&["a lambda expression ((params) -> body)"]));
    }
    Ok(CreateFunction { or_replace, if_not_exists, name, cluster, body })
}

pub fn parse_drop_function(p: &mut Parser) -> Result<DropFunction, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    Ok(DropFunction { if_exists, name, cluster })
}
