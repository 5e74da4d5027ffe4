//! Named collection DDL: CREATE / ALTER / DROP NAMED COLLECTION with
//! per-entry and collection-level override policies.

use crate::error::AppError;
use crate::parser::ast::*;
use crate::parser::common::Parser;
use crate::parser::expr::parse_expr;

pub fn parse_create_named_collection(p: &mut Parser, or_replace: bool) -> Result<CreateNamedCollection, AppError> {
    let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    p.expect_keyword("AS")?;

    let mut entries = Vec::new();
    loop {
        entries.push(parse_entry(p)?);
        if !p.eat_symbol(",") {
            break;
        }
    }

    let overridable = parse_override_policy(p);
    let comment = p.parse_opt_comment()?;
    Ok(CreateNamedCollection { or_replace, if_not_exists, name, cluster, entries, overridable, comment })
}

fn parse_entry(p: &mut Parser) -> Result<CollectionEntry, AppError> {
    let key = p.parse_ident()?;
    p.expect_symbol("=")?;
    let value = parse_expr(p)?;
    let overridable = parse_override_policy(p);
    Ok(CollectionEntry { key, value, overridable })
}

fn parse_override_policy(p: &mut Parser) -> Option<bool> {
    if p.eat_keywords(&["NOT", "OVERRIDABLE"]) {
        Some(false)
    } else if p.eat_keyword("OVERRIDABLE") {
        Some(true)
    } else {
        None
    }
}

pub fn parse_alter_named_collection(p: &mut Parser) -> Result<AlterNamedCollection, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;

    let mut set = Vec::new();
    let mut delete = Vec::new();
    loop {
        if p.eat_keyword("SET") {
            loop {
                set.push(parse_entry(p)?);
                if !p.eat_symbol(",") {
                    break;
                }
            }
        } else if p.eat_keyword("DELETE") {
            delete.extend(p.parse_ident_list()?);
        } else {
            break;
        }
    }
    if set.is_empty() && delete.is_empty() {
        return Err(p.error(&["SET", "DELETE"]));
    }
    Ok(AlterNamedCollection { if_exists, name, cluster, set, delete })
}

pub fn parse_drop_named_collection(p: &mut Parser) -> Result<DropNamedCollection, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    Ok(DropNamedCollection { if_exists, name, cluster })
}
