//! Database DDL: CREATE / ALTER / DROP / RENAME / ATTACH / DETACH DATABASE.

use crate::error::AppError;
use crate::parser::ast::*;
use crate::parser::common::Parser;
use crate::parser::table::parse_engine;

pub fn parse_create_database(p: &mut Parser, or_replace: bool) -> Result<CreateDatabase, AppError> {
    let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    let engine = if p.eat_keyword("ENGINE") { Some(parse_engine(p)?) } else { None };
    let comment = p.parse_opt_comment()?;
    Ok(CreateDatabase { or_replace, if_not_exists, name, cluster, engine, comment })
}

pub fn parse_alter_database(p: &mut Parser) -> Result<AlterDatabase, AppError> {
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    p.expect_keywords(&["MODIFY", "COMMENT"])?;
    let comment = p.parse_string()?;
    Ok(AlterDatabase { name, cluster, action: AlterDatabaseAction::ModifyComment(comment) })
}

pub fn parse_drop_database(p: &mut Parser) -> Result<DropDatabase, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    let sync = p.eat_keyword("SYNC");
    Ok(DropDatabase { if_exists, name, cluster, sync })
}

pub fn parse_rename_database(p: &mut Parser) -> Result<RenameDatabase, AppError> {
    let from = p.parse_ident()?;
    p.expect_keyword("TO")?;
    let to = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    Ok(RenameDatabase { from, to, cluster })
}

pub fn parse_attach_database(p: &mut Parser) -> Result<AttachDatabase, AppError> {
    let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    let engine = if p.eat_keyword("ENGINE") { Some(parse_engine(p)?) } else { None };
    Ok(AttachDatabase { if_not_exists, name, cluster, engine })
}

pub fn parse_detach_database(p: &mut Parser) -> Result<DetachDatabase, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    let sync = p.eat_keyword("SYNC");
    Ok(DetachDatabase { if_exists, name, cluster, sync })
}
