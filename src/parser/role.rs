//! Access-control DDL: CREATE / ALTER / DROP ROLE, GRANT / REVOKE and
//! SET [DEFAULT] ROLE.

use crate::error::AppError;
use crate::ident::Ident;
use crate::parser::ast::*;
use crate::parser::common::Parser;
use crate::parser::lexer::TokenKind;

pub fn parse_create_role(p: &mut Parser, or_replace: bool) -> Result<CreateRole, AppError> {
    let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let names = p.parse_ident_list()?;
    let cluster = p.parse_on_cluster()?;
    let settings = if p.eat_keyword("SETTINGS") { p.parse_settings_list()? } else { Vec::new() };
    Ok(CreateRole { or_replace, if_not_exists, names, cluster, settings })
}

pub fn parse_alter_role(p: &mut Parser) -> Result<AlterRole, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;
    let rename_to = if p.eat_keywords(&["RENAME", "TO"]) { Some(p.parse_ident()?) } else { None };
    let settings = if p.eat_keyword("SETTINGS") { p.parse_settings_list()? } else { Vec::new() };
    Ok(AlterRole { if_exists, name, cluster, rename_to, settings })
}

pub fn parse_drop_role(p: &mut Parser) -> Result<DropRole, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let names = p.parse_ident_list()?;
    let cluster = p.parse_on_cluster()?;
    Ok(DropRole { if_exists, names, cluster })
}

/// GRANT comes in two shapes: privileges (`GRANT SELECT ON db.* TO r`) and
/// role membership (`GRANT reader TO alice`). The shapes are told apart by
/// the ON keyword after the first list.
pub fn parse_grant(p: &mut Parser) -> Result<GrantStmt, AppError> {
    let cluster = p.parse_on_cluster()?;
    let items = parse_grant_items(p)?;

    if p.eat_keyword("ON") {
        let target = parse_grant_target(p)?;
        p.expect_keyword("TO")?;
        let grantees = p.parse_ident_list()?;
        let mut grant_option = false;
        let mut replace_option = false;
        while p.eat_keyword("WITH") {
            if p.eat_keywords(&["GRANT", "OPTION"]) {
                grant_option = true;
            } else if p.eat_keywords(&["REPLACE", "OPTION"]) {
                replace_option = true;
            } else {
                return Err(p.error(&["GRANT OPTION", "REPLACE OPTION"]));
            }
        }
        return Ok(GrantStmt {
            cluster,
            kind: GrantKind::Privileges { privileges: items.into_privileges(), target },
            grantees,
            grant_option,
            admin_option: false,
            replace_option,
        });
    }

    p.expect_keyword("TO")?;
    let roles = items.into_roles(p)?;
    let grantees = p.parse_ident_list()?;
    let mut admin_option = false;
    let mut replace_option = false;
    while p.eat_keyword("WITH") {
        if p.eat_keywords(&["ADMIN", "OPTION"]) {
            admin_option = true;
        } else if p.eat_keywords(&["REPLACE", "OPTION"]) {
            replace_option = true;
        } else {
            return Err(p.error(&["ADMIN OPTION", "REPLACE OPTION"]));
        }
    }
    Ok(GrantStmt {
        cluster,
        kind: GrantKind::Roles { roles },
        grantees,
        grant_option: false,
        admin_option,
        replace_option,
    })
}

pub fn parse_revoke(p: &mut Parser) -> Result<RevokeStmt, AppError> {
    let cluster = p.parse_on_cluster()?;
    let grant_option_for = p.eat_keywords(&["GRANT", "OPTION", "FOR"]);
    let admin_option_for = p.eat_keywords(&["ADMIN", "OPTION", "FOR"]);
    let items = parse_grant_items(p)?;

    if p.eat_keyword("ON") {
        let target = parse_grant_target(p)?;
        p.expect_keyword("FROM")?;
        let grantees = p.parse_ident_list()?;
        return Ok(RevokeStmt {
            cluster,
            grant_option_for,
            admin_option_for,
            kind: GrantKind::Privileges { privileges: items.into_privileges(), target },
            grantees,
        });
    }
    p.expect_keyword("FROM")?;
    let roles = items.into_roles(p)?;
    let grantees = p.parse_ident_list()?;
    Ok(RevokeStmt { cluster, grant_option_for, admin_option_for, kind: GrantKind::Roles { roles }, grantees })
}

/// Comma-separated list of multi-word names with optional column lists,
/// kind-agnostic until ON / TO decides.
struct GrantItems(Vec<(Vec<Ident>, Vec<Ident>)>);

impl GrantItems {
    fn into_privileges(self) -> Vec<Privilege> {
        self.0
            .into_iter()
            .map(|(words, columns)| Privilege {
                name: words.iter().map(|w| w.text.to_uppercase()).collect::<Vec<_>>().join(" "),
                columns,
            })
            .collect()
    }

    fn into_roles(self, p: &Parser) -> Result<Vec<Ident>, AppError> {
        self.0
            .into_iter()
            .map(|(words, columns)| {
                if words.len() == 1 && columns.is_empty() {
                    Ok(words.into_iter().next().expect("single word"))
                } else {
                    Err(p.error(&["a role name"]))
                }
            })
            .collect()
    }
}

fn parse_grant_items(p: &mut Parser) -> Result<GrantItems, AppError> {
    let mut items = Vec::new();
    loop {
        let mut words = vec![p.parse_ident()?];
        while matches!(p.peek().kind, TokenKind::Ident)
            && !p.check_keyword("ON")
            && !p.check_keyword("TO")
            && !p.check_keyword("FROM")
        {
            words.push(p.parse_ident()?);
        }
        let mut columns = Vec::new();
        if p.eat_symbol("(") {
            columns = p.parse_ident_list()?;
            p.expect_symbol(")")?;
        }
        items.push((words, columns));
        if !p.eat_symbol(",") {
            break;
        }
    }
    Ok(GrantItems(items))
}

/// `*.*`, `db.*`, `db.table` or bare `table`; `None` encodes `*`.
fn parse_grant_target(p: &mut Parser) -> Result<GrantTarget, AppError> {
    if p.eat_symbol("*") {
        if p.eat_symbol(".") {
            p.expect_symbol("*")?;
        }
        return Ok(GrantTarget { database: None, table: None });
    }
    let first = p.parse_ident()?;
    if p.eat_symbol(".") {
        if p.eat_symbol("*") {
            return Ok(GrantTarget { database: Some(first.text), table: None });
        }
        let table = p.parse_ident()?;
        return Ok(GrantTarget { database: Some(first.text), table: Some(table.text) });
    }
    Ok(GrantTarget { database: None, table: Some(first.text) })
}

/// Shared by SET ROLE, SET DEFAULT ROLE and the DEFAULT ROLE clause of
/// CREATE/ALTER USER.
pub fn parse_role_spec(p: &mut Parser) -> Result<RoleSpec, AppError> {
    if p.eat_keyword("DEFAULT") {
        return Ok(RoleSpec::Default);
    }
    if p.eat_keyword("NONE") {
        return Ok(RoleSpec::None);
    }
    if p.eat_keyword("ALL") {
        if p.eat_keyword("EXCEPT") {
            return Ok(RoleSpec::AllExcept(p.parse_ident_list()?));
        }
        return Ok(RoleSpec::All);
    }
    Ok(RoleSpec::List(p.parse_ident_list()?))
}

pub fn parse_set_role(p: &mut Parser) -> Result<SetRole, AppError> {
    Ok(SetRole { spec: parse_role_spec(p)? })
}

pub fn parse_set_default_role(p: &mut Parser) -> Result<SetDefaultRole, AppError> {
    let spec = parse_role_spec(p)?;
    p.expect_keyword("TO")?;
    let users = p.parse_ident_list()?;
    Ok(SetDefaultRole { spec, users })
}
