//! User DDL: CREATE / ALTER / DROP USER with identification, host
//! restriction, validity, default roles, default database and grantee
//! policy clauses.

use crate::error::AppError;
use crate::parser::ast::*;
use crate::parser::common::Parser;
use crate::parser::role::parse_role_spec;

pub fn parse_create_user(p: &mut Parser, or_replace: bool) -> Result<CreateUser, AppError> {
    let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;

    let mut user = CreateUser {
        or_replace,
        if_not_exists,
        name,
        cluster,
        identification: None,
        hosts: Vec::new(),
        valid_until: None,
        access_storage: None,
        default_roles: None,
        default_database: None,
        grantees: None,
        settings: Vec::new(),
    };

    loop {
        if p.eat_keywords(&["NOT", "IDENTIFIED"]) {
            user.identification = Some(Identification::NoPassword);
        } else if p.eat_keyword("IDENTIFIED") {
            user.identification = Some(parse_identification(p)?);
        } else if p.eat_keyword("HOST") {
            user.hosts = parse_host_clauses(p)?;
        } else if p.eat_keywords(&["VALID", "UNTIL"]) {
            user.valid_until = Some(p.parse_string()?);
        } else if p.eat_keyword("IN") {
            user.access_storage = Some(p.parse_ident()?.text);
        } else if p.check_keywords(&["DEFAULT", "ROLE"]) {
            p.advance();
            p.advance();
            user.default_roles = Some(parse_role_spec(p)?);
        } else if p.check_keywords(&["DEFAULT", "DATABASE"]) {
            p.advance();
            p.advance();
            user.default_database = Some(p.parse_ident()?);
        } else if p.eat_keyword("GRANTEES") {
            user.grantees = Some(parse_grantees(p)?);
        } else if p.eat_keyword("SETTINGS") {
            user.settings = p.parse_settings_list()?;
        } else {
            break;
        }
    }
    Ok(user)
}

pub fn parse_alter_user(p: &mut Parser) -> Result<AlterUser, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let name = p.parse_ident()?;
    let cluster = p.parse_on_cluster()?;

    let mut user = AlterUser {
        if_exists,
        name,
        cluster,
        rename_to: None,
        identification: None,
        hosts: None,
        valid_until: None,
        default_roles: None,
        default_database: None,
        grantees: None,
        settings: Vec::new(),
    };

    loop {
        if p.eat_keywords(&["RENAME", "TO"]) {
            user.rename_to = Some(p.parse_ident()?);
        } else if p.eat_keywords(&["NOT", "IDENTIFIED"]) {
            user.identification = Some(Identification::NoPassword);
        } else if p.eat_keyword("IDENTIFIED") {
            user.identification = Some(parse_identification(p)?);
        } else if p.eat_keyword("HOST") {
            user.hosts = Some(parse_host_clauses(p)?);
        } else if p.eat_keywords(&["VALID", "UNTIL"]) {
            user.valid_until = Some(p.parse_string()?);
        } else if p.check_keywords(&["DEFAULT", "ROLE"]) {
            p.advance();
            p.advance();
            user.default_roles = Some(parse_role_spec(p)?);
        } else if p.check_keywords(&["DEFAULT", "DATABASE"]) {
            p.advance();
            p.advance();
            user.default_database = Some(p.parse_ident()?);
        } else if p.eat_keyword("GRANTEES") {
            user.grantees = Some(parse_grantees(p)?);
        } else if p.eat_keyword("SETTINGS") {
            user.settings = p.parse_settings_list()?;
        } else {
            break;
        }
    }
    Ok(user)
}

pub fn parse_drop_user(p: &mut Parser) -> Result<DropUser, AppError> {
    let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
    let names = p.parse_ident_list()?;
    let cluster = p.parse_on_cluster()?;
    Ok(DropUser { if_exists, names, cluster })
}

fn parse_identification(p: &mut Parser) -> Result<Identification, AppError> {
    // `IDENTIFIED BY 'pass'` defaults to sha256_password.
    if p.eat_keyword("BY") {
        return Ok(Identification::Sha256Password(p.parse_string()?));
    }
    p.expect_keyword("WITH")?;
    let method = p.parse_ident()?.text.to_lowercase();
    // SHOW CREATE USER omits the BY clause rather than reveal secrets; an
    // absent value parses as empty.
    let by_value = |p: &mut Parser| -> Result<String, AppError> {
        if p.eat_keyword("BY") {
            p.parse_string()
        } else {
            Ok(String::new())
        }
    };
    match method.as_str() {
        "no_password" => Ok(Identification::NoPassword),
        "plaintext_password" => Ok(Identification::PlaintextPassword(by_value(p)?)),
        "sha256_password" => Ok(Identification::Sha256Password(by_value(p)?)),
        "sha256_hash" => {
            let hash = by_value(p)?;
            let salt = if p.eat_keyword("SALT") { Some(p.parse_string()?) } else { None };
            Ok(Identification::Sha256Hash { hash, salt })
        }
        "double_sha1_password" => Ok(Identification::DoubleSha1Password(by_value(p)?)),
        "double_sha1_hash" => Ok(Identification::DoubleSha1Hash(by_value(p)?)),
        "bcrypt_password" => Ok(Identification::BcryptPassword(by_value(p)?)),
        "bcrypt_hash" => Ok(Identification::BcryptHash(by_value(p)?)),
        "ldap" => {
            p.expect_keyword("SERVER")?;
            Ok(Identification::Ldap { server: p.parse_string()? })
        }
        "kerberos" => {
            let realm = if p.eat_keyword("REALM") { Some(p.parse_string()?) } else { None };
            Ok(Identification::Kerberos { realm })
        }
        "ssl_certificate" => {
            p.expect_keyword("CN")?;
            let mut common_names = vec![p.parse_string()?];
            while p.eat_symbol(",") {
                common_names.push(p.parse_string()?);
            }
            Ok(Identification::SslCertificate { common_names })
        }
        _ => Err(p.error(&[
            "no_password",
            "plaintext_password",
            "sha256_password",
            "sha256_hash",
            "double_sha1_password",
            "double_sha1_hash",
            "bcrypt_password",
            "bcrypt_hash",
            "ldap",
            "kerberos",
            "ssl_certificate",
        ])),
    }
}

fn parse_host_clauses(p: &mut Parser) -> Result<Vec<HostClause>, AppError> {
    let mut out = Vec::new();
    loop {
        if p.eat_keyword("ANY") {
            out.push(HostClause::Any);
        } else if p.eat_keyword("NONE") {
            out.push(HostClause::None);
        } else if p.eat_keyword("LOCAL") {
            out.push(HostClause::Local);
        } else if p.eat_keyword("IP") {
            out.push(HostClause::Ip(p.parse_string()?));
        } else if p.eat_keyword("LIKE") {
            out.push(HostClause::Like(p.parse_string()?));
        } else if p.eat_keyword("NAME") {
            out.push(HostClause::Name(p.parse_string()?));
        } else if p.eat_keyword("REGEXP") {
            out.push(HostClause::Regexp(p.parse_string()?));
        } else {
            return Err(p.error(&["ANY", "NONE", "LOCAL", "IP", "LIKE", "NAME", "REGEXP"]));
        }
        if !p.eat_symbol(",") {
            break;
        }
    }
    Ok(out)
}

fn parse_grantees(p: &mut Parser) -> Result<GranteesSpec, AppError> {
    let grantees = parse_grantee_items(p)?;
    let except = if p.eat_keyword("EXCEPT") { parse_grantee_items(p)? } else { Vec::new() };
    Ok(GranteesSpec { grantees, except })
}

fn parse_grantee_items(p: &mut Parser) -> Result<Vec<GranteeItem>, AppError> {
    let mut out = Vec::new();
    loop {
        if p.eat_keyword("ANY") {
            out.push(GranteeItem::Any);
        } else if p.eat_keyword("NONE") {
            out.push(GranteeItem::None);
        } else {
            out.push(GranteeItem::Named(p.parse_ident()?));
        }
        if !p.eat_symbol(",") {
            break;
        }
    }
    Ok(out)
}
