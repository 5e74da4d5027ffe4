//! DDL parser: byte stream in, typed statement list out.
//! The entry point splits the token stream into `;`-separated statements,
//! attaches comments by line adjacency and dispatches on the leading
//! keyword. Parsing is stateless and reentrant; failures carry position,
//! expected-token set and the offending source line.

use crate::error::AppError;

pub mod ast;
pub mod collection;
pub mod common;
pub mod database;
pub mod dictionary;
pub mod expr;
pub mod function;
pub mod lexer;
pub mod role;
pub mod select;
pub mod table;
pub mod types;
pub mod user;
pub mod view;

// Re-export the tree and cursor types so callers use `parser::Statement`
// and friends directly.
pub use ast::*;
pub use common::Parser;
pub use lexer::{Token, TokenKind};

/// Parse a DDL stream with no file attribution.
pub fn parse(input: &str) -> Result<Vec<Statement>, AppError> {
    parse_with_file(input, "<input>")
}

/// Parse a DDL stream, attributing errors to `file`.
pub fn parse_with_file(input: &str, file: &str) -> Result<Vec<Statement>, AppError> {
    let tokens = lexer::lex(input, file)?;
    let mut out: Vec<Statement> = Vec::new();
    let mut pending: Vec<ast::Comment> = Vec::new();
    let mut i = 0usize;

    while i < tokens.len() {
        let tok = &tokens[i];
        match tok.kind {
            TokenKind::Eof => {
                flush_standalone(&mut out, &mut pending);
                break;
            }
            TokenKind::LineComment | TokenKind::BlockComment => {
                if tok.blank_before {
                    flush_standalone(&mut out, &mut pending);
                }
                pending.push(comment_of(tok));
                i += 1;
            }
            _ => {
                let leading = if tok.blank_before {
                    flush_standalone(&mut out, &mut pending);
                    Vec::new()
                } else {
                    std::mem::take(&mut pending)
                };

                // Collect this statement's tokens up to the separating ';',
                // dropping interior comments.
                let mut stmt_tokens: Vec<Token> = Vec::new();
                let mut end_line = tok.line;
                while i < tokens.len() {
                    let t = &tokens[i];
                    if t.kind == TokenKind::Eof {
                        break;
                    }
                    if t.is_symbol(";") {
                        end_line = t.line;
                        i += 1;
                        break;
                    }
                    if !t.is_comment() {
                        end_line = t.line;
                        stmt_tokens.push(t.clone());
                    }
                    i += 1;
                }
                // A bare `;` carries no statement.
                if stmt_tokens.is_empty() {
                    pending = leading;
                    continue;
                }
                stmt_tokens.push(eof_token(&tokens));

                let mut p = Parser::new(stmt_tokens, file, input);
                let kind = parse_statement(&mut p)?;
                if !p.at_end() {
                    return Err(p.error(&["';'", "end of statement"]));
                }

                // A comment on the statement's closing line trails it.
                let trailing = match tokens.get(i) {
                    Some(t) if t.is_comment() && t.line == end_line => {
                        i += 1;
                        Some(comment_of(t))
                    }
                    _ => None,
                };
                out.push(Statement { leading, kind, trailing });
            }
        }
    }
    Ok(out)
}

fn comment_of(tok: &Token) -> ast::Comment {
    ast::Comment { text: tok.text.clone(), block: tok.kind == TokenKind::BlockComment }
}

fn eof_token(tokens: &[Token]) -> Token {
    tokens.last().expect("lexer always emits Eof").clone()
}

fn flush_standalone(out: &mut Vec<Statement>, pending: &mut Vec<ast::Comment>) {
    for c in pending.drain(..) {
        out.push(Statement::bare(StatementKind::Comment(c)));
    }
}

/// Dispatch on the leading keyword(s). Family modules take over after the
/// object keyword is consumed.
fn parse_statement(p: &mut Parser) -> Result<StatementKind, AppError> {
    if p.eat_keyword("CREATE") {
        let or_replace = p.eat_keywords(&["OR", "REPLACE"]);
        if p.eat_keyword("TABLE") {
            return Ok(StatementKind::CreateTable(table::parse_create_table(p, or_replace)?));
        }
        if p.eat_keyword("DATABASE") {
            return Ok(StatementKind::CreateDatabase(database::parse_create_database(p, or_replace)?));
        }
        if p.eat_keyword("DICTIONARY") {
            return Ok(StatementKind::CreateDictionary(dictionary::parse_create_dictionary(p, or_replace)?));
        }
        if p.eat_keywords(&["MATERIALIZED", "VIEW"]) {
            return Ok(StatementKind::CreateView(view::parse_create_view(p, or_replace, true)?));
        }
        if p.eat_keyword("VIEW") {
            return Ok(StatementKind::CreateView(view::parse_create_view(p, or_replace, false)?));
        }
        if p.eat_keywords(&["NAMED", "COLLECTION"]) {
            return Ok(StatementKind::CreateNamedCollection(collection::parse_create_named_collection(p, or_replace)?));
        }
        if p.eat_keyword("ROLE") {
            return Ok(StatementKind::CreateRole(role::parse_create_role(p, or_replace)?));
        }
        if p.eat_keyword("FUNCTION") {
            return Ok(StatementKind::CreateFunction(function::parse_create_function(p, or_replace)?));
        }
        if p.eat_keyword("USER") {
            return Ok(StatementKind::CreateUser(user::parse_create_user(p, or_replace)?));
        }
        return Err(p.error(&[
            "TABLE",
            "DATABASE",
            "DICTIONARY",
            "VIEW",
            "MATERIALIZED VIEW",
            "NAMED COLLECTION",
            "ROLE",
            "FUNCTION",
            "USER",
        ]));
    }

    if p.eat_keyword("ALTER") {
        if p.eat_keyword("TABLE") {
            return Ok(StatementKind::AlterTable(table::parse_alter_table(p)?));
        }
        if p.eat_keyword("DATABASE") {
            return Ok(StatementKind::AlterDatabase(database::parse_alter_database(p)?));
        }
        if p.eat_keywords(&["NAMED", "COLLECTION"]) {
            return Ok(StatementKind::AlterNamedCollection(collection::parse_alter_named_collection(p)?));
        }
        if p.eat_keyword("ROLE") {
            return Ok(StatementKind::AlterRole(role::parse_alter_role(p)?));
        }
        if p.eat_keyword("USER") {
            return Ok(StatementKind::AlterUser(user::parse_alter_user(p)?));
        }
        return Err(p.error(&["TABLE", "DATABASE", "NAMED COLLECTION", "ROLE", "USER"]));
    }

    if p.eat_keyword("DROP") {
        if p.eat_keyword("TABLE") {
            let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
            let name = p.parse_object_name()?;
            let cluster = p.parse_on_cluster()?;
            let sync = p.eat_keyword("SYNC");
            return Ok(StatementKind::Drop(DropObject { kind: ObjectKind::Table, if_exists, name, cluster, sync }));
        }
        if p.eat_keyword("DATABASE") {
            return Ok(StatementKind::DropDatabase(database::parse_drop_database(p)?));
        }
        if p.eat_keyword("DICTIONARY") {
            return Ok(StatementKind::Drop(dictionary::parse_drop_dictionary(p)?));
        }
        if p.eat_keyword("VIEW") {
            return Ok(StatementKind::Drop(view::parse_drop_view(p)?));
        }
        if p.eat_keywords(&["NAMED", "COLLECTION"]) {
            return Ok(StatementKind::DropNamedCollection(collection::parse_drop_named_collection(p)?));
        }
        if p.eat_keyword("ROLE") {
            return Ok(StatementKind::DropRole(role::parse_drop_role(p)?));
        }
        if p.eat_keyword("FUNCTION") {
            return Ok(StatementKind::DropFunction(function::parse_drop_function(p)?));
        }
        if p.eat_keyword("USER") {
            return Ok(StatementKind::DropUser(user::parse_drop_user(p)?));
        }
        return Err(p.error(&[
            "TABLE",
            "DATABASE",
            "DICTIONARY",
            "VIEW",
            "NAMED COLLECTION",
            "ROLE",
            "FUNCTION",
            "USER",
        ]));
    }

    if p.eat_keyword("RENAME") {
        if p.eat_keyword("DATABASE") {
            return Ok(StatementKind::RenameDatabase(database::parse_rename_database(p)?));
        }
        let kind = if p.eat_keyword("DICTIONARY") {
            ObjectKind::Dictionary
        } else {
            p.expect_keyword("TABLE")?;
            ObjectKind::Table
        };
        let mut renames = Vec::new();
        loop {
            let from = p.parse_object_name()?;
            p.expect_keyword("TO")?;
            let to = p.parse_object_name()?;
            renames.push((from, to));
            if !p.eat_symbol(",") {
                break;
            }
        }
        let cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::Rename(RenameObjects { kind, renames, cluster }));
    }

    if p.eat_keyword("ATTACH") {
        if p.eat_keyword("DATABASE") {
            return Ok(StatementKind::AttachDatabase(database::parse_attach_database(p)?));
        }
        let kind = attach_kind(p)?;
        let if_not_exists = p.eat_keywords(&["IF", "NOT", "EXISTS"]);
        let name = p.parse_object_name()?;
        let cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::Attach(AttachObject { kind, if_not_exists, name, cluster }));
    }

    if p.eat_keyword("DETACH") {
        if p.eat_keyword("DATABASE") {
            return Ok(StatementKind::DetachDatabase(database::parse_detach_database(p)?));
        }
        let kind = attach_kind(p)?;
        let if_exists = p.eat_keywords(&["IF", "EXISTS"]);
        let name = p.parse_object_name()?;
        let cluster = p.parse_on_cluster()?;
        let permanently = p.eat_keyword("PERMANENTLY");
        let sync = p.eat_keyword("SYNC");
        return Ok(StatementKind::Detach(DetachObject { kind, if_exists, name, cluster, permanently, sync }));
    }

    if p.eat_keyword("GRANT") {
        return Ok(StatementKind::Grant(role::parse_grant(p)?));
    }
    if p.eat_keyword("REVOKE") {
        return Ok(StatementKind::Revoke(role::parse_revoke(p)?));
    }

    if p.eat_keyword("SET") {
        if p.eat_keywords(&["DEFAULT", "ROLE"]) {
            return Ok(StatementKind::SetDefaultRole(role::parse_set_default_role(p)?));
        }
        if p.eat_keyword("ROLE") {
            return Ok(StatementKind::SetRole(role::parse_set_role(p)?));
        }
        return Err(p.error(&["ROLE", "DEFAULT ROLE"]));
    }

    if p.check_keyword("SELECT") || p.check_keyword("WITH") {
        return Ok(StatementKind::Select(select::parse_select_query(p)?));
    }

    Err(p.error(&[
        "CREATE", "ALTER", "DROP", "RENAME", "ATTACH", "DETACH", "GRANT", "REVOKE", "SET", "SELECT",
    ]))
}

fn attach_kind(p: &mut Parser) -> Result<ObjectKind, AppError> {
    if p.eat_keyword("TABLE") {
        Ok(ObjectKind::Table)
    } else if p.eat_keyword("DICTIONARY") {
        Ok(ObjectKind::Dictionary)
    } else if p.eat_keyword("VIEW") {
        Ok(ObjectKind::View)
    } else {
        Err(p.error(&["TABLE", "DICTIONARY", "VIEW", "DATABASE"]))
    }
}

#[cfg(test)]
mod tests;
