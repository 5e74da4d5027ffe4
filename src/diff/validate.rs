//! Planner validation gates. Failures convert into errors returned as a
//! batch; the plan is withheld entirely when any gate fires.

use tracing::warn;

use crate::error::AppError;
use crate::ident::QualifiedName;
use crate::parser::ast::Expr;
use crate::parser::ast::Literal;
use crate::schema::Schema;

/// The corpus may never define or modify objects in system namespaces.
pub fn system_objects(target: &Schema, errors: &mut Vec<AppError>) {
    for name in target.databases.keys() {
        if QualifiedName::new(name.clone(), "").is_system() {
            errors.push(AppError::SystemObjectModification { name: name.clone() });
        }
    }
    for key in target.tables.keys().chain(target.dictionaries.keys()).chain(target.views.keys()) {
        if key.is_system() {
            errors.push(AppError::SystemObjectModification { name: key.to_string() });
        }
    }
}

/// Dictionaries with a ClickHouse source must reference a table the target
/// schema knows about. A reference satisfied later in the plan is legal
/// and only logged.
pub fn dictionary_sources(target: &Schema) {
    for (key, dict) in &target.dictionaries {
        let Some(source) = &dict.source else { continue };
        if !source.name.eq_ignore_ascii_case("clickhouse") {
            continue;
        }
        let table = source.param("table").and_then(string_value);
        let database = source.param("db").and_then(string_value).unwrap_or_else(|| key.database.clone());
        let Some(table) = table else { continue };
        let referenced = QualifiedName::new(database, table);
        if !target.tables.contains_key(&referenced) && !target.views.contains_key(&referenced) {
            warn!(
                target: "chkeeper::diff",
                dictionary = %key,
                source = %referenced,
                "dictionary source is not defined in the target schema; assuming it exists on the server"
            );
        }
    }
}

fn string_value(e: &Expr) -> Option<String> {
    match e {
        Expr::Literal(Literal::String(s)) => Some(s.clone()),
        Expr::Identifier(parts) if parts.len() == 1 => Some(parts[0].text.clone()),
        _ => None,
    }
}
