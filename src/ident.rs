//! Identifier handling and name qualification
//! -------------------------------------------
//! Single source of truth for identifier spelling, backtick quoting and
//! database-qualified object names. Spelling is preserved exactly as
//! authored; only the quoting flag distinguishes `` `id` `` from `id`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespaces excluded from every extraction and diff.
pub const SYSTEM_DATABASES: &[&str] = &["default", "system", "information_schema", "INFORMATION_SCHEMA"];

/// Reserved prefix marking named collections that originate from the server
/// configuration files rather than DDL; these are filtered during extraction.
pub const CONFIG_COLLECTION_PREFIX: &str = "config_";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub text: String,
    pub quoted: bool,
}

impl Ident {
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Ident { text: text.into(), quoted: false }
    }

    pub fn quoted<S: Into<String>>(text: S) -> Self {
        Ident { text: text.into(), quoted: true }
    }

    /// True when the spelling cannot be written without backticks.
    pub fn needs_quoting(&self) -> bool {
        let mut chars = self.text.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return true,
        }
        !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted || self.needs_quoting() {
            write!(f, "`{}`", self.text.replace('`', "\\`"))
        } else {
            f.write_str(&self.text)
        }
    }
}

/// An object name as written in DDL: optionally database-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectName {
    pub database: Option<Ident>,
    pub name: Ident,
}

impl ObjectName {
    pub fn bare(name: Ident) -> Self {
        ObjectName { database: None, name }
    }

    pub fn qualified(database: Ident, name: Ident) -> Self {
        ObjectName { database: Some(database), name }
    }

    /// Resolve into a canonical key, falling back to `default_db` when the
    /// name was written unqualified.
    pub fn resolve(&self, default_db: &str) -> QualifiedName {
        QualifiedName {
            database: self.database.as_ref().map(|d| d.text.clone()).unwrap_or_else(|| default_db.to_string()),
            name: self.name.text.clone(),
        }
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{}.{}", db, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Canonical map key for namespaced schema objects.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub database: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new<D: Into<String>, N: Into<String>>(database: D, name: N) -> Self {
        QualifiedName { database: database.into(), name: name.into() }
    }

    pub fn is_system(&self) -> bool {
        SYSTEM_DATABASES.contains(&self.database.as_str())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.name)
    }
}
