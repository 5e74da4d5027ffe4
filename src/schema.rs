//! Canonical in-memory schema: maps keyed by qualified name for each
//! namespaced object kind plus global maps for roles, named collections,
//! functions and users. Construction is one-shot from a statement stream;
//! a duplicate insertion fails naming both sites. Objects are never
//! mutated after construction — the planner builds new ones.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::ident::{Ident, QualifiedName, CONFIG_COLLECTION_PREFIX};
use crate::parser::ast::*;

/// Fallback database for unqualified object names in the corpus.
pub const DEFAULT_DATABASE: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub databases: BTreeMap<String, CreateDatabase>,
    pub tables: BTreeMap<QualifiedName, CreateTable>,
    pub dictionaries: BTreeMap<QualifiedName, CreateDictionary>,
    pub views: BTreeMap<QualifiedName, CreateView>,
    pub roles: BTreeMap<String, Role>,
    pub collections: BTreeMap<String, CreateNamedCollection>,
    pub functions: BTreeMap<String, CreateFunction>,
    pub users: BTreeMap<String, CreateUser>,
    pub grants: Vec<GrantStmt>,
}

impl Schema {
    /// Assemble a schema from parsed statements. `site` names where each
    /// statement came from, for duplicate reporting.
    pub fn build<I>(stmts: I) -> AppResult<Schema>
    where
        I: IntoIterator<Item = (Statement, String)>,
    {
        let mut schema = Schema::default();
        let mut sites: BTreeMap<String, String> = BTreeMap::new();

        let mut claim = |key: String, site: &str, sites: &mut BTreeMap<String, String>| -> AppResult<()> {
            if let Some(first) = sites.get(&key) {
                return Err(AppError::DuplicateDefinition {
                    name: key,
                    first: first.clone(),
                    second: site.to_string(),
                });
            }
            sites.insert(key, site.to_string());
            Ok(())
        };

        for (stmt, site) in stmts {
            match stmt.kind {
                StatementKind::Comment(_) => {}
                StatementKind::CreateDatabase(db) => {
                    claim(format!("database {}", db.name.text), &site, &mut sites)?;
                    schema.databases.insert(db.name.text.clone(), db);
                }
                StatementKind::CreateTable(t) => {
                    let key = t.name.resolve(DEFAULT_DATABASE);
                    claim(format!("table {key}"), &site, &mut sites)?;
                    schema.tables.insert(key, t);
                }
                StatementKind::CreateDictionary(d) => {
                    let key = d.name.resolve(DEFAULT_DATABASE);
                    claim(format!("dictionary {key}"), &site, &mut sites)?;
                    schema.dictionaries.insert(key, d);
                }
                StatementKind::CreateView(v) => {
                    let key = v.name.resolve(DEFAULT_DATABASE);
                    claim(format!("view {key}"), &site, &mut sites)?;
                    schema.views.insert(key, v);
                }
                StatementKind::CreateRole(r) => {
                    for name in &r.names {
                        claim(format!("role {}", name.text), &site, &mut sites)?;
                        schema.roles.insert(
                            name.text.clone(),
                            Role { name: name.clone(), cluster: r.cluster.clone(), settings: r.settings.clone() },
                        );
                    }
                }
                StatementKind::CreateNamedCollection(c) => {
                    claim(format!("named collection {}", c.name.text), &site, &mut sites)?;
                    schema.collections.insert(c.name.text.clone(), c);
                }
                StatementKind::CreateFunction(f) => {
                    claim(format!("function {}", f.name.text), &site, &mut sites)?;
                    schema.functions.insert(f.name.text.clone(), f);
                }
                StatementKind::CreateUser(u) => {
                    claim(format!("user {}", u.name.text), &site, &mut sites)?;
                    schema.users.insert(u.name.text.clone(), u);
                }
                StatementKind::Grant(g) => schema.grants.push(g),
                other => {
                    debug!(target: "chkeeper::schema", "skipping non-definitional statement at {site}: {other:?}");
                }
            }
        }
        Ok(schema)
    }

    /// Drop system namespaces, ignored databases and config-born named
    /// collections. Applied to both sides before diffing.
    pub fn filter_ignored(mut self, ignore_databases: &[String]) -> Schema {
        let ignored = |db: &str| -> bool {
            QualifiedName::new(db, "").is_system() || ignore_databases.iter().any(|i| i == db)
        };
        self.databases.retain(|name, _| !ignored(name));
        self.tables.retain(|key, _| !ignored(&key.database));
        self.dictionaries.retain(|key, _| !ignored(&key.database));
        self.views.retain(|key, _| !ignored(&key.database));
        self.collections.retain(|name, _| !name.starts_with(CONFIG_COLLECTION_PREFIX));
        self
    }

    /// Drop only the named databases. Used on the corpus side, where
    /// system namespaces must stay visible to the planner's validation
    /// gate instead of being silently filtered.
    pub fn without_databases(mut self, ignore_databases: &[String]) -> Schema {
        let ignored = |db: &str| ignore_databases.iter().any(|i| i == db);
        self.databases.retain(|name, _| !ignored(name));
        self.tables.retain(|key, _| !ignored(&key.database));
        self.dictionaries.retain(|key, _| !ignored(&key.database));
        self.views.retain(|key, _| !ignored(&key.database));
        self
    }

    /// Columns of a table, resolving one level of `AS <source-table>`
    /// inheritance against this schema.
    pub fn table_columns<'a>(&'a self, table: &'a CreateTable) -> Vec<&'a ColumnDef> {
        if table.elements.is_empty() {
            if let Some(AsSource::Table(source)) = &table.as_source {
                let key = source.resolve(DEFAULT_DATABASE);
                if let Some(src) = self.tables.get(&key) {
                    return columns_of(src);
                }
            }
        }
        columns_of(table)
    }

    /// Tables that inherit their structure from `source` via `AS`.
    pub fn dependents_of(&self, source: &QualifiedName) -> Vec<&QualifiedName> {
        self.tables
            .iter()
            .filter(|(_, t)| match &t.as_source {
                Some(AsSource::Table(src)) => &src.resolve(DEFAULT_DATABASE) == source,
                _ => false,
            })
            .map(|(key, _)| key)
            .collect()
    }
}

pub fn columns_of(table: &CreateTable) -> Vec<&ColumnDef> {
    table
        .elements
        .iter()
        .filter_map(|e| match e {
            TableElement::Column(c) => Some(c),
            _ => None,
        })
        .collect()
}

pub fn indexes_of(table: &CreateTable) -> Vec<&IndexDef> {
    table
        .elements
        .iter()
        .filter_map(|e| match e {
            TableElement::Index(i) => Some(i),
            _ => None,
        })
        .collect()
}

pub fn constraints_of(table: &CreateTable) -> Vec<&ConstraintDef> {
    table
        .elements
        .iter()
        .filter_map(|e| match e {
            TableElement::Constraint(c) => Some(c),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn build(sql: &str) -> AppResult<Schema> {
        let stmts = parse(sql).expect("parse");
        Schema::build(stmts.into_iter().enumerate().map(|(i, s)| (s, format!("schema.sql#{i}"))))
    }

    #[test]
    fn builds_all_object_kinds() {
        let schema = build(
            "CREATE DATABASE a;\
             CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;\
             CREATE DICTIONARY a.d (id UInt64) PRIMARY KEY id SOURCE(CLICKHOUSE(TABLE 't' DB 'a')) LAYOUT(FLAT());\
             CREATE VIEW a.v AS SELECT id FROM a.t;\
             CREATE ROLE reader, writer;\
             CREATE NAMED COLLECTION nc AS k = 'v';\
             CREATE FUNCTION f AS x -> x + 1;\
             CREATE USER alice IDENTIFIED BY 'pw';\
             GRANT SELECT ON a.* TO reader;",
        )
        .expect("schema");
        assert_eq!(schema.databases.len(), 1);
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.dictionaries.len(), 1);
        assert_eq!(schema.views.len(), 1);
        assert_eq!(schema.roles.len(), 2);
        assert_eq!(schema.collections.len(), 1);
        assert_eq!(schema.functions.len(), 1);
        assert_eq!(schema.users.len(), 1);
        assert_eq!(schema.grants.len(), 1);
    }

    #[test]
    fn duplicate_definition_names_both_sites() {
        let err = build("CREATE TABLE a.t (id UInt64) ENGINE = Memory; CREATE TABLE a.t (id UInt64) ENGINE = Memory;")
            .expect_err("duplicate must fail");
        match err {
            AppError::DuplicateDefinition { name, first, second } => {
                assert!(name.contains("a.t"));
                assert_ne!(first, second);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn filter_drops_system_and_ignored() {
        let schema = build(
            "CREATE DATABASE system;\
             CREATE DATABASE staging;\
             CREATE DATABASE prod;\
             CREATE TABLE staging.t (id UInt64) ENGINE = Memory;\
             CREATE NAMED COLLECTION config_internal AS k = 'v';\
             CREATE NAMED COLLECTION mine AS k = 'v';",
        )
        .expect("schema")
        .filter_ignored(&["staging".to_string()]);
        assert!(!schema.databases.contains_key("system"));
        assert!(!schema.databases.contains_key("staging"));
        assert!(schema.databases.contains_key("prod"));
        assert!(schema.tables.is_empty());
        assert!(!schema.collections.contains_key("config_internal"));
        assert!(schema.collections.contains_key("mine"));
    }

    #[test]
    fn as_table_columns_are_inherited() {
        let schema = build(
            "CREATE TABLE a.base (id UInt64, name String) ENGINE = MergeTree() ORDER BY id;\
             CREATE TABLE a.dist AS a.base ENGINE = Distributed(main, a, base);",
        )
        .expect("schema");
        let dist = schema.tables.get(&QualifiedName::new("a", "dist")).expect("dist");
        let cols = schema.table_columns(dist);
        assert_eq!(cols.len(), 2, "columns come from the AS source");
        let deps = schema.dependents_of(&QualifiedName::new("a", "base"));
        assert_eq!(deps.len(), 1);
    }
}
