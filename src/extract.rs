//! Extractor: derive a `Schema` from a live database that is equivalent to
//! what the parser and composer would have produced from a corpus. Object
//! lists come from the introspection tables, canonical DDL from
//! `SHOW CREATE ...`, and everything runs back through the parser so both
//! sides of a diff share one representation.

use tracing::{debug, info};

use crate::client::{cell_str, Database};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::ident::{Ident, SYSTEM_DATABASES};
use crate::parser::{self, ast::Statement};
use crate::render::string_lit;
use crate::schema::Schema;

pub struct Extractor<'a, D: Database> {
    db: &'a D,
    config: &'a Config,
}

impl<'a, D: Database> Extractor<'a, D> {
    pub fn new(db: &'a D, config: &'a Config) -> Self {
        Extractor { db, config }
    }

    pub async fn extract(&self) -> AppResult<Schema> {
        let mut stmts: Vec<(Statement, String)> = Vec::new();

        self.extract_databases(&mut stmts).await?;
        self.extract_tables_and_views(&mut stmts).await?;
        self.extract_dictionaries(&mut stmts).await?;
        self.extract_collections(&mut stmts).await?;
        self.extract_functions(&mut stmts).await?;
        self.extract_access_entities(&mut stmts).await?;

        info!(target: "chkeeper::extract", statements = stmts.len(), "live schema extracted");
        let schema = Schema::build(stmts)?.filter_ignored(&self.config.ignore_databases);
        Ok(normalize_cluster(schema, self.config.cluster.as_deref()))
    }

    /// `WHERE database NOT IN (...)` fragment covering system namespaces
    /// and configured ignores.
    fn excluded_databases(&self) -> String {
        let mut names: Vec<String> = SYSTEM_DATABASES.iter().map(|s| s.to_string()).collect();
        names.extend(self.config.ignore_databases.iter().cloned());
        names.iter().map(|n| string_lit(n)).collect::<Vec<_>>().join(", ")
    }

    async fn show_create(&self, what: &str, site: &str, out: &mut Vec<(Statement, String)>) -> AppResult<()> {
        let rows = self.db.query_rows(&format!("SHOW CREATE {what}")).await?;
        let ddl = rows
            .first()
            .and_then(|r| r.first())
            .map(cell_str)
            .ok_or_else(|| AppError::database(format!("empty SHOW CREATE {what} response")))?;
        self.parse_into(&ddl, site, out)
    }

    fn parse_into(&self, ddl: &str, site: &str, out: &mut Vec<(Statement, String)>) -> AppResult<()> {
        let parsed = parser::parse_with_file(ddl, site)?;
        out.extend(parsed.into_iter().map(|s| (s, site.to_string())));
        Ok(())
    }

    async fn extract_databases(&self, out: &mut Vec<(Statement, String)>) -> AppResult<()> {
        let sql = format!(
            "SELECT name FROM system.databases WHERE name NOT IN ({}) ORDER BY name",
            self.excluded_databases()
        );
        for row in self.db.query_rows(&sql).await? {
            let name = cell_str(&row[0]);
            debug!(target: "chkeeper::extract", database = %name, "extracting database");
            self.show_create(&format!("DATABASE {}", Ident::plain(&name)), &format!("live:database {name}"), out)
                .await?;
        }
        Ok(())
    }

    async fn extract_tables_and_views(&self, out: &mut Vec<(Statement, String)>) -> AppResult<()> {
        // Dictionaries also appear in system.tables; they are handled from
        // system.dictionaries instead.
        let sql = format!(
            "SELECT database, name, create_table_query FROM system.tables \
             WHERE database NOT IN ({}) AND engine != 'Dictionary' AND create_table_query != '' \
             ORDER BY database, name",
            self.excluded_databases()
        );
        for row in self.db.query_rows(&sql).await? {
            let database = cell_str(&row[0]);
            let name = cell_str(&row[1]);
            let ddl = cell_str(&row[2]);
            self.parse_into(&ddl, &format!("live:table {database}.{name}"), out)?;
        }
        Ok(())
    }

    async fn extract_dictionaries(&self, out: &mut Vec<(Statement, String)>) -> AppResult<()> {
        let sql = format!(
            "SELECT database, name FROM system.dictionaries WHERE database NOT IN ({}) ORDER BY database, name",
            self.excluded_databases()
        );
        for row in self.db.query_rows(&sql).await? {
            let database = cell_str(&row[0]);
            let name = cell_str(&row[1]);
            self.show_create(
                &format!("DICTIONARY {}.{}", Ident::plain(&database), Ident::plain(&name)),
                &format!("live:dictionary {database}.{name}"),
                out,
            )
            .await?;
        }
        Ok(())
    }

    async fn extract_collections(&self, out: &mut Vec<(Statement, String)>) -> AppResult<()> {
        for row in self.db.query_rows("SELECT name FROM system.named_collections ORDER BY name").await? {
            let name = cell_str(&row[0]);
            self.show_create(
                &format!("NAMED COLLECTION {}", Ident::plain(&name)),
                &format!("live:named collection {name}"),
                out,
            )
            .await?;
        }
        Ok(())
    }

    async fn extract_functions(&self, out: &mut Vec<(Statement, String)>) -> AppResult<()> {
        let rows = self
            .db
            .query_rows("SELECT name, create_query FROM system.functions WHERE origin = 'SQLUserDefined' ORDER BY name")
            .await?;
        for row in rows {
            let name = cell_str(&row[0]);
            let ddl = cell_str(&row[1]);
            self.parse_into(&ddl, &format!("live:function {name}"), out)?;
        }
        Ok(())
    }

    async fn extract_access_entities(&self, out: &mut Vec<(Statement, String)>) -> AppResult<()> {
        for row in self.db.query_rows("SELECT name FROM system.roles ORDER BY name").await? {
            let name = cell_str(&row[0]);
            self.show_create(&format!("ROLE {}", Ident::plain(&name)), &format!("live:role {name}"), out).await?;
            self.extract_grants_for(&name, out).await?;
        }
        for row in self.db.query_rows("SELECT name FROM system.users ORDER BY name").await? {
            let name = cell_str(&row[0]);
            self.show_create(&format!("USER {}", Ident::plain(&name)), &format!("live:user {name}"), out).await?;
            self.extract_grants_for(&name, out).await?;
        }
        Ok(())
    }

    async fn extract_grants_for(&self, grantee: &str, out: &mut Vec<(Statement, String)>) -> AppResult<()> {
        let rows = self.db.query_rows(&format!("SHOW GRANTS FOR {}", Ident::plain(grantee))).await?;
        for row in rows {
            let ddl = cell_str(&row[0]);
            self.parse_into(&ddl, &format!("live:grants {grantee}"), out)?;
        }
        Ok(())
    }
}

/// Force every object onto the configured cluster so differencing is
/// cluster-agnostic; extraction output never carries the clause and the
/// corpus may or may not.
pub fn normalize_cluster(mut schema: Schema, cluster: Option<&str>) -> Schema {
    let value = cluster.map(Ident::plain);
    for db in schema.databases.values_mut() {
        db.cluster = value.clone();
    }
    for t in schema.tables.values_mut() {
        t.cluster = value.clone();
    }
    for d in schema.dictionaries.values_mut() {
        d.cluster = value.clone();
    }
    for v in schema.views.values_mut() {
        v.cluster = value.clone();
    }
    for r in schema.roles.values_mut() {
        r.cluster = value.clone();
    }
    for c in schema.collections.values_mut() {
        c.cluster = value.clone();
    }
    for f in schema.functions.values_mut() {
        f.cluster = value.clone();
    }
    for u in schema.users.values_mut() {
        u.cluster = value.clone();
    }
    schema
}
