//! Persistent per-migration progress. One row per version in
//! `chkeeper.revisions`, created on first use, append-updated as the
//! executor advances. The `RevisionBackend` trait is the seam the
//! executor works through; tests substitute an in-memory map.

use std::future::Future;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::client::{cell_str, cell_u32, Database};
use crate::error::{AppError, AppResult};
use crate::render::string_lit;

pub const REVISION_DATABASE: &str = "chkeeper";
pub const REVISION_TABLE: &str = "chkeeper.revisions";

#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub version: String,
    pub applied_count: u32,
    pub total_count: u32,
    pub statement_hashes: Vec<String>,
    pub error: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
}

pub trait RevisionBackend {
    /// Create the revision database and table when absent.
    fn ensure(&mut self) -> impl Future<Output = AppResult<()>> + Send;

    fn get(&mut self, version: &str) -> impl Future<Output = AppResult<Option<Revision>>> + Send;

    /// Insert or overwrite the row for `rev.version`.
    fn upsert(&mut self, rev: &Revision) -> impl Future<Output = AppResult<()>> + Send;
}

pub struct RevisionStore<'a, D: Database> {
    db: &'a D,
}

impl<'a, D: Database> RevisionStore<'a, D> {
    pub fn new(db: &'a D) -> Self {
        RevisionStore { db }
    }
}

impl<D: Database + Sync> RevisionBackend for RevisionStore<'_, D> {
    async fn ensure(&mut self) -> AppResult<()> {
        self.db.exec(&format!("CREATE DATABASE IF NOT EXISTS {REVISION_DATABASE}")).await?;
        self.db
            .exec(&format!(
                "CREATE TABLE IF NOT EXISTS {REVISION_TABLE}\n(\n    \
                 version String,\n    \
                 applied_count UInt32,\n    \
                 total_count UInt32,\n    \
                 statement_hashes Array(String),\n    \
                 error Nullable(String),\n    \
                 executed_at DateTime\n)\n\
                 ENGINE = ReplacingMergeTree(executed_at)\nORDER BY version"
            ))
            .await
    }

    async fn get(&mut self, version: &str) -> AppResult<Option<Revision>> {
        let sql = format!(
            "SELECT version, applied_count, total_count, statement_hashes, error, toString(executed_at) \
             FROM {REVISION_TABLE} FINAL WHERE version = {} LIMIT 1",
            string_lit(version)
        );
        let rows = self.db.query_rows(&sql).await?;
        let Some(row) = rows.first() else { return Ok(None) };
        if row.len() < 6 {
            return Err(AppError::database(format!("malformed revision row for {version}")));
        }
        let hashes = match &row[3] {
            serde_json::Value::Array(items) => items.iter().map(cell_str).collect(),
            other => return Err(AppError::database(format!("expected hash array, got {other}"))),
        };
        let error = match &row[4] {
            serde_json::Value::Null => None,
            other => Some(cell_str(other)),
        };
        let executed_at = NaiveDateTime::parse_from_str(&cell_str(&row[5]), "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc());
        Ok(Some(Revision {
            version: cell_str(&row[0]),
            applied_count: cell_u32(&row[1])?,
            total_count: cell_u32(&row[2])?,
            statement_hashes: hashes,
            error,
            executed_at,
        }))
    }

    async fn upsert(&mut self, rev: &Revision) -> AppResult<()> {
        let hashes = rev.statement_hashes.iter().map(|h| string_lit(h)).collect::<Vec<_>>().join(", ");
        let error = match &rev.error {
            Some(e) => string_lit(e),
            None => "NULL".to_string(),
        };
        let sql = format!(
            "INSERT INTO {REVISION_TABLE} (version, applied_count, total_count, statement_hashes, error, executed_at) \
             VALUES ({}, {}, {}, [{}], {}, now())",
            string_lit(&rev.version),
            rev.applied_count,
            rev.total_count,
            hashes,
            error
        );
        self.db.exec(&sql).await
    }
}
