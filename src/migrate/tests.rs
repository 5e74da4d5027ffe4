use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use crate::client::{CancelToken, Database};
use crate::error::{AppError, AppResult};
use crate::migrate::executor::{execute, rehash, status, VersionState};
use crate::migrate::revision::{Revision, RevisionBackend};
use crate::migrate::{load_migrations, version_stamp, write_plan_file, Migration};

/// Scripted database: records every statement, fails the Nth exec once.
struct ScriptedDb {
    log: Mutex<Vec<String>>,
    fail_at: Mutex<Option<(usize, String)>>,
    execs: Mutex<usize>,
}

impl ScriptedDb {
    fn new() -> Self {
        ScriptedDb { log: Mutex::new(Vec::new()), fail_at: Mutex::new(None), execs: Mutex::new(0) }
    }

    fn fail_on_exec(&self, nth: usize, message: &str) {
        *self.fail_at.lock().expect("lock") = Some((nth, message.to_string()));
    }

    fn executed(&self) -> Vec<String> {
        self.log.lock().expect("lock").clone()
    }
}

impl Database for ScriptedDb {
    async fn exec(&self, sql: &str) -> AppResult<()> {
        let mut execs = self.execs.lock().expect("lock");
        *execs += 1;
        let n = *execs;
        drop(execs);
        let failing = self.fail_at.lock().expect("lock").clone();
        if let Some((nth, message)) = failing {
            if n == nth {
                *self.fail_at.lock().expect("lock") = None;
                return Err(AppError::database(message));
            }
        }
        self.log.lock().expect("lock").push(sql.to_string());
        Ok(())
    }

    async fn query_rows(&self, _sql: &str) -> AppResult<Vec<Vec<serde_json::Value>>> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct MemoryRevisions {
    rows: BTreeMap<String, Revision>,
}

impl RevisionBackend for MemoryRevisions {
    async fn ensure(&mut self) -> AppResult<()> {
        Ok(())
    }

    async fn get(&mut self, version: &str) -> AppResult<Option<Revision>> {
        Ok(self.rows.get(version).cloned())
    }

    async fn upsert(&mut self, rev: &Revision) -> AppResult<()> {
        self.rows.insert(rev.version.clone(), rev.clone());
        Ok(())
    }
}

fn migration(version: &str, statements: &[&str]) -> Migration {
    Migration::from_text(version, Path::new(&format!("{version}.sql")), &format!("{};", statements.join(";\n")))
}

#[tokio::test]
async fn applies_statements_in_order_and_finalizes_the_row() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let m = migration("20240101000000", &["CREATE DATABASE a", "CREATE TABLE a.t (id UInt64) ENGINE = Memory"]);
    let report = execute(&db, &mut store, &[m], &CancelToken::new(), false).await.expect("execute");
    assert_eq!(report.applied, vec![("20240101000000".to_string(), 2)]);
    assert_eq!(db.executed().len(), 2);
    let rev = store.rows.get("20240101000000").expect("row");
    assert_eq!(rev.applied_count, 2);
    assert_eq!(rev.total_count, 2);
    assert!(rev.error.is_none());
}

#[tokio::test]
async fn s6_failure_persists_progress_and_resume_completes() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let m = migration(
        "20240101000000",
        &["CREATE DATABASE a", "CREATE TABLE a.t1 (id UInt64) ENGINE = Memory", "CREATE TABLE a.t2 (id UInt64) ENGINE = Memory", "CREATE TABLE a.t3 (id UInt64) ENGINE = Memory"],
    );

    // Statement 3 (index 2) fails on the first run.
    db.fail_on_exec(3, "table exists");
    let err = execute(&db, &mut store, &[m.clone()], &CancelToken::new(), false)
        .await
        .expect_err("first run fails");
    assert!(matches!(err, AppError::Database { .. }));
    {
        let rev = store.rows.get("20240101000000").expect("row");
        assert_eq!(rev.applied_count, 2);
        assert_eq!(rev.total_count, 4);
        assert_eq!(rev.error.as_deref(), Some("database error: table exists"));
    }
    assert_eq!(db.executed().len(), 2, "statements before the failure ran once");

    // Second invocation resumes at index 2 and completes.
    let report = execute(&db, &mut store, &[m], &CancelToken::new(), false).await.expect("resume");
    assert_eq!(report.applied, vec![("20240101000000".to_string(), 2)]);
    let rev = store.rows.get("20240101000000").expect("row");
    assert_eq!(rev.applied_count, 4);
    assert!(rev.error.is_none());
    // Resume safety: every statement ran exactly once across both runs.
    assert_eq!(db.executed().len(), 4);
    let log = db.executed();
    assert!(log[2].contains("a.t2"), "resumed exactly at the failing statement: {log:?}");
}

#[tokio::test]
async fn completed_migrations_are_skipped() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let m = migration("20240101000000", &["CREATE DATABASE a"]);
    execute(&db, &mut store, &[m.clone()], &CancelToken::new(), false).await.expect("first");
    let report = execute(&db, &mut store, &[m], &CancelToken::new(), false).await.expect("second");
    assert_eq!(report.skipped, vec!["20240101000000".to_string()]);
    assert_eq!(db.executed().len(), 1, "no statement ran twice");
}

#[tokio::test]
async fn hash_mismatch_stops_before_any_statement() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let original = migration("20240101000000", &["CREATE DATABASE a", "CREATE DATABASE b", "CREATE DATABASE c"]);

    db.fail_on_exec(2, "boom");
    let _ = execute(&db, &mut store, &[original], &CancelToken::new(), false).await.expect_err("partial");
    assert_eq!(db.executed().len(), 1);

    // The already-applied first statement is edited before the retry.
    let edited = migration("20240101000000", &["CREATE DATABASE a_changed", "CREATE DATABASE b", "CREATE DATABASE c"]);
    let err = execute(&db, &mut store, &[edited], &CancelToken::new(), false).await.expect_err("must refuse");
    match err {
        AppError::HashMismatch { version, index, .. } => {
            assert_eq!(version, "20240101000000");
            assert_eq!(index, 0);
        }
        other => panic!("{other:?}"),
    }
    assert_eq!(db.executed().len(), 1, "no further statements executed");
    assert_eq!(store.rows.get("20240101000000").expect("row").applied_count, 1, "revision not advanced");
}

#[tokio::test]
async fn count_mismatch_is_fatal() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let original = migration("20240101000000", &["CREATE DATABASE a", "CREATE DATABASE b"]);
    db.fail_on_exec(2, "boom");
    let _ = execute(&db, &mut store, &[original], &CancelToken::new(), false).await.expect_err("partial");

    let shrunk = migration("20240101000000", &["CREATE DATABASE a"]);
    let err = execute(&db, &mut store, &[shrunk], &CancelToken::new(), false).await.expect_err("must refuse");
    match err {
        AppError::CountMismatch { expected, actual, .. } => {
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("{other:?}"),
    }
}

#[tokio::test]
async fn dry_run_issues_no_writes() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let m = migration("20240101000000", &["CREATE DATABASE a", "CREATE DATABASE b"]);
    let report = execute(&db, &mut store, &[m], &CancelToken::new(), true).await.expect("dry run");
    assert!(db.executed().is_empty());
    assert!(store.rows.is_empty());
    assert_eq!(report.pending.len(), 1);
    assert_eq!(report.pending[0].1.len(), 2);
}

#[tokio::test]
async fn cancellation_between_statements_preserves_progress() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let m = migration("20240101000000", &["CREATE DATABASE a", "CREATE DATABASE b"]);
    let cancel = CancelToken::new();

    // Cancel after the first statement by observing the store: simplest is
    // to run with a pre-canceled token and verify nothing starts.
    cancel.cancel();
    let err = execute(&db, &mut store, &[m.clone()], &cancel, false).await.expect_err("canceled");
    assert!(matches!(err, AppError::Canceled));
    assert!(db.executed().is_empty());

    // A fresh token resumes normally, proving cancellation left a
    // consistent state.
    let report = execute(&db, &mut store, &[m], &CancelToken::new(), false).await.expect("resume");
    assert_eq!(report.applied.len(), 1);
}

#[tokio::test]
async fn rejects_non_increasing_version_sequences() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let a = migration("20240102000000", &["CREATE DATABASE a"]);
    let b = migration("20240101000000", &["CREATE DATABASE b"]);
    let err = execute(&db, &mut store, &[a, b], &CancelToken::new(), false).await.expect_err("order");
    assert!(matches!(err, AppError::Config { .. }));
}

#[tokio::test]
async fn status_reports_each_state() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let done = migration("20240101000000", &["CREATE DATABASE a"]);
    let partial = migration("20240102000000", &["CREATE DATABASE b", "CREATE DATABASE c"]);
    let pending = migration("20240103000000", &["CREATE DATABASE d"]);

    execute(&db, &mut store, &[done.clone()], &CancelToken::new(), false).await.expect("apply done");
    db.fail_on_exec(3, "nope");
    let _ = execute(&db, &mut store, &[done.clone(), partial.clone()], &CancelToken::new(), false)
        .await
        .expect_err("partial");

    let states = status(&mut store, &[done.clone(), partial.clone(), pending.clone()]).await.expect("status");
    assert_eq!(states[0].1, VersionState::Complete);
    assert!(matches!(states[1].1, VersionState::Partial { applied: 1, total: 2, .. }));
    assert_eq!(states[2].1, VersionState::Pending);

    // Drift: edit an applied statement of the completed migration.
    let drifted = migration("20240101000000", &["CREATE DATABASE a_edited"]);
    let states = status(&mut store, &[drifted]).await.expect("status");
    assert!(matches!(states[0].1, VersionState::HashDrift { index: 0 }));
}

#[tokio::test]
async fn rehash_updates_hashes_for_completed_versions_only() {
    let db = ScriptedDb::new();
    let mut store = MemoryRevisions::default();
    let m = migration("20240101000000", &["CREATE DATABASE a"]);
    execute(&db, &mut store, &[m], &CancelToken::new(), false).await.expect("apply");

    // Cosmetic edit: same statement, new comment changes nothing, but a
    // real edit produces a new hash that rehash adopts.
    let edited = migration("20240101000000", &["CREATE DATABASE a_edited"]);
    rehash(&mut store, &edited).await.expect("rehash");
    assert_eq!(store.rows.get("20240101000000").expect("row").statement_hashes, edited.hashes);

    let partial = migration("20240105000000", &["CREATE DATABASE x", "CREATE DATABASE y"]);
    db.fail_on_exec(3, "stop");
    let _ = execute(&db, &mut store, &[partial.clone()], &CancelToken::new(), false).await.expect_err("partial");
    assert!(rehash(&mut store, &partial).await.is_err(), "rehash refuses unfinished migrations");
}

#[test]
fn load_migrations_orders_and_validates_names() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::write(tmp.path().join("20240102000000_add_users.sql"), "CREATE DATABASE u;").expect("write");
    std::fs::write(tmp.path().join("20240101000000.sql"), "CREATE DATABASE a;").expect("write");
    std::fs::write(tmp.path().join("notes.txt"), "not a migration").expect("write");
    let migrations = load_migrations(tmp.path()).expect("load");
    assert_eq!(migrations.len(), 2);
    assert_eq!(migrations[0].version, "20240101000000");
    assert_eq!(migrations[1].version, "20240102000000_add_users");

    std::fs::write(tmp.path().join("bogus_name.sql"), "CREATE DATABASE b;").expect("write");
    assert!(load_migrations(tmp.path()).is_err(), "non-version sql names are rejected");
}

#[test]
fn version_stamp_shape() {
    let stamp = version_stamp(
        chrono::NaiveDate::from_ymd_opt(2024, 3, 5)
            .expect("date")
            .and_hms_opt(7, 40, 9)
            .expect("time"),
    );
    assert_eq!(stamp, "20240305074009");
}

#[test]
fn plan_file_roundtrip_through_loader() {
    use crate::diff::{OpKind, Operation};
    let tmp = tempfile::tempdir().expect("tempdir");
    let ops = vec![
        Operation { kind: OpKind::CreateDatabase, name: "a".into(), statements: vec!["CREATE DATABASE a".into()] },
        Operation {
            kind: OpKind::CreateTable,
            name: "a.t".into(),
            statements: vec!["CREATE TABLE a.t\n(\n    id UInt64\n)\nENGINE = MergeTree()\nORDER BY id".into()],
        },
    ];
    let path = write_plan_file(tmp.path(), "20240101000000", "initial objects", &ops).expect("write");
    assert!(path.ends_with("20240101000000.sql"));
    let migrations = load_migrations(tmp.path()).expect("load");
    assert_eq!(migrations.len(), 1);
    assert_eq!(migrations[0].statements.len(), 2, "header comment is not a statement");
    assert!(write_plan_file(tmp.path(), "20240101000000", "dup", &ops).is_err(), "refuses to overwrite");
}
