use crate::config::Config;
use crate::diff::{plan, OpKind, Operation};
use crate::error::AppError;
use crate::schema::Schema;

fn schema(sql: &str) -> Schema {
    let stmts = crate::parser::parse(sql).unwrap_or_else(|e| panic!("fixture parse failed: {e}"));
    Schema::build(stmts.into_iter().enumerate().map(|(i, s)| (s, format!("fixture#{i}")))).expect("schema build")
}

fn plan_ok(target: &str, current: &str) -> Vec<Operation> {
    plan(&schema(target), &schema(current), &Config::default()).expect("plan")
}

fn plan_err(target: &str, current: &str) -> AppError {
    plan(&schema(target), &schema(current), &Config::default()).expect_err("plan must fail")
}

fn kinds(ops: &[Operation]) -> Vec<OpKind> {
    ops.iter().map(|o| o.kind).collect()
}

#[test]
fn s1_fresh_creation_orders_database_before_table() {
    let ops = plan_ok(
        "CREATE DATABASE a; CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;",
        "",
    );
    assert_eq!(kinds(&ops), vec![OpKind::CreateDatabase, OpKind::CreateTable]);
    assert!(ops[0].statements[0].starts_with("CREATE DATABASE a"));
    assert!(ops[1].statements[0].contains("CREATE TABLE a.t"));
}

#[test]
fn s2_add_column_is_a_single_alter() {
    let ops = plan_ok(
        "CREATE TABLE a.t (id UInt64, name String) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;",
    );
    assert_eq!(kinds(&ops), vec![OpKind::AlterTable]);
    assert_eq!(ops[0].statements.len(), 1);
    let sql = &ops[0].statements[0];
    assert!(sql.contains("ADD COLUMN"), "{sql}");
    assert!(sql.contains("name String"), "{sql}");
}

#[test]
fn s3_rename_table_produces_exactly_one_operation() {
    let ops = plan_ok(
        "CREATE TABLE a.new (id UInt64) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.old (id UInt64) ENGINE = MergeTree() ORDER BY id;",
    );
    assert_eq!(kinds(&ops), vec![OpKind::RenameTable], "no drop, no create");
    assert!(ops[0].statements[0].contains("RENAME TABLE a.old TO a.new"));
}

#[test]
fn s4_engine_change_is_a_validation_error() {
    let err = plan_err(
        "CREATE TABLE a.t (id UInt64) ENGINE = ReplacingMergeTree() ORDER BY id;",
        "CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;",
    );
    match err {
        AppError::Validation { errors } => {
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0], AppError::EngineChange { .. }));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn s5_dictionary_modification_is_create_or_replace() {
    let ops = plan_ok(
        "CREATE DICTIONARY a.d (id UInt64) PRIMARY KEY id SOURCE(CLICKHOUSE(TABLE 't' DB 'a')) LAYOUT(FLAT()) LIFETIME(60);",
        "CREATE DICTIONARY a.d (id UInt64) PRIMARY KEY id SOURCE(CLICKHOUSE(TABLE 't' DB 'a')) LAYOUT(HASHED()) LIFETIME(60);",
    );
    assert_eq!(kinds(&ops), vec![OpKind::ReplaceDictionary]);
    assert!(ops[0].statements[0].starts_with("CREATE OR REPLACE DICTIONARY"), "{}", ops[0].statements[0]);
    assert!(ops[0].statements[0].contains("LAYOUT(FLAT())"));
}

#[test]
fn planner_is_idempotent() {
    let sql = "CREATE DATABASE a;\
        CREATE TABLE a.t (id UInt64, v String DEFAULT 'x') ENGINE = MergeTree() ORDER BY id;\
        CREATE DICTIONARY a.d (id UInt64) PRIMARY KEY id SOURCE(CLICKHOUSE(TABLE 't' DB 'a')) LAYOUT(FLAT());\
        CREATE VIEW a.v AS SELECT id FROM a.t;\
        CREATE ROLE r; GRANT SELECT ON a.* TO r;\
        CREATE FUNCTION f AS x -> x + 1;\
        CREATE USER u IDENTIFIED BY 'p';";
    let ops = plan_ok(sql, sql);
    assert!(ops.is_empty(), "plan(x, x) must be empty, got {ops:?}");
}

#[test]
fn ordering_follows_the_two_phases() {
    let ops = plan_ok(
        "CREATE ROLE r;\
         CREATE FUNCTION f AS x -> x;\
         CREATE DATABASE a;\
         CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;\
         CREATE DICTIONARY a.d (id UInt64) PRIMARY KEY id SOURCE(CLICKHOUSE(TABLE 't' DB 'a')) LAYOUT(FLAT());\
         CREATE VIEW a.v AS SELECT id FROM a.t;",
        "CREATE DATABASE gone;\
         CREATE TABLE gone.t (id UInt64) ENGINE = MergeTree() ORDER BY id;\
         CREATE VIEW gone.v AS SELECT id FROM gone.t;",
    );
    let ks = kinds(&ops);
    let pos = |k: OpKind| ks.iter().position(|x| *x == k).unwrap_or_else(|| panic!("{k:?} missing from {ks:?}"));
    assert!(pos(OpKind::CreateRole) < pos(OpKind::CreateFunction));
    assert!(pos(OpKind::CreateFunction) < pos(OpKind::CreateDatabase));
    assert!(pos(OpKind::CreateDatabase) < pos(OpKind::CreateTable));
    assert!(pos(OpKind::CreateTable) < pos(OpKind::CreateDictionary));
    assert!(pos(OpKind::CreateDictionary) < pos(OpKind::CreateView));
    assert!(pos(OpKind::CreateView) < pos(OpKind::DropView), "forward phase precedes reverse phase");
    assert!(pos(OpKind::DropView) < pos(OpKind::DropTable));
    assert!(pos(OpKind::DropTable) < pos(OpKind::DropDatabase));
}

#[test]
fn as_dependency_orders_table_creates() {
    let ops = plan_ok(
        "CREATE DATABASE a;\
         CREATE TABLE a.aa_dist AS a.base ENGINE = Distributed(main, a, base);\
         CREATE TABLE a.base (id UInt64) ENGINE = MergeTree() ORDER BY id;",
        "",
    );
    let creates: Vec<&str> = ops
        .iter()
        .filter(|o| o.kind == OpKind::CreateTable)
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(creates, vec!["a.base", "a.aa_dist"], "source precedes dependent despite name order");
}

#[test]
fn view_on_view_orders_creates_and_drops() {
    let ops = plan_ok(
        "CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;\
         CREATE VIEW a.inner_v AS SELECT id FROM a.t;\
         CREATE VIEW a.a_outer AS SELECT id FROM a.inner_v;",
        "CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;\
         CREATE VIEW a.old_inner AS SELECT id FROM a.t;\
         CREATE VIEW a.an_old_outer AS SELECT id FROM a.old_inner;",
    );
    let creates: Vec<&str> =
        ops.iter().filter(|o| o.kind == OpKind::CreateView).map(|o| o.name.as_str()).collect();
    assert_eq!(creates, vec!["a.inner_v", "a.a_outer"], "referenced view is created first");
    let drops: Vec<&str> = ops.iter().filter(|o| o.kind == OpKind::DropView).map(|o| o.name.as_str()).collect();
    assert_eq!(drops, vec!["a.an_old_outer", "a.old_inner"], "dependent view is dropped first");
}

#[test]
fn rename_is_never_co_emitted_with_drop_create() {
    let ops = plan_ok(
        "CREATE TABLE a.renamed (id UInt64, v String) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.orig (id UInt64, v String) ENGINE = MergeTree() ORDER BY id;",
    );
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OpKind::RenameTable);
    assert!(!kinds(&ops).contains(&OpKind::DropTable));
    assert!(!kinds(&ops).contains(&OpKind::CreateTable));
}

#[test]
fn structural_change_prevents_rename_detection() {
    let ops = plan_ok(
        "CREATE TABLE a.new (id UInt64, extra String) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.old (id UInt64) ENGINE = MergeTree() ORDER BY id;",
    );
    let ks = kinds(&ops);
    assert!(ks.contains(&OpKind::CreateTable));
    assert!(ks.contains(&OpKind::DropTable));
    assert!(!ks.contains(&OpKind::RenameTable), "no fuzzy renames");
}

#[test]
fn column_rename_inferred_on_exact_shape_match() {
    let ops = plan_ok(
        "CREATE TABLE a.t (id UInt64, renamed_at DateTime) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.t (id UInt64, created_at DateTime) ENGINE = MergeTree() ORDER BY id;",
    );
    assert_eq!(kinds(&ops), vec![OpKind::AlterTable]);
    let sql = ops[0].statements.join("; ");
    assert!(sql.contains("RENAME COLUMN created_at TO renamed_at"), "{sql}");
    assert!(!sql.contains("DROP COLUMN"), "{sql}");
}

#[test]
fn column_type_change_is_modify_not_rename() {
    let ops = plan_ok(
        "CREATE TABLE a.t (id UInt64, v UInt64) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.t (id UInt64, v UInt32) ENGINE = MergeTree() ORDER BY id;",
    );
    let sql = ops[0].statements.join("; ");
    assert!(sql.contains("MODIFY COLUMN v UInt64"), "{sql}");
}

#[test]
fn incompatible_type_change_is_gated() {
    let err = plan_err(
        "CREATE TABLE a.t (id UInt64, v UInt64) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.t (id UInt64, v String) ENGINE = MergeTree() ORDER BY id;",
    );
    match err {
        AppError::Validation { errors } => {
            assert!(matches!(errors[0], AppError::IncompatibleTypeChange { .. }), "{errors:?}");
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn comment_only_column_change_uses_comment_column() {
    let ops = plan_ok(
        "CREATE TABLE a.t (id UInt64 COMMENT 'key') ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;",
    );
    let sql = ops[0].statements.join("; ");
    assert!(sql.contains("COMMENT COLUMN id 'key'"), "{sql}");
    assert!(!sql.contains("MODIFY COLUMN"), "{sql}");
}

#[test]
fn adjacent_add_columns_are_batched() {
    let ops = plan_ok(
        "CREATE TABLE a.t (id UInt64, b String, c String, d String) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;",
    );
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].statements.len(), 1, "one batched ALTER statement");
    let sql = &ops[0].statements[0];
    assert_eq!(sql.matches("ADD COLUMN").count(), 3, "{sql}");
}

#[test]
fn integration_engine_table_is_rebuilt() {
    let ops = plan_ok(
        "CREATE TABLE a.queue (id UInt64, extra String) ENGINE = Kafka('k:9092', 'topic', 'group', 'JSONEachRow');",
        "CREATE TABLE a.queue (id UInt64) ENGINE = Kafka('k:9092', 'topic', 'group', 'JSONEachRow');",
    );
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OpKind::CreateTable);
    assert_eq!(ops[0].statements.len(), 2, "drop then create");
    assert!(ops[0].statements[0].starts_with("DROP TABLE"));
    assert!(ops[0].statements[1].starts_with("CREATE TABLE"));
}

#[test]
fn distributed_dependent_rebuilds_on_source_column_change() {
    let ops = plan_ok(
        "CREATE TABLE a.base (id UInt64, v String) ENGINE = MergeTree() ORDER BY id;\
         CREATE TABLE a.dist AS a.base ENGINE = Distributed(main, a, base);",
        "CREATE TABLE a.base (id UInt64) ENGINE = MergeTree() ORDER BY id;\
         CREATE TABLE a.dist (id UInt64) ENGINE = Distributed(main, a, base);",
    );
    let alter = ops.iter().find(|o| o.kind == OpKind::AlterTable).expect("alter on base");
    assert_eq!(alter.name, "a.base");
    let rebuild = ops.iter().find(|o| o.kind == OpKind::CreateTable).expect("rebuild of dist");
    assert_eq!(rebuild.name, "a.dist");
    assert!(rebuild.statements[0].starts_with("DROP TABLE"));
}

#[test]
fn mergetree_dependent_alters_on_source_column_change() {
    let ops = plan_ok(
        "CREATE TABLE a.base (id UInt64, v String) ENGINE = MergeTree() ORDER BY id;\
         CREATE TABLE a.copy AS a.base ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.base (id UInt64) ENGINE = MergeTree() ORDER BY id;\
         CREATE TABLE a.copy (id UInt64) ENGINE = MergeTree() ORDER BY id;",
    );
    let alters: Vec<&str> = ops.iter().filter(|o| o.kind == OpKind::AlterTable).map(|o| o.name.as_str()).collect();
    assert!(alters.contains(&"a.base"));
    assert!(alters.contains(&"a.copy"), "propagation reaches the MergeTree dependent: {ops:?}");
}

#[test]
fn database_comment_change_is_alter() {
    let ops = plan_ok("CREATE DATABASE a COMMENT 'new';", "CREATE DATABASE a COMMENT 'old';");
    assert_eq!(kinds(&ops), vec![OpKind::AlterDatabase]);
    assert!(ops[0].statements[0].contains("MODIFY COMMENT 'new'"));
}

#[test]
fn database_engine_change_is_error() {
    let err = plan_err("CREATE DATABASE a ENGINE = Replicated('/a', 's', 'r');", "CREATE DATABASE a ENGINE = Atomic;");
    assert!(matches!(err, AppError::Validation { .. }));
}

#[test]
fn system_object_modification_is_gated() {
    let err = plan_err("CREATE TABLE system.evil (id UInt64) ENGINE = Memory;", "");
    match err {
        AppError::Validation { errors } => {
            assert!(matches!(errors[0], AppError::SystemObjectModification { .. }));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn no_partial_plan_on_validation_failure() {
    // A valid create rides along with an engine change; the batch must
    // swallow the whole plan.
    let result = plan(
        &schema(
            "CREATE TABLE a.t (id UInt64) ENGINE = ReplacingMergeTree() ORDER BY id;\
             CREATE TABLE a.fresh (id UInt64) ENGINE = MergeTree() ORDER BY id;",
        ),
        &schema("CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;"),
        &Config::default(),
    );
    assert!(result.is_err(), "no plan may be emitted alongside errors");
}

#[test]
fn regular_view_change_is_create_or_replace() {
    let ops = plan_ok(
        "CREATE VIEW a.v AS SELECT id, name FROM a.t;",
        "CREATE VIEW a.v AS SELECT id FROM a.t;",
    );
    assert_eq!(kinds(&ops), vec![OpKind::ReplaceView]);
    assert_eq!(ops[0].statements.len(), 1);
    assert!(ops[0].statements[0].starts_with("CREATE OR REPLACE VIEW"));
}

#[test]
fn materialized_view_change_is_drop_then_create() {
    let ops = plan_ok(
        "CREATE MATERIALIZED VIEW a.mv TO a.agg AS SELECT id, count(*) AS n FROM a.t GROUP BY id;",
        "CREATE MATERIALIZED VIEW a.mv TO a.agg AS SELECT id, sum(1) AS n FROM a.t GROUP BY id;",
    );
    assert_eq!(kinds(&ops), vec![OpKind::ReplaceView]);
    assert_eq!(ops[0].statements.len(), 2);
    assert!(ops[0].statements[0].starts_with("DROP VIEW"));
    assert!(ops[0].statements[1].starts_with("CREATE MATERIALIZED VIEW"));
}

#[test]
fn named_collection_delta_uses_set_and_delete() {
    let ops = plan_ok(
        "CREATE NAMED COLLECTION nc AS a = '1', b = '2';",
        "CREATE NAMED COLLECTION nc AS a = '0', c = '3';",
    );
    assert_eq!(kinds(&ops), vec![OpKind::AlterNamedCollection]);
    let sql = &ops[0].statements[0];
    assert!(sql.contains("SET a = '1', b = '2'"), "{sql}");
    assert!(sql.contains("DELETE c"), "{sql}");
}

#[test]
fn role_rename_detected_by_matching_settings_and_grants() {
    let ops = plan_ok(
        "CREATE ROLE analyst SETTINGS max_memory_usage = 1000; GRANT SELECT ON a.* TO analyst;",
        "CREATE ROLE analyst_old SETTINGS max_memory_usage = 1000; GRANT SELECT ON a.* TO analyst_old;",
    );
    let alter = ops.iter().find(|o| o.kind == OpKind::AlterRole).expect("rename op");
    assert!(alter.statements[0].contains("RENAME TO analyst"), "{}", alter.statements[0]);
    assert!(!kinds(&ops).contains(&OpKind::DropRole));
    // The rename also reconciles the grant texts.
    assert!(kinds(&ops).contains(&OpKind::Grant), "grants re-addressed to the new name");
}

#[test]
fn role_settings_delta_is_alter() {
    let ops = plan_ok(
        "CREATE ROLE r SETTINGS max_threads = 8;",
        "CREATE ROLE r SETTINGS max_threads = 4;",
    );
    assert_eq!(kinds(&ops), vec![OpKind::AlterRole]);
    assert!(ops[0].statements[0].contains("SETTINGS max_threads = 8"));
}

#[test]
fn grant_and_revoke_deltas() {
    let ops = plan_ok(
        "CREATE ROLE r; GRANT SELECT ON a.* TO r;",
        "CREATE ROLE r; GRANT INSERT ON a.* TO r;",
    );
    let ks = kinds(&ops);
    assert!(ks.contains(&OpKind::Grant));
    assert!(ks.contains(&OpKind::Revoke));
    let revoke = ops.iter().find(|o| o.kind == OpKind::Revoke).expect("revoke");
    assert!(revoke.statements[0].starts_with("REVOKE INSERT"), "{}", revoke.statements[0]);
}

#[test]
fn function_change_is_drop_then_create() {
    let ops = plan_ok("CREATE FUNCTION f AS x -> x * 2;", "CREATE FUNCTION f AS x -> x + 1;");
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].statements.len(), 2);
    assert!(ops[0].statements[0].starts_with("DROP FUNCTION"));
    assert!(ops[0].statements[1].starts_with("CREATE FUNCTION"));
}

#[test]
fn user_single_field_delta_is_alter() {
    let ops = plan_ok(
        "CREATE USER u IDENTIFIED BY 'p' DEFAULT DATABASE analytics;",
        "CREATE USER u IDENTIFIED BY 'p' DEFAULT DATABASE old_db;",
    );
    assert_eq!(kinds(&ops), vec![OpKind::AlterUser]);
    assert!(ops[0].statements[0].contains("DEFAULT DATABASE analytics"));
}

#[test]
fn user_wholesale_rewrite_falls_back_to_drop_create() {
    let ops = plan_ok(
        "CREATE USER u IDENTIFIED WITH ldap SERVER 'corp' HOST IP '10.0.0.0/8' VALID UNTIL '2030-01-01' DEFAULT ROLE ALL DEFAULT DATABASE d2;",
        "CREATE USER u IDENTIFIED BY 'p' HOST ANY DEFAULT ROLE NONE DEFAULT DATABASE d1;",
    );
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].statements.len(), 2, "drop + create: {:?}", ops[0].statements);
    assert!(ops[0].statements[0].starts_with("DROP USER"));
}

#[test]
fn bare_and_empty_paren_engines_are_the_same() {
    // Extraction emits `ENGINE = MergeTree`, corpora write `MergeTree()`.
    let ops = plan_ok(
        "CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.t (id UInt64) ENGINE = MergeTree ORDER BY id;",
    );
    assert!(ops.is_empty(), "{ops:?}");
    // Same equivalence during rename signature matching.
    let ops = plan_ok(
        "CREATE TABLE a.new (id UInt64) ENGINE = MergeTree() ORDER BY id;",
        "CREATE TABLE a.old (id UInt64) ENGINE = MergeTree ORDER BY id;",
    );
    assert_eq!(kinds(&ops), vec![OpKind::RenameTable]);
}

#[test]
fn every_operation_carries_name_and_sql() {
    let ops = plan_ok(
        "CREATE DATABASE a; CREATE TABLE a.t (id UInt64) ENGINE = MergeTree() ORDER BY id;",
        "",
    );
    for op in &ops {
        assert!(!op.name.is_empty());
        assert!(!op.statements.is_empty());
        assert!(op.statements.iter().all(|s| !s.trim().is_empty()));
    }
}
