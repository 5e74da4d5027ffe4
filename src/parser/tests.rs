use crate::error::AppError;
use crate::ident::Ident;
use crate::parser::ast::*;
use crate::parser::parse;

fn one(sql: &str) -> StatementKind {
    let stmts = parse(sql).unwrap_or_else(|e| panic!("parse of `{sql}` failed: {e}"));
    let mut kinds: Vec<StatementKind> = stmts
        .into_iter()
        .map(|s| s.kind)
        .filter(|k| !matches!(k, StatementKind::Comment(_)))
        .collect();
    assert_eq!(kinds.len(), 1, "expected one statement in `{sql}`");
    kinds.remove(0)
}

#[test]
fn create_database_full_clause_set() {
    match one("CREATE DATABASE IF NOT EXISTS analytics ON CLUSTER main ENGINE = Atomic COMMENT 'core db'") {
        StatementKind::CreateDatabase(db) => {
            assert!(db.if_not_exists);
            assert_eq!(db.name.as_str(), "analytics");
            assert_eq!(db.cluster.as_ref().map(|c| c.as_str()), Some("main"));
            assert_eq!(db.engine.as_ref().map(|e| e.name.as_str()), Some("Atomic"));
            assert_eq!(db.comment.as_deref(), Some("core db"));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn create_table_elements_and_clauses() {
    let sql = "CREATE TABLE a.events (\n\
         id UInt64,\n\
         user_id UInt64 DEFAULT 0,\n\
         payload String CODEC(ZSTD(5)),\n\
         INDEX idx_user user_id TYPE minmax GRANULARITY 4,\n\
         CONSTRAINT positive CHECK id > 0\n\
         ) ENGINE = ReplacingMergeTree(ver) ORDER BY (id, user_id) PARTITION BY toYYYYMM(ts) TTL ts + INTERVAL 90 DAY SETTINGS index_granularity = 8192";
    match one(sql) {
        StatementKind::CreateTable(t) => {
            assert_eq!(t.elements.len(), 5);
            assert!(matches!(t.elements[3], TableElement::Index(_)));
            assert!(matches!(t.elements[4], TableElement::Constraint(_)));
            let engine = t.engine.expect("engine");
            assert_eq!(engine.name, "ReplacingMergeTree");
            assert_eq!(engine.params.as_ref().map(|p| p.len()), Some(1));
            assert!(t.order_by.is_some());
            assert!(t.partition_by.is_some());
            assert!(t.ttl.is_some());
            assert_eq!(t.settings.len(), 1);
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn create_table_as_source_and_function() {
    match one("CREATE TABLE a.copy AS a.orig ENGINE = MergeTree() ORDER BY id") {
        StatementKind::CreateTable(t) => {
            assert!(t.elements.is_empty());
            match t.as_source.expect("source") {
                AsSource::Table(name) => assert_eq!(name.to_string(), "a.orig"),
                other => panic!("{other:?}"),
            }
        }
        other => panic!("{other:?}"),
    }
    match one("CREATE TABLE a.ext AS s3('https://x/y.parquet', 'Parquet')") {
        StatementKind::CreateTable(t) => {
            assert!(matches!(t.as_source, Some(AsSource::TableFunction { .. })));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn alter_table_operation_spread() {
    let sql = "ALTER TABLE a.t ON CLUSTER main \
        ADD COLUMN IF NOT EXISTS c UInt8 AFTER b, \
        DROP COLUMN IF EXISTS old, \
        MODIFY COLUMN v Nullable(String), \
        RENAME COLUMN x TO y, \
        COMMENT COLUMN v 'note', \
        ADD INDEX ix v TYPE set(100) GRANULARITY 2, \
        DROP INDEX ix2, \
        ADD CONSTRAINT chk CHECK v != '', \
        DROP CONSTRAINT chk2, \
        MODIFY ORDER BY (a, b), \
        MODIFY TTL ts + INTERVAL 1 DAY, \
        MODIFY SETTING ttl_only_drop_parts = 1, merge_with_ttl_timeout = 3600, \
        MODIFY COMMENT 'table note'";
    match one(sql) {
        StatementKind::AlterTable(a) => {
            assert_eq!(a.ops.len(), 13);
            assert!(matches!(a.ops[0], AlterTableOp::AddColumn { if_not_exists: true, position: Some(ColumnPosition::After(_)), .. }));
            assert!(matches!(a.ops[1], AlterTableOp::DropColumn { if_exists: true, .. }));
            match &a.ops[11] {
                AlterTableOp::ModifySettings(settings) => assert_eq!(settings.len(), 2),
                other => panic!("{other:?}"),
            }
            assert!(matches!(a.ops[12], AlterTableOp::ModifyComment(_)));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn rename_table_multi_pair() {
    match one("RENAME TABLE a.old TO a.new, b.x TO b.y ON CLUSTER main") {
        StatementKind::Rename(r) => {
            assert_eq!(r.kind, ObjectKind::Table);
            assert_eq!(r.renames.len(), 2);
            assert!(r.cluster.is_some());
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn drop_variants() {
    assert!(matches!(one("DROP TABLE IF EXISTS a.t SYNC"), StatementKind::Drop(DropObject { kind: ObjectKind::Table, if_exists: true, sync: true, .. })));
    assert!(matches!(one("DROP DICTIONARY a.d"), StatementKind::Drop(DropObject { kind: ObjectKind::Dictionary, .. })));
    assert!(matches!(one("DROP VIEW IF EXISTS a.v"), StatementKind::Drop(DropObject { kind: ObjectKind::View, .. })));
    assert!(matches!(one("DROP DATABASE IF EXISTS a"), StatementKind::DropDatabase(_)));
}

#[test]
fn attach_detach() {
    assert!(matches!(one("ATTACH TABLE a.t"), StatementKind::Attach(AttachObject { kind: ObjectKind::Table, .. })));
    match one("DETACH TABLE a.t PERMANENTLY SYNC") {
        StatementKind::Detach(d) => {
            assert!(d.permanently);
            assert!(d.sync);
        }
        other => panic!("{other:?}"),
    }
    assert!(matches!(one("DETACH DATABASE staging"), StatementKind::DetachDatabase(_)));
}

#[test]
fn dictionary_with_flags_and_layout() {
    let sql = "CREATE DICTIONARY a.geo (\
        id UInt64, \
        parent UInt64 DEFAULT 0 HIERARCHICAL, \
        code String INJECTIVE) \
        PRIMARY KEY id \
        SOURCE(CLICKHOUSE(HOST 'localhost' PORT 9000 TABLE 'geo_src' DB 'a' USER 'default')) \
        LAYOUT(CACHE(SIZE_IN_CELLS 100000)) \
        LIFETIME(300) \
        COMMENT 'geo lookup'";
    match one(sql) {
        StatementKind::CreateDictionary(d) => {
            assert_eq!(d.columns.len(), 3);
            assert!(d.columns[1].hierarchical);
            assert!(d.columns[2].injective);
            assert_eq!(d.primary_key.len(), 1);
            let source = d.source.expect("source");
            assert_eq!(source.name, "CLICKHOUSE");
            assert_eq!(source.params.len(), 5);
            let layout = d.layout.expect("layout");
            assert_eq!(layout.name, "CACHE");
            assert_eq!(layout.params.len(), 1);
            assert_eq!(d.lifetime, Some(Lifetime::Single(300)));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn named_collection_override_policies() {
    match one("CREATE NAMED COLLECTION kafka_prod AS broker = 'k1:9092' OVERRIDABLE, topic = 'events' NOT OVERRIDABLE, retries = 3") {
        StatementKind::CreateNamedCollection(c) => {
            assert_eq!(c.entries.len(), 3);
            assert_eq!(c.entries[0].overridable, Some(true));
            assert_eq!(c.entries[1].overridable, Some(false));
            assert_eq!(c.entries[2].overridable, None);
        }
        other => panic!("{other:?}"),
    }
    match one("ALTER NAMED COLLECTION kafka_prod SET topic = 'events_v2' DELETE retries, broker") {
        StatementKind::AlterNamedCollection(a) => {
            assert_eq!(a.set.len(), 1);
            assert_eq!(a.delete.len(), 2);
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn materialized_view_to_target() {
    match one("CREATE MATERIALIZED VIEW a.mv TO a.daily AS SELECT toDate(ts) AS d, count(*) AS n FROM a.events GROUP BY d") {
        StatementKind::CreateView(v) => {
            assert!(v.materialized);
            assert!(matches!(v.to, Some(AsSource::Table(_))));
            assert!(v.engine.is_none());
            assert_eq!(v.query.body.items.len(), 2);
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn materialized_view_inner_engine_populate() {
    match one("CREATE MATERIALIZED VIEW a.mv ENGINE = AggregatingMergeTree() ORDER BY k POPULATE AS SELECT k, maxState(v) AS m FROM a.t GROUP BY k") {
        StatementKind::CreateView(v) => {
            assert!(v.populate);
            assert_eq!(v.engine.as_ref().map(|e| e.name.as_str()), Some("AggregatingMergeTree"));
            assert!(v.order_by.is_some());
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn grant_and_revoke_shapes() {
    match one("GRANT SELECT(id, name), INSERT ON analytics.events TO reader, writer WITH GRANT OPTION") {
        StatementKind::Grant(g) => {
            match &g.kind {
                GrantKind::Privileges { privileges, target } => {
                    assert_eq!(privileges.len(), 2);
                    assert_eq!(privileges[0].columns.len(), 2);
                    assert_eq!(target.database.as_deref(), Some("analytics"));
                    assert_eq!(target.table.as_deref(), Some("events"));
                }
                other => panic!("{other:?}"),
            }
            assert_eq!(g.grantees.len(), 2);
            assert!(g.grant_option);
        }
        other => panic!("{other:?}"),
    }
    match one("GRANT reader TO alice WITH ADMIN OPTION WITH REPLACE OPTION") {
        StatementKind::Grant(g) => {
            assert!(matches!(g.kind, GrantKind::Roles { .. }));
            assert!(g.admin_option);
            assert!(g.replace_option);
        }
        other => panic!("{other:?}"),
    }
    match one("REVOKE GRANT OPTION FOR ALTER UPDATE ON *.* FROM admin") {
        StatementKind::Revoke(r) => {
            assert!(r.grant_option_for);
            match &r.kind {
                GrantKind::Privileges { privileges, target } => {
                    assert_eq!(privileges[0].name, "ALTER UPDATE");
                    assert!(target.database.is_none() && target.table.is_none());
                }
                other => panic!("{other:?}"),
            }
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn set_role_forms() {
    assert!(matches!(one("SET ROLE DEFAULT"), StatementKind::SetRole(SetRole { spec: RoleSpec::Default })));
    assert!(matches!(one("SET ROLE NONE"), StatementKind::SetRole(SetRole { spec: RoleSpec::None })));
    match one("SET DEFAULT ROLE r1, r2 TO alice") {
        StatementKind::SetDefaultRole(s) => {
            assert!(matches!(s.spec, RoleSpec::List(ref roles) if roles.len() == 2));
            assert_eq!(s.users.len(), 1);
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn create_function_lambda() {
    match one("CREATE FUNCTION add2 ON CLUSTER main AS (a, b) -> a + b") {
        StatementKind::CreateFunction(f) => {
            assert_eq!(f.name.as_str(), "add2");
            match f.body {
                Expr::Lambda { params, .. } => assert_eq!(params.len(), 2),
                other => panic!("{other:?}"),
            }
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn create_user_clauses() {
    let sql = "CREATE USER alice IDENTIFIED WITH sha256_hash BY 'AA' SALT 'BB' \
        HOST IP '10.0.0.0/8', LOCAL VALID UNTIL '2027-06-01' \
        DEFAULT ROLE ALL EXCEPT intern DEFAULT DATABASE analytics GRANTEES NONE";
    match one(sql) {
        StatementKind::CreateUser(u) => {
            assert!(matches!(u.identification, Some(Identification::Sha256Hash { .. })));
            assert_eq!(u.hosts.len(), 2);
            assert_eq!(u.valid_until.as_deref(), Some("2027-06-01"));
            assert!(matches!(u.default_roles, Some(RoleSpec::AllExcept(_))));
            assert_eq!(u.default_database.as_ref().map(|d| d.as_str()), Some("analytics"));
            let grantees = u.grantees.expect("grantees");
            assert!(matches!(grantees.grantees[0], GranteeItem::None));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn alter_user_rename_and_identity() {
    match one("ALTER USER IF EXISTS alice RENAME TO alice2 IDENTIFIED BY 'next'") {
        StatementKind::AlterUser(u) => {
            assert!(u.if_exists);
            assert_eq!(u.rename_to.as_ref().map(|r| r.as_str()), Some("alice2"));
            assert!(matches!(u.identification, Some(Identification::Sha256Password(_))));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn statements_split_on_semicolons() {
    let stmts = parse("CREATE DATABASE a; CREATE DATABASE b;\nCREATE DATABASE c").expect("parse");
    assert_eq!(stmts.len(), 3);
}

#[test]
fn comment_attachment_rules() {
    let sql = "-- leading one\n-- leading two\nCREATE DATABASE a;\n\n-- standalone\n\nCREATE DATABASE b;";
    let stmts = parse(sql).expect("parse");
    assert_eq!(stmts.len(), 3);
    assert_eq!(stmts[0].leading.len(), 2);
    assert!(matches!(stmts[1].kind, StatementKind::Comment(ref c) if c.text == "standalone"));
    assert!(stmts[2].leading.is_empty());
}

#[test]
fn trailing_comment_on_statement_line() {
    let stmts = parse("CREATE DATABASE a; -- made by infra\nCREATE DATABASE b;").expect("parse");
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[0].trailing.as_ref().map(|c| c.text.as_str()), Some("made by infra"));
    assert!(stmts[1].trailing.is_none());
}

#[test]
fn block_comment_standalone() {
    let stmts = parse("/* header\n   notes */\n\nCREATE DATABASE a;").expect("parse");
    assert_eq!(stmts.len(), 2);
    assert!(matches!(stmts[0].kind, StatementKind::Comment(ref c) if c.block));
}

#[test]
fn parse_error_carries_position_and_expectations() {
    let err = parse("CREATE TABEL a.t (id UInt64)").expect_err("should fail");
    match err {
        AppError::Parse { line, column, ref expected, ref found, .. } => {
            assert_eq!(line, 1);
            assert_eq!(column, 8);
            assert!(expected.iter().any(|e| e == "TABLE"), "expected set: {expected:?}");
            assert_eq!(found, "TABEL");
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn parse_error_on_second_line_of_file() {
    let err = parse("CREATE DATABASE a;\nDROP WIDGET x;").expect_err("should fail");
    match err {
        AppError::Parse { line, ref context, .. } => {
            assert_eq!(line, 2);
            assert!(context.contains("DROP WIDGET"));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn unknown_engine_parameter_tokens_are_preserved() {
    match one("CREATE TABLE a.t (id UInt64) ENGINE = Replicated('/p', SHARD 3) ORDER BY id") {
        StatementKind::CreateTable(t) => {
            let engine = t.engine.expect("engine");
            let params = engine.params.expect("params");
            assert!(matches!(params[1], EngineParam::Opaque(ref raw) if raw.contains("SHARD")), "{params:?}");
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn backtick_spelling_survives() {
    match one("CREATE TABLE `Db`.`My Table` (`order` UInt8) ENGINE = Memory") {
        StatementKind::CreateTable(t) => {
            assert_eq!(t.name.name, Ident::quoted("My Table"));
            match &t.elements[0] {
                TableElement::Column(c) => assert_eq!(c.name, Ident::quoted("order")),
                other => panic!("{other:?}"),
            }
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn keywords_are_case_insensitive() {
    assert!(matches!(one("create table a.t (id UInt64) engine = Memory"), StatementKind::CreateTable(_)));
    assert!(matches!(one("Drop Table a.t"), StatementKind::Drop(_)));
}

#[test]
fn parser_is_reentrant_across_inputs() {
    let first = parse("CREATE TABLE a.t (id UInt64) ENGINE = Memory;").expect("first");
    let second = parse("CREATE DATABASE b;").expect("second");
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    // Re-parsing the first input yields an identical tree.
    let again = parse("CREATE TABLE a.t (id UInt64) ENGINE = Memory;").expect("again");
    assert_eq!(first, again);
}

#[test]
fn select_statement_at_top_level() {
    assert!(matches!(one("SELECT id FROM a.t WHERE id IN (SELECT id FROM a.allow)"), StatementKind::Select(_)));
}

#[test]
fn column_attributes_in_server_order() {
    // SHOW CREATE emits COMMENT before CODEC; both orders must parse.
    match one("CREATE TABLE a.t (v String DEFAULT '' COMMENT 'v' CODEC(ZSTD(1))) ENGINE = Memory") {
        StatementKind::CreateTable(t) => match &t.elements[0] {
            TableElement::Column(c) => {
                assert_eq!(c.comment.as_deref(), Some("v"));
                assert_eq!(c.codecs.len(), 1);
            }
            other => panic!("{other:?}"),
        },
        other => panic!("{other:?}"),
    }
}
