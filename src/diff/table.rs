//! Table comparison: engine/cluster immutability gates, integration-engine
//! rebuilds, AS-dependency propagation and per-element ALTER decomposition
//! with column-rename inference and ADD COLUMN batching.

use std::collections::BTreeSet;

use crate::config::Config;
use crate::diff::{cluster_label, engine_label, rename, OpKind, Operation};
use crate::error::AppError;
use crate::ident::{Ident, QualifiedName};
use crate::parser::ast::*;
use crate::render;
use crate::schema::{constraints_of, indexes_of, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineFamily {
    MergeTree,
    Distributed,
    Memory,
    Integration,
    Other,
}

fn family(engine: Option<&Engine>, config: &Config) -> EngineFamily {
    let Some(engine) = engine else { return EngineFamily::Other };
    if config.is_integration_engine(&engine.name) {
        EngineFamily::Integration
    } else if engine.name.contains("MergeTree") {
        EngineFamily::MergeTree
    } else if engine.name == "Distributed" {
        EngineFamily::Distributed
    } else if engine.name == "Memory" {
        EngineFamily::Memory
    } else {
        EngineFamily::Other
    }
}

pub fn diff_tables(
    target: &Schema,
    current: &Schema,
    config: &Config,
    ops: &mut Vec<Operation>,
    errors: &mut Vec<AppError>,
) {
    let added: Vec<_> = target.tables.keys().filter(|k| !current.tables.contains_key(*k)).cloned().collect();
    let removed: Vec<_> = current.tables.keys().filter(|k| !target.tables.contains_key(*k)).cloned().collect();

    let renames = rename::match_renames(
        &removed,
        &added,
        |key| rename::table_signature(current.tables.get(key).expect("removed key")),
        |key| rename::table_signature(target.tables.get(key).expect("added key")),
    );
    let renamed_from: BTreeSet<_> = renames.iter().map(|(from, _)| from.clone()).collect();
    let renamed_to: BTreeSet<_> = renames.iter().map(|(_, to)| to.clone()).collect();

    for (from, to) in &renames {
        let stmt = RenameObjects {
            kind: ObjectKind::Table,
            renames: vec![(super::object_name(from), super::object_name(to))],
            cluster: target.tables.get(to).and_then(|t| t.cluster.clone()),
        };
        ops.push(Operation::single(
            OpKind::RenameTable,
            from.to_string(),
            render::render_kind(&StatementKind::Rename(stmt)),
        ));
    }

    for key in &added {
        if renamed_to.contains(key) {
            continue;
        }
        ops.push(create_table_op(target.tables.get(key).expect("added key"), key));
    }

    for key in &removed {
        if renamed_from.contains(key) {
            continue;
        }
        let c = current.tables.get(key).expect("removed key");
        ops.push(Operation::single(OpKind::DropTable, key.to_string(), drop_table_sql(c)));
    }

    for (key, t) in &target.tables {
        let Some(c) = current.tables.get(key) else { continue };
        diff_common_table(key, t, c, target, current, config, ops, errors);
    }
}

fn create_table_op(t: &CreateTable, key: &QualifiedName) -> Operation {
    let mut create = t.clone();
    create.or_replace = false;
    create.if_not_exists = false;
    Operation::single(OpKind::CreateTable, key.to_string(), render::render_kind(&StatementKind::CreateTable(create)))
}

fn drop_table_sql(t: &CreateTable) -> String {
    let drop = DropObject {
        kind: ObjectKind::Table,
        if_exists: false,
        name: t.name.clone(),
        cluster: t.cluster.clone(),
        sync: false,
    };
    render::render_kind(&StatementKind::Drop(drop))
}

#[allow(clippy::too_many_arguments)]
fn diff_common_table(
    key: &QualifiedName,
    t: &CreateTable,
    c: &CreateTable,
    target: &Schema,
    current: &Schema,
    config: &Config,
    ops: &mut Vec<Operation>,
    errors: &mut Vec<AppError>,
) {
    if t.cluster != c.cluster {
        errors.push(AppError::ClusterChange {
            name: key.to_string(),
            current: cluster_label(&c.cluster),
            target: cluster_label(&t.cluster),
        });
        return;
    }
    if super::engine_differs(&t.engine, &c.engine) {
        errors.push(AppError::EngineChange {
            name: key.to_string(),
            current: engine_label(&c.engine),
            target: engine_label(&t.engine),
        });
        return;
    }
    // The partition/sort/sample definition is part of the storage layout
    // and shares the engine's immutability.
    for (label, a, b) in [
        ("PARTITION BY", &t.partition_by, &c.partition_by),
        ("PRIMARY KEY", &t.primary_key, &c.primary_key),
        ("SAMPLE BY", &t.sample_by, &c.sample_by),
    ] {
        if let (Some(x), Some(y)) = (a, b) {
            if render::render_expr(x) != render::render_expr(y) {
                errors.push(AppError::EngineChange {
                    name: key.to_string(),
                    current: format!("{label} {}", render::render_expr(y)),
                    target: format!("{label} {}", render::render_expr(x)),
                });
                return;
            }
        }
    }

    let fam = family(t.engine.as_ref().or(c.engine.as_ref()), config);
    let t_cols: Vec<ColumnDef> = target.table_columns(t).into_iter().cloned().collect();
    let c_cols: Vec<ColumnDef> = current.table_columns(c).into_iter().cloned().collect();

    let structural_change = columns_differ(&t_cols, &c_cols)
        || indexes_differ(t, c)
        || constraints_differ(t, c)
        || clause_differs(&t.order_by, &c.order_by)
        || clause_differs(&t.ttl, &c.ttl)
        || settings_delta(&t.settings, &c.settings).is_some()
        || comment_delta(&t.comment, &c.comment).is_some();
    if !structural_change {
        return;
    }

    match fam {
        EngineFamily::Integration | EngineFamily::Distributed | EngineFamily::Memory => {
            // External or non-alterable storage: rebuild from the target
            // definition. The drop is part of the create, not a destroy.
            let mut op = create_table_op(t, key);
            op.statements.insert(0, drop_table_sql(c));
            ops.push(op);
        }
        EngineFamily::MergeTree | EngineFamily::Other => {
            let alter_ops = decompose(key, t, c, &t_cols, &c_cols, errors);
            if alter_ops.is_empty() {
                return;
            }
            let statements = render_alter_statements(t, &alter_ops);
            ops.push(Operation::new(OpKind::AlterTable, key.to_string(), statements));
        }
    }
}

fn clause_differs(a: &Option<Expr>, b: &Option<Expr>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => render::render_expr(x) != render::render_expr(y),
        (Some(_), None) => true,
        // A clause the corpus does not author is left alone.
        (None, _) => false,
    }
}

fn columns_differ(t_cols: &[ColumnDef], c_cols: &[ColumnDef]) -> bool {
    if t_cols.len() != c_cols.len() {
        return true;
    }
    t_cols.iter().zip(c_cols).any(|(a, b)| render::render_column(a) != render::render_column(b))
}

fn indexes_differ(t: &CreateTable, c: &CreateTable) -> bool {
    let ta: Vec<String> = indexes_of(t).iter().map(|i| render::render_index(i)).collect();
    let ca: Vec<String> = indexes_of(c).iter().map(|i| render::render_index(i)).collect();
    ta != ca
}

fn constraints_differ(t: &CreateTable, c: &CreateTable) -> bool {
    let ta: Vec<String> = constraints_of(t).iter().map(|x| render::render_constraint(x)).collect();
    let ca: Vec<String> = constraints_of(c).iter().map(|x| render::render_constraint(x)).collect();
    ta != ca
}

/// Settings present in the target that are new or changed on the live
/// side. Settings the corpus does not author are never reset.
fn settings_delta(t: &[Setting], c: &[Setting]) -> Option<Vec<Setting>> {
    let delta: Vec<Setting> = t
        .iter()
        .filter(|s| {
            c.iter()
                .find(|cs| cs.name == s.name)
                .map(|cs| render::render_expr(&cs.value) != render::render_expr(&s.value))
                .unwrap_or(true)
        })
        .cloned()
        .collect();
    if delta.is_empty() {
        None
    } else {
        Some(delta)
    }
}

fn comment_delta(t: &Option<String>, c: &Option<String>) -> Option<String> {
    match (t, c) {
        (Some(x), Some(y)) if x != y => Some(x.clone()),
        (Some(x), None) => Some(x.clone()),
        (None, Some(_)) => Some(String::new()),
        _ => None,
    }
}

/// Decompose a MergeTree-family change into ordered ALTER operations.
fn decompose(
    key: &QualifiedName,
    t: &CreateTable,
    c: &CreateTable,
    t_cols: &[ColumnDef],
    c_cols: &[ColumnDef],
    errors: &mut Vec<AppError>,
) -> Vec<AlterTableOp> {
    let mut out: Vec<AlterTableOp> = Vec::new();

    let t_names: BTreeSet<&str> = t_cols.iter().map(|col| col.name.as_str()).collect();
    let c_names: BTreeSet<&str> = c_cols.iter().map(|col| col.name.as_str()).collect();

    // Rename inference: exact match on everything but the name, and the
    // overall column count unchanged. Anything else is drop + add.
    let mut renamed_old: BTreeSet<String> = BTreeSet::new();
    let mut renamed_new: BTreeSet<String> = BTreeSet::new();
    if t_cols.len() == c_cols.len() {
        for old in c_cols.iter().filter(|col| !t_names.contains(col.name.as_str())) {
            let candidate = t_cols.iter().find(|new| {
                !c_names.contains(new.name.as_str())
                    && !renamed_new.contains(new.name.as_str())
                    && column_shape(old) == column_shape(new)
            });
            if let Some(new) = candidate {
                out.push(AlterTableOp::RenameColumn {
                    if_exists: false,
                    from: old.name.clone(),
                    to: new.name.clone(),
                });
                renamed_old.insert(old.name.text.clone());
                renamed_new.insert(new.name.text.clone());
            }
        }
    }

    // Drops before adds so re-typed replacements never collide.
    for old in c_cols {
        if !t_names.contains(old.name.as_str()) && !renamed_old.contains(&old.name.text) {
            out.push(AlterTableOp::DropColumn { if_exists: true, name: old.name.clone() });
        }
    }

    let mut prev: Option<Ident> = None;
    for new in t_cols {
        let position = match &prev {
            None => Some(ColumnPosition::First),
            Some(p) => Some(ColumnPosition::After(p.clone())),
        };
        if renamed_new.contains(&new.name.text) {
            // Fully handled by the RenameColumn op: a rename requires an
            // exact shape match, so there is nothing left to modify.
        } else if !c_names.contains(new.name.as_str()) {
            out.push(AlterTableOp::AddColumn { if_not_exists: true, column: new.clone(), position });
        } else if let Some(old) = c_cols.iter().find(|o| o.name == new.name) {
            emit_column_modification(key, new, old, &mut out, errors);
        }
        prev = Some(new.name.clone());
    }

    // Indexes and constraints: modify = drop + add.
    let t_idx = indexes_of(t);
    let c_idx = indexes_of(c);
    for old in &c_idx {
        match t_idx.iter().find(|n| n.name == old.name) {
            None => out.push(AlterTableOp::DropIndex { if_exists: true, name: old.name.clone() }),
            Some(new) if render::render_index(new) != render::render_index(old) => {
                out.push(AlterTableOp::DropIndex { if_exists: true, name: old.name.clone() });
            }
            Some(_) => {}
        }
    }
    for new in &t_idx {
        let changed = c_idx
            .iter()
            .find(|o| o.name == new.name)
            .map(|o| render::render_index(o) != render::render_index(new))
            .unwrap_or(true);
        if changed {
            out.push(AlterTableOp::AddIndex { if_not_exists: true, index: (*new).clone() });
        }
    }

    let t_cons = constraints_of(t);
    let c_cons = constraints_of(c);
    for old in &c_cons {
        match t_cons.iter().find(|n| n.name == old.name) {
            None => out.push(AlterTableOp::DropConstraint { if_exists: true, name: old.name.clone() }),
            Some(new) if render::render_constraint(new) != render::render_constraint(old) => {
                out.push(AlterTableOp::DropConstraint { if_exists: true, name: old.name.clone() });
            }
            Some(_) => {}
        }
    }
    for new in &t_cons {
        let changed = c_cons
            .iter()
            .find(|o| o.name == new.name)
            .map(|o| render::render_constraint(o) != render::render_constraint(new))
            .unwrap_or(true);
        if changed {
            out.push(AlterTableOp::AddConstraint { if_not_exists: true, constraint: (*new).clone() });
        }
    }

    if clause_differs(&t.order_by, &c.order_by) {
        if let Some(x) = &t.order_by {
            out.push(AlterTableOp::ModifyOrderBy(x.clone()));
        }
    }
    if clause_differs(&t.ttl, &c.ttl) {
        if let Some(x) = &t.ttl {
            out.push(AlterTableOp::ModifyTtl(x.clone()));
        }
    }
    if let Some(delta) = settings_delta(&t.settings, &c.settings) {
        out.push(AlterTableOp::ModifySettings(delta));
    }
    if let Some(comment) = comment_delta(&t.comment, &c.comment) {
        out.push(AlterTableOp::ModifyComment(comment));
    }

    out
}

fn emit_column_modification(
    key: &QualifiedName,
    new: &ColumnDef,
    old: &ColumnDef,
    out: &mut Vec<AlterTableOp>,
    errors: &mut Vec<AppError>,
) {
    if render::render_column(new) == render::render_column(old) {
        return;
    }
    if let (Some(a), Some(b)) = (&new.data_type, &old.data_type) {
        if !types_compatible(a, b) {
            errors.push(AppError::IncompatibleTypeChange {
                name: key.to_string(),
                column: new.name.text.clone(),
                current: render::render_data_type(b),
                target: render::render_data_type(a),
            });
            return;
        }
    }
    let comment_only = {
        let mut stripped_new = new.clone();
        let mut stripped_old = old.clone();
        stripped_new.comment = None;
        stripped_old.comment = None;
        render::render_column(&stripped_new) == render::render_column(&stripped_old)
    };
    if comment_only {
        out.push(AlterTableOp::CommentColumn {
            if_exists: false,
            name: new.name.clone(),
            comment: new.comment.clone().unwrap_or_default(),
        });
    } else {
        out.push(AlterTableOp::ModifyColumn { if_exists: false, column: new.clone() });
    }
}

/// Position-agnostic column identity: type, default, codec, TTL, comment.
fn column_shape(c: &ColumnDef) -> String {
    let mut anon = c.clone();
    anon.name = Ident::plain("__col__");
    render::render_column(&anon)
}

#[derive(Debug, PartialEq, Eq)]
enum TypeCategory {
    Int,
    UInt,
    Float,
    Decimal,
    Str,
    Date,
    DateTime,
    Uuid,
    Bool,
    Enum,
    Ip,
    Array,
    Map,
    Tuple,
    Nested,
    Other(String),
}

fn category(t: &DataType) -> TypeCategory {
    match t.unwrapped() {
        DataType::Array(_) => TypeCategory::Array,
        DataType::Map(_, _) => TypeCategory::Map,
        DataType::Tuple(_) => TypeCategory::Tuple,
        DataType::Nested(_) => TypeCategory::Nested,
        DataType::Simple { name, .. } => {
            let n = name.as_str();
            if n.starts_with("UInt") {
                TypeCategory::UInt
            } else if n.starts_with("Int") {
                TypeCategory::Int
            } else if n.starts_with("Float") {
                TypeCategory::Float
            } else if n.starts_with("Decimal") {
                TypeCategory::Decimal
            } else if n == "String" || n.starts_with("FixedString") {
                TypeCategory::Str
            } else if n == "Date" || n == "Date32" {
                TypeCategory::Date
            } else if n.starts_with("DateTime") {
                TypeCategory::DateTime
            } else if n == "UUID" {
                TypeCategory::Uuid
            } else if n == "Bool" {
                TypeCategory::Bool
            } else if n.starts_with("Enum") {
                TypeCategory::Enum
            } else if n.starts_with("IPv") {
                TypeCategory::Ip
            } else {
                TypeCategory::Other(n.to_string())
            }
        }
        other => TypeCategory::Other(render::render_data_type(other)),
    }
}

/// Widening and same-category conversions are alterable in place; a
/// category switch would destroy data and is refused at plan time.
fn types_compatible(a: &DataType, b: &DataType) -> bool {
    let (ca, cb) = (category(a), category(b));
    if ca == cb {
        return true;
    }
    // Numeric cross-family changes are representable.
    matches!(
        (&ca, &cb),
        (TypeCategory::Int, TypeCategory::UInt)
            | (TypeCategory::UInt, TypeCategory::Int)
            | (TypeCategory::Float, TypeCategory::Int)
            | (TypeCategory::Float, TypeCategory::UInt)
            | (TypeCategory::Int, TypeCategory::Float)
            | (TypeCategory::UInt, TypeCategory::Float)
            | (TypeCategory::Enum, TypeCategory::Str)
            | (TypeCategory::Str, TypeCategory::Enum)
    )
}

/// Render the op list into statements, batching consecutive ADD COLUMN
/// runs into one ALTER.
fn render_alter_statements(t: &CreateTable, ops: &[AlterTableOp]) -> Vec<String> {
    let mut statements = Vec::new();
    let mut run: Vec<AlterTableOp> = Vec::new();
    let flush = |run: &mut Vec<AlterTableOp>, statements: &mut Vec<String>| {
        if run.is_empty() {
            return;
        }
        let alter = AlterTable {
            if_exists: false,
            name: t.name.clone(),
            cluster: t.cluster.clone(),
            ops: std::mem::take(run),
        };
        statements.push(render::render_kind(&StatementKind::AlterTable(alter)));
    };
    for op in ops {
        let batchable = matches!(op, AlterTableOp::AddColumn { .. });
        if !batchable {
            flush(&mut run, &mut statements);
            run.push(op.clone());
            flush(&mut run, &mut statements);
        } else {
            run.push(op.clone());
        }
    }
    flush(&mut run, &mut statements);
    statements
}
