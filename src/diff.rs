//! Semantic differ and migration planner. Consumes (target, current)
//! schemas and produces an ordered operation list, or a batch of
//! validation errors and no plan at all.

use std::collections::BTreeSet;

use tracing::warn;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::parser::ast::*;
use crate::render;
use crate::schema::Schema;

pub mod order;
pub mod rename;
pub mod table;
pub mod validate;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    CreateDatabase,
    AlterDatabase,
    DropDatabase,
    RenameDatabase,
    CreateTable,
    AlterTable,
    DropTable,
    RenameTable,
    CreateDictionary,
    ReplaceDictionary,
    DropDictionary,
    RenameDictionary,
    CreateNamedCollection,
    AlterNamedCollection,
    DropNamedCollection,
    CreateView,
    DropView,
    ReplaceView,
    CreateRole,
    AlterRole,
    DropRole,
    Grant,
    Revoke,
    CreateFunction,
    DropFunction,
    CreateUser,
    AlterUser,
    DropUser,
}

/// One planned operation: what it is, the qualified name it touches and
/// the statement(s) that realize it (a rebuild carries its paired drop).
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OpKind,
    pub name: String,
    pub statements: Vec<String>,
}

impl Operation {
    fn new(kind: OpKind, name: impl Into<String>, statements: Vec<String>) -> Self {
        Operation { kind, name: name.into(), statements }
    }

    fn single(kind: OpKind, name: impl Into<String>, sql: String) -> Self {
        Operation::new(kind, name, vec![sql])
    }
}

/// Compute the ordered migration plan that brings `current` into
/// congruence with `target`. Validation failures are collected and
/// returned as one batch; no partial plan is ever emitted alongside them.
pub fn plan(target: &Schema, current: &Schema, config: &Config) -> AppResult<Vec<Operation>> {
    let mut ops: Vec<Operation> = Vec::new();
    let mut errors: Vec<AppError> = Vec::new();

    validate::system_objects(target, &mut errors);
    validate::dictionary_sources(target);

    diff_databases(target, current, &mut ops, &mut errors);
    table::diff_tables(target, current, config, &mut ops, &mut errors);
    diff_dictionaries(target, current, &mut ops, &mut errors);
    diff_views(target, current, &mut ops, &mut errors);
    diff_collections(target, current, &mut ops);
    diff_roles(target, current, &mut ops);
    diff_grants(target, current, &mut ops);
    diff_functions(target, current, &mut ops);
    diff_users(target, current, &mut ops);

    if !errors.is_empty() {
        return Err(AppError::Validation { errors });
    }
    Ok(order::arrange(ops, target, current))
}

// ---------------------------------------------------------------------------
// Databases

fn diff_databases(target: &Schema, current: &Schema, ops: &mut Vec<Operation>, errors: &mut Vec<AppError>) {
    for (name, t) in &target.databases {
        match current.databases.get(name) {
            None => {
                let mut create = t.clone();
                create.or_replace = false;
                create.if_not_exists = false;
                ops.push(Operation::single(
                    OpKind::CreateDatabase,
                    name.clone(),
                    render::render_kind(&StatementKind::CreateDatabase(create)),
                ));
            }
            Some(c) => {
                if engine_differs(&t.engine, &c.engine) {
                    errors.push(AppError::EngineChange {
                        name: name.clone(),
                        current: engine_label(&c.engine),
                        target: engine_label(&t.engine),
                    });
                    continue;
                }
                if t.cluster != c.cluster {
                    errors.push(AppError::ClusterChange {
                        name: name.clone(),
                        current: cluster_label(&c.cluster),
                        target: cluster_label(&t.cluster),
                    });
                    continue;
                }
                if t.comment != c.comment {
                    let alter = AlterDatabase {
                        name: t.name.clone(),
                        cluster: t.cluster.clone(),
                        action: AlterDatabaseAction::ModifyComment(t.comment.clone().unwrap_or_default()),
                    };
                    ops.push(Operation::single(
                        OpKind::AlterDatabase,
                        name.clone(),
                        render::render_kind(&StatementKind::AlterDatabase(alter)),
                    ));
                }
            }
        }
    }
    for (name, c) in &current.databases {
        if !target.databases.contains_key(name) {
            let drop = DropDatabase { if_exists: false, name: c.name.clone(), cluster: c.cluster.clone(), sync: false };
            ops.push(Operation::single(
                OpKind::DropDatabase,
                name.clone(),
                render::render_kind(&StatementKind::DropDatabase(drop)),
            ));
        }
    }
}

/// `ENGINE = MergeTree` and `ENGINE = MergeTree()` are the same engine;
/// extraction emits the bare form, corpora tend to write the parens.
pub(crate) fn normalize_engine(e: &Option<Engine>) -> Option<Engine> {
    e.clone().map(|mut engine| {
        if matches!(engine.params.as_deref(), Some([])) {
            engine.params = None;
        }
        engine
    })
}

pub(crate) fn engine_differs(a: &Option<Engine>, b: &Option<Engine>) -> bool {
    match (normalize_engine(a), normalize_engine(b)) {
        (None, None) => false,
        // A missing engine clause on one side means the server default;
        // only an explicit conflicting pair is a change.
        (None, Some(_)) | (Some(_), None) => false,
        (Some(x), Some(y)) => render::render_engine(&x) != render::render_engine(&y),
    }
}

pub(crate) fn engine_label(e: &Option<Engine>) -> String {
    e.as_ref().map(render::render_engine).unwrap_or_else(|| "<default>".to_string())
}

pub(crate) fn cluster_label(c: &Option<crate::ident::Ident>) -> String {
    c.as_ref().map(|i| i.text.clone()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Dictionaries

fn diff_dictionaries(target: &Schema, current: &Schema, ops: &mut Vec<Operation>, errors: &mut Vec<AppError>) {
    let added: Vec<_> = target.dictionaries.keys().filter(|k| !current.dictionaries.contains_key(*k)).cloned().collect();
    let removed: Vec<_> = current.dictionaries.keys().filter(|k| !target.dictionaries.contains_key(*k)).cloned().collect();

    let renames = rename::match_renames(
        &removed,
        &added,
        |key| rename::dictionary_signature(current.dictionaries.get(key).expect("removed key")),
        |key| rename::dictionary_signature(target.dictionaries.get(key).expect("added key")),
    );
    let renamed_from: BTreeSet<_> = renames.iter().map(|(from, _)| from.clone()).collect();
    let renamed_to: BTreeSet<_> = renames.iter().map(|(_, to)| to.clone()).collect();

    for (from, to) in &renames {
        let stmt = RenameObjects {
            kind: ObjectKind::Dictionary,
            renames: vec![(object_name(from), object_name(to))],
            cluster: target.dictionaries.get(to).and_then(|d| d.cluster.clone()),
        };
        ops.push(Operation::single(
            OpKind::RenameDictionary,
            from.to_string(),
            render::render_kind(&StatementKind::Rename(stmt)),
        ));
    }

    for key in &added {
        if renamed_to.contains(key) {
            continue;
        }
        let mut create = target.dictionaries.get(key).expect("added key").clone();
        create.or_replace = false;
        create.if_not_exists = false;
        ops.push(Operation::single(
            OpKind::CreateDictionary,
            key.to_string(),
            render::render_kind(&StatementKind::CreateDictionary(create)),
        ));
    }

    for key in &removed {
        if renamed_from.contains(key) {
            continue;
        }
        let c = current.dictionaries.get(key).expect("removed key");
        let drop = DropObject {
            kind: ObjectKind::Dictionary,
            if_exists: false,
            name: c.name.clone(),
            cluster: c.cluster.clone(),
            sync: false,
        };
        ops.push(Operation::single(
            OpKind::DropDictionary,
            key.to_string(),
            render::render_kind(&StatementKind::Drop(drop)),
        ));
    }

    for (key, t) in &target.dictionaries {
        let Some(c) = current.dictionaries.get(key) else { continue };
        if dictionaries_equal(t, c) {
            continue;
        }
        if c.source.is_none() {
            // Dictionaries defined in server configuration files have no
            // SOURCE in their extracted DDL and cannot be replaced by DDL.
            errors.push(AppError::UnsupportedDictionaryAlter {
                name: key.to_string(),
                reason: "defined outside DDL (no SOURCE clause); manage it in server configuration".to_string(),
            });
            continue;
        }
        if t.cluster != c.cluster {
            errors.push(AppError::ClusterChange {
                name: key.to_string(),
                current: cluster_label(&c.cluster),
                target: cluster_label(&t.cluster),
            });
            continue;
        }
        // The server has no ALTER DICTIONARY; every change is a replace.
        let mut replace = t.clone();
        replace.or_replace = true;
        replace.if_not_exists = false;
        ops.push(Operation::single(
            OpKind::ReplaceDictionary,
            key.to_string(),
            render::render_kind(&StatementKind::CreateDictionary(replace)),
        ));
    }
}

fn dictionaries_equal(a: &CreateDictionary, b: &CreateDictionary) -> bool {
    rename::dictionary_signature(a) == rename::dictionary_signature(b) && a.name == b.name
}

fn object_name(key: &crate::ident::QualifiedName) -> crate::ident::ObjectName {
    crate::ident::ObjectName::qualified(crate::ident::Ident::plain(&key.database), crate::ident::Ident::plain(&key.name))
}

// ---------------------------------------------------------------------------
// Views

fn diff_views(target: &Schema, current: &Schema, ops: &mut Vec<Operation>, errors: &mut Vec<AppError>) {
    let added: Vec<_> = target.views.keys().filter(|k| !current.views.contains_key(*k)).cloned().collect();
    let removed: Vec<_> = current.views.keys().filter(|k| !target.views.contains_key(*k)).cloned().collect();

    let renames = rename::match_renames(
        &removed,
        &added,
        |key| rename::view_signature(current.views.get(key).expect("removed key")),
        |key| rename::view_signature(target.views.get(key).expect("added key")),
    );
    let renamed_from: BTreeSet<_> = renames.iter().map(|(from, _)| from.clone()).collect();
    let renamed_to: BTreeSet<_> = renames.iter().map(|(_, to)| to.clone()).collect();

    for (from, to) in &renames {
        // Views are renamed through RENAME TABLE.
        let stmt = RenameObjects {
            kind: ObjectKind::Table,
            renames: vec![(object_name(from), object_name(to))],
            cluster: target.views.get(to).and_then(|v| v.cluster.clone()),
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
        let mut create = target.views.get(key).expect("added key").clone();
        create.or_replace = false;
        create.if_not_exists = false;
        ops.push(Operation::single(
            OpKind::CreateView,
            key.to_string(),
            render::render_kind(&StatementKind::CreateView(create)),
        ));
    }

    for key in &removed {
        if renamed_from.contains(key) {
            continue;
        }
        let c = current.views.get(key).expect("removed key");
        ops.push(Operation::single(OpKind::DropView, key.to_string(), drop_view_sql(c)));
    }

    for (key, t) in &target.views {
        let Some(c) = current.views.get(key) else { continue };
        if t.materialized != c.materialized {
            // Flipping materialization is a rebuild.
            let mut create = t.clone();
            create.or_replace = false;
            create.if_not_exists = false;
            ops.push(Operation::new(
                OpKind::ReplaceView,
                key.to_string(),
                vec![drop_view_sql(c), render::render_kind(&StatementKind::CreateView(create))],
            ));
            continue;
        }
        if t.cluster != c.cluster {
            errors.push(AppError::ClusterChange {
                name: key.to_string(),
                current: cluster_label(&c.cluster),
                target: cluster_label(&t.cluster),
            });
            continue;
        }
        if views_equal(t, c) {
            continue;
        }
        if t.materialized {
            // Safer than ALTER TABLE ... MODIFY QUERY: drop and recreate.
            let mut create = t.clone();
            create.or_replace = false;
            create.if_not_exists = false;
            ops.push(Operation::new(
                OpKind::ReplaceView,
                key.to_string(),
                vec![drop_view_sql(c), render::render_kind(&StatementKind::CreateView(create))],
            ));
        } else {
            let mut replace = t.clone();
            replace.or_replace = true;
            replace.if_not_exists = false;
            ops.push(Operation::single(
                OpKind::ReplaceView,
                key.to_string(),
                render::render_kind(&StatementKind::CreateView(replace)),
            ));
        }
    }
}

fn drop_view_sql(v: &CreateView) -> String {
    let drop = DropObject {
        kind: ObjectKind::View,
        if_exists: false,
        name: v.name.clone(),
        cluster: v.cluster.clone(),
        sync: false,
    };
    render::render_kind(&StatementKind::Drop(drop))
}

/// Query equivalence is textual on canonical rendering.
fn views_equal(a: &CreateView, b: &CreateView) -> bool {
    rename::view_signature(a) == rename::view_signature(b)
}

// ---------------------------------------------------------------------------
// Named collections

fn diff_collections(target: &Schema, current: &Schema, ops: &mut Vec<Operation>) {
    for (name, t) in &target.collections {
        match current.collections.get(name) {
            None => {
                let mut create = t.clone();
                create.or_replace = false;
                create.if_not_exists = false;
                ops.push(Operation::single(
                    OpKind::CreateNamedCollection,
                    name.clone(),
                    render::render_kind(&StatementKind::CreateNamedCollection(create)),
                ));
            }
            Some(c) => {
                if t == c {
                    continue;
                }
                if t.overridable != c.overridable || t.comment != c.comment {
                    // Collection-level changes need a full rewrite.
                    let mut replace = t.clone();
                    replace.or_replace = true;
                    replace.if_not_exists = false;
                    ops.push(Operation::single(
                        OpKind::CreateNamedCollection,
                        name.clone(),
                        render::render_kind(&StatementKind::CreateNamedCollection(replace)),
                    ));
                    continue;
                }
                let mut set: Vec<CollectionEntry> = Vec::new();
                for entry in &t.entries {
                    match c.entries.iter().find(|e| e.key == entry.key) {
                        None => set.push(entry.clone()),
                        Some(existing) if existing != entry => set.push(entry.clone()),
                        Some(_) => {}
                    }
                }
                let delete: Vec<_> = c
                    .entries
                    .iter()
                    .filter(|e| !t.entries.iter().any(|te| te.key == e.key))
                    .map(|e| e.key.clone())
                    .collect();
                if set.is_empty() && delete.is_empty() {
                    continue;
                }
                let alter = AlterNamedCollection {
                    if_exists: false,
                    name: t.name.clone(),
                    cluster: t.cluster.clone(),
                    set,
                    delete,
                };
                ops.push(Operation::single(
                    OpKind::AlterNamedCollection,
                    name.clone(),
                    render::render_kind(&StatementKind::AlterNamedCollection(alter)),
                ));
            }
        }
    }
    for (name, c) in &current.collections {
        if !target.collections.contains_key(name) {
            let drop = DropNamedCollection { if_exists: false, name: c.name.clone(), cluster: c.cluster.clone() };
            ops.push(Operation::single(
                OpKind::DropNamedCollection,
                name.clone(),
                render::render_kind(&StatementKind::DropNamedCollection(drop)),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Roles and grants

fn diff_roles(target: &Schema, current: &Schema, ops: &mut Vec<Operation>) {
    let added: Vec<String> = target.roles.keys().filter(|k| !current.roles.contains_key(*k)).cloned().collect();
    let removed: Vec<String> = current.roles.keys().filter(|k| !target.roles.contains_key(*k)).cloned().collect();

    // A role rename is an unmatched pair with identical settings and
    // identical grant sets.
    let mut renamed_from: BTreeSet<String> = BTreeSet::new();
    let mut renamed_to: BTreeSet<String> = BTreeSet::new();
    for from in &removed {
        let Some(c) = current.roles.get(from) else { continue };
        let from_grants = grants_of(current, from);
        let mut candidates: Vec<&String> = added
            .iter()
            .filter(|to| !renamed_to.contains(*to))
            .filter(|to| {
                let t = target.roles.get(*to).expect("added role");
                t.settings == c.settings && grants_of(target, to) == from_grants
            })
            .collect();
        candidates.sort_by_key(|to| (rename::edit_distance(from, to), (*to).clone()));
        if let Some(to) = candidates.first() {
            let alter = AlterRole {
                if_exists: false,
                name: c.name.clone(),
                cluster: c.cluster.clone(),
                rename_to: Some(target.roles.get(*to).expect("added role").name.clone()),
                settings: Vec::new(),
            };
            ops.push(Operation::single(
                OpKind::AlterRole,
                from.clone(),
                render::render_kind(&StatementKind::AlterRole(alter)),
            ));
            renamed_from.insert(from.clone());
            renamed_to.insert((*to).clone());
        }
    }

    for name in &added {
        if renamed_to.contains(name) {
            continue;
        }
        let t = target.roles.get(name).expect("added role");
        let create = CreateRole {
            or_replace: false,
            if_not_exists: false,
            names: vec![t.name.clone()],
            cluster: t.cluster.clone(),
            settings: t.settings.clone(),
        };
        ops.push(Operation::single(
            OpKind::CreateRole,
            name.clone(),
            render::render_kind(&StatementKind::CreateRole(create)),
        ));
    }

    for name in &removed {
        if renamed_from.contains(name) {
            continue;
        }
        let c = current.roles.get(name).expect("removed role");
        let drop = DropRole { if_exists: false, names: vec![c.name.clone()], cluster: c.cluster.clone() };
        ops.push(Operation::single(
            OpKind::DropRole,
            name.clone(),
            render::render_kind(&StatementKind::DropRole(drop)),
        ));
    }

    for (name, t) in &target.roles {
        let Some(c) = current.roles.get(name) else { continue };
        if t.settings != c.settings {
            let alter = AlterRole {
                if_exists: false,
                name: t.name.clone(),
                cluster: t.cluster.clone(),
                rename_to: None,
                settings: t.settings.clone(),
            };
            ops.push(Operation::single(
                OpKind::AlterRole,
                name.clone(),
                render::render_kind(&StatementKind::AlterRole(alter)),
            ));
        }
    }
}

/// Grants addressed to `grantee`, rendered with the grantee blanked so
/// the sets compare across a rename.
fn grants_of(schema: &Schema, grantee: &str) -> BTreeSet<String> {
    schema
        .grants
        .iter()
        .filter(|g| g.grantees.iter().any(|x| x.text == grantee))
        .map(|g| {
            let mut narrowed = g.clone();
            narrowed.grantees = vec![crate::ident::Ident::plain("__grantee__")];
            render::render_kind(&StatementKind::Grant(narrowed))
        })
        .collect()
}

fn diff_grants(target: &Schema, current: &Schema, ops: &mut Vec<Operation>) {
    let target_set: BTreeSet<String> =
        target.grants.iter().map(|g| render::render_kind(&StatementKind::Grant(g.clone()))).collect();
    let current_set: BTreeSet<String> =
        current.grants.iter().map(|g| render::render_kind(&StatementKind::Grant(g.clone()))).collect();

    for g in &target.grants {
        let text = render::render_kind(&StatementKind::Grant(g.clone()));
        if !current_set.contains(&text) {
            ops.push(Operation::single(OpKind::Grant, grant_label(g), text));
        }
    }
    for g in &current.grants {
        let text = render::render_kind(&StatementKind::Grant(g.clone()));
        if !target_set.contains(&text) {
            // Skip revokes for grantees that disappear entirely; dropping
            // the role or user already cascades.
            let grantee_kept = g.grantees.iter().any(|x| {
                target.roles.contains_key(&x.text) || target.users.contains_key(&x.text)
            });
            if !grantee_kept {
                continue;
            }
            let revoke = RevokeStmt {
                cluster: g.cluster.clone(),
                grant_option_for: false,
                admin_option_for: false,
                kind: g.kind.clone(),
                grantees: g.grantees.clone(),
            };
            ops.push(Operation::single(
                OpKind::Revoke,
                grant_label(g),
                render::render_kind(&StatementKind::Revoke(revoke)),
            ));
        }
    }
}

fn grant_label(g: &GrantStmt) -> String {
    g.grantees.iter().map(|i| i.text.clone()).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Functions

fn diff_functions(target: &Schema, current: &Schema, ops: &mut Vec<Operation>) {
    for (name, t) in &target.functions {
        match current.functions.get(name) {
            None => {
                let mut create = t.clone();
                create.or_replace = false;
                create.if_not_exists = false;
                ops.push(Operation::single(
                    OpKind::CreateFunction,
                    name.clone(),
                    render::render_kind(&StatementKind::CreateFunction(create)),
                ));
            }
            Some(c) => {
                if render::render_expr(&t.body) == render::render_expr(&c.body) {
                    continue;
                }
                // No ALTER FUNCTION: drop then recreate, as one operation.
                let drop = DropFunction { if_exists: false, name: c.name.clone(), cluster: c.cluster.clone() };
                let mut create = t.clone();
                create.or_replace = false;
                create.if_not_exists = false;
                ops.push(Operation::new(
                    OpKind::CreateFunction,
                    name.clone(),
                    vec![
                        render::render_kind(&StatementKind::DropFunction(drop)),
                        render::render_kind(&StatementKind::CreateFunction(create)),
                    ],
                ));
            }
        }
    }
    for (name, c) in &current.functions {
        if !target.functions.contains_key(name) {
            let drop = DropFunction { if_exists: false, name: c.name.clone(), cluster: c.cluster.clone() };
            ops.push(Operation::single(
                OpKind::DropFunction,
                name.clone(),
                render::render_kind(&StatementKind::DropFunction(drop)),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Users

fn diff_users(target: &Schema, current: &Schema, ops: &mut Vec<Operation>) {
    for (name, t) in &target.users {
        match current.users.get(name) {
            None => {
                let mut create = t.clone();
                create.or_replace = false;
                create.if_not_exists = false;
                ops.push(Operation::single(
                    OpKind::CreateUser,
                    name.clone(),
                    render::render_kind(&StatementKind::CreateUser(create)),
                ));
            }
            Some(c) => {
                let mut alter = AlterUser {
                    if_exists: false,
                    name: t.name.clone(),
                    cluster: t.cluster.clone(),
                    rename_to: None,
                    identification: None,
                    hosts: None,
                    valid_until: None,
                    default_roles: None,
                    default_database: None,
                    grantees: None,
                    settings: Vec::new(),
                };
                let mut changed = 0usize;
                if t.identification != c.identification {
                    alter.identification = t.identification.clone();
                    changed += 1;
                }
                if t.hosts != c.hosts {
                    alter.hosts = Some(t.hosts.clone());
                    changed += 1;
                }
                if t.valid_until != c.valid_until {
                    alter.valid_until = t.valid_until.clone();
                    changed += 1;
                }
                if t.default_roles != c.default_roles {
                    alter.default_roles = t.default_roles.clone();
                    changed += 1;
                }
                if t.default_database != c.default_database {
                    alter.default_database = t.default_database.clone();
                    changed += 1;
                }
                if t.grantees != c.grantees {
                    alter.grantees = t.grantees.clone();
                    changed += 1;
                }
                if t.settings != c.settings {
                    alter.settings = t.settings.clone();
                    changed += 1;
                }
                if changed == 0 {
                    continue;
                }
                if changed > 3 {
                    // Rewriting most of the profile: recreate instead of
                    // stacking ALTER fragments.
                    warn!(target: "chkeeper::diff", user = %name, "user rewrite falls back to drop + create");
                    let drop = DropUser { if_exists: false, names: vec![c.name.clone()], cluster: c.cluster.clone() };
                    let mut create = t.clone();
                    create.or_replace = false;
                    create.if_not_exists = false;
                    ops.push(Operation::new(
                        OpKind::CreateUser,
                        name.clone(),
                        vec![
                            render::render_kind(&StatementKind::DropUser(drop)),
                            render::render_kind(&StatementKind::CreateUser(create)),
                        ],
                    ));
                } else {
                    ops.push(Operation::single(
                        OpKind::AlterUser,
                        name.clone(),
                        render::render_kind(&StatementKind::AlterUser(alter)),
                    ));
                }
            }
        }
    }
    for (name, c) in &current.users {
        if !target.users.contains_key(name) {
            let drop = DropUser { if_exists: false, names: vec![c.name.clone()], cluster: c.cluster.clone() };
            ops.push(Operation::single(
                OpKind::DropUser,
                name.clone(),
                render::render_kind(&StatementKind::DropUser(drop)),
            ));
        }
    }
}
