//! Plan ordering. Forward phase creates and modifies, reverse phase
//! destroys in the mirrored order; within a kind, topological order
//! follows discovered dependencies (AS-sources for tables, referenced
//! relations for views). Graphs are index-into-vector.

use std::collections::BTreeMap;

use crate::diff::{OpKind, Operation};
use crate::ident::QualifiedName;
use crate::parser::ast::*;
use crate::schema::{Schema, DEFAULT_DATABASE};

fn rank(kind: OpKind) -> u8 {
    match kind {
        OpKind::CreateRole | OpKind::AlterRole => 0,
        OpKind::CreateUser | OpKind::AlterUser => 1,
        OpKind::Grant => 2,
        OpKind::CreateFunction => 3,
        OpKind::CreateDatabase | OpKind::AlterDatabase | OpKind::RenameDatabase => 4,
        OpKind::CreateNamedCollection | OpKind::AlterNamedCollection => 5,
        OpKind::CreateTable => 6,
        OpKind::AlterTable => 7,
        OpKind::RenameTable => 8,
        OpKind::CreateDictionary | OpKind::ReplaceDictionary | OpKind::RenameDictionary => 9,
        OpKind::CreateView | OpKind::ReplaceView => 10,
        OpKind::DropView => 11,
        OpKind::DropDictionary => 12,
        OpKind::DropTable => 13,
        OpKind::DropNamedCollection => 14,
        OpKind::DropDatabase => 15,
        OpKind::DropFunction => 16,
        OpKind::Revoke => 17,
        OpKind::DropRole => 18,
        OpKind::DropUser => 19,
    }
}

pub fn arrange(mut ops: Vec<Operation>, target: &Schema, current: &Schema) -> Vec<Operation> {
    ops.sort_by_key(|op| rank(op.kind));

    reorder_topologically(&mut ops, OpKind::CreateTable, &table_dependencies(target), false);
    reorder_topologically(&mut ops, OpKind::CreateView, &view_dependencies(target), false);
    reorder_topologically(&mut ops, OpKind::DropView, &view_dependencies(current), true);
    reorder_topologically(&mut ops, OpKind::DropTable, &table_dependencies(current), true);
    ops
}

/// Dependency map for tables: AS-derived table -> its source.
fn table_dependencies(schema: &Schema) -> BTreeMap<QualifiedName, Vec<QualifiedName>> {
    let mut deps = BTreeMap::new();
    for (key, table) in &schema.tables {
        let mut list = Vec::new();
        if let Some(AsSource::Table(source)) = &table.as_source {
            list.push(source.resolve(DEFAULT_DATABASE));
        }
        deps.insert(key.clone(), list);
    }
    deps
}

/// Dependency map for views: view -> every relation its query references.
fn view_dependencies(schema: &Schema) -> BTreeMap<QualifiedName, Vec<QualifiedName>> {
    let mut deps = BTreeMap::new();
    for (key, view) in &schema.views {
        let mut list = query_references(&view.query);
        if let Some(AsSource::Table(to)) = &view.to {
            list.push(to.resolve(DEFAULT_DATABASE));
        }
        deps.insert(key.clone(), list);
    }
    deps
}

/// Relations referenced from a query's FROM clauses, CTEs and unions.
pub fn query_references(q: &SelectQuery) -> Vec<QualifiedName> {
    let mut out = Vec::new();
    collect_body(&q.body, &mut out);
    for (_, body) in &q.unions {
        collect_body(body, &mut out);
    }
    out
}

fn collect_body(b: &SelectBody, out: &mut Vec<QualifiedName>) {
    for cte in &b.with {
        if let CteItem::Query { query, .. } = cte {
            out.extend(query_references(query));
        }
    }
    if let Some(from) = &b.from {
        collect_factor(&from.base, out);
        for join in &from.joins {
            collect_factor(&join.factor, out);
        }
    }
}

fn collect_factor(f: &TableFactor, out: &mut Vec<QualifiedName>) {
    match f {
        TableFactor::Table { name, .. } => out.push(name.resolve(DEFAULT_DATABASE)),
        TableFactor::Subquery { query, .. } => out.extend(query_references(query)),
        TableFactor::Function { .. } => {}
    }
}

/// Reorder the contiguous run of `kind` operations topologically. With
/// `reverse`, dependents come first (drop order). Cycles cannot occur in
/// the DDL these maps are built from, but a defensive fallback appends
/// leftovers in name order.
fn reorder_topologically(
    ops: &mut [Operation],
    kind: OpKind,
    deps: &BTreeMap<QualifiedName, Vec<QualifiedName>>,
    reverse: bool,
) {
    let idxs: Vec<usize> = ops.iter().enumerate().filter(|(_, op)| op.kind == kind).map(|(i, _)| i).collect();
    if idxs.len() < 2 {
        return;
    }

    let names: Vec<String> = idxs.iter().map(|&i| ops[i].name.clone()).collect();
    let position: BTreeMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

    // Edges as indices into the run: dependency -> dependent.
    let mut in_degree = vec![0usize; names.len()];
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
    for (node, name) in names.iter().enumerate() {
        let Some((key, list)) = deps.iter().find(|(k, _)| k.to_string() == *name) else { continue };
        let _ = key;
        for dep in list {
            if let Some(&dep_node) = position.get(dep.to_string().as_str()) {
                edges[dep_node].push(node);
                in_degree[node] += 1;
            }
        }
    }

    let mut ready: Vec<usize> = (0..names.len()).filter(|&n| in_degree[n] == 0).collect();
    ready.sort_by(|a, b| names[*a].cmp(&names[*b]));
    let mut order: Vec<usize> = Vec::with_capacity(names.len());
    while let Some(node) = ready.first().copied() {
        ready.remove(0);
        order.push(node);
        for &next in &edges[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                let at = ready.binary_search_by(|x| names[*x].cmp(&names[next])).unwrap_or_else(|e| e);
                ready.insert(at, next);
            }
        }
    }
    for node in 0..names.len() {
        if !order.contains(&node) {
            order.push(node);
        }
    }
    if reverse {
        order.reverse();
    }

    let originals: Vec<Operation> = idxs.iter().map(|&i| ops[i].clone()).collect();
    for (slot, &node) in idxs.iter().zip(order.iter()) {
        ops[*slot] = originals[node].clone();
    }
}
