//! Rename detection. After matching by qualified name, unmatched objects
//! on both sides are compared by a property signature that excludes the
//! name. A rename is declared only on an exact signature match; ties are
//! broken by the smallest edit distance on the name, and no source object
//! ever produces more than one rename.

use std::collections::BTreeSet;

use crate::ident::{Ident, ObjectName, QualifiedName};
use crate::parser::ast::{CreateDictionary, CreateTable, CreateView, StatementKind};
use crate::render;

/// Match removed-side keys to added-side keys by exact signature.
pub fn match_renames<FR, FA>(
    removed: &[QualifiedName],
    added: &[QualifiedName],
    removed_signature: FR,
    added_signature: FA,
) -> Vec<(QualifiedName, QualifiedName)>
where
    FR: Fn(&QualifiedName) -> String,
    FA: Fn(&QualifiedName) -> String,
{
    let mut taken: BTreeSet<&QualifiedName> = BTreeSet::new();
    let mut out = Vec::new();
    for from in removed {
        let signature = removed_signature(from);
        let mut candidates: Vec<&QualifiedName> = added
            .iter()
            .filter(|to| !taken.contains(*to))
            .filter(|to| added_signature(to) == signature)
            .collect();
        candidates.sort_by_key(|to| (edit_distance(&from.to_string(), &to.to_string()), (*to).clone()));
        if let Some(&to) = candidates.first() {
            taken.insert(to);
            out.push((from.clone(), to.clone()));
        }
    }
    out
}

/// Signature of a table: everything but its name (engine, elements,
/// clauses, comment), rendered canonically under a placeholder name.
pub fn table_signature(table: &CreateTable) -> String {
    let mut t = table.clone();
    t.name = placeholder();
    t.or_replace = false;
    t.if_not_exists = false;
    t.engine = super::normalize_engine(&t.engine);
    render::render_kind(&StatementKind::CreateTable(t))
}

/// Signature of a dictionary: columns, primary key, source, layout,
/// lifetime, settings, comment.
pub fn dictionary_signature(dict: &CreateDictionary) -> String {
    let mut d = dict.clone();
    d.name = placeholder();
    d.or_replace = false;
    d.if_not_exists = false;
    render::render_kind(&StatementKind::CreateDictionary(d))
}

/// Signature of a view: materialization, target, engine clauses and the
/// canonical query text.
pub fn view_signature(view: &CreateView) -> String {
    let mut v = view.clone();
    v.name = placeholder();
    v.or_replace = false;
    v.if_not_exists = false;
    v.engine = super::normalize_engine(&v.engine);
    render::render_kind(&StatementKind::CreateView(v))
}

fn placeholder() -> ObjectName {
    ObjectName::bare(Ident::plain("__signature__"))
}

/// Levenshtein distance for the rename tie-break.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
