//! Canonical SQL renderer. Produces the text that is hashed, written to
//! plan files and compared during diffing, so the contract is
//! `parse(render(parse(x))) == parse(x)`: keyword spelling is normalized,
//! identifier and number spellings are preserved, parentheses are inserted
//! exactly where precedence requires them.

use crate::parser::ast::*;
use std::fmt::Write as _;

/// Render a statement list the way the composer ordered it: blank lines
/// between statements, leading/trailing comments kept adjacent.
pub fn render_statements(stmts: &[Statement]) -> String {
    stmts.iter().map(render_statement).collect::<Vec<_>>().join("\n\n")
}

pub fn render_statement(stmt: &Statement) -> String {
    let mut out = String::new();
    for c in &stmt.leading {
        out.push_str(&render_comment(c));
        out.push('\n');
    }
    if let StatementKind::Comment(c) = &stmt.kind {
        out.push_str(&render_comment(c));
        return out;
    }
    out.push_str(&render_kind(&stmt.kind));
    out.push(';');
    if let Some(c) = &stmt.trailing {
        out.push(' ');
        out.push_str(&render_comment(c));
    }
    out
}

fn render_comment(c: &Comment) -> String {
    if c.block {
        format!("/* {} */", c.text)
    } else {
        format!("-- {}", c.text)
    }
}

/// DDL text of a statement without comments or the trailing `;`.
pub fn render_kind(kind: &StatementKind) -> String {
    match kind {
        StatementKind::Comment(c) => render_comment(c),
        StatementKind::CreateDatabase(s) => render_create_database(s),
        StatementKind::AlterDatabase(s) => render_alter_database(s),
        StatementKind::DropDatabase(s) => render_drop_database(s),
        StatementKind::RenameDatabase(s) => {
            let mut out = format!("RENAME DATABASE {} TO {}", s.from, s.to);
            push_cluster(&mut out, &s.cluster);
            out
        }
        StatementKind::AttachDatabase(s) => {
            let mut out = String::from("ATTACH DATABASE ");
            if s.if_not_exists {
                out.push_str("IF NOT EXISTS ");
            }
            let _ = write!(out, "{}", s.name);
            push_cluster(&mut out, &s.cluster);
            if let Some(e) = &s.engine {
                let _ = write!(out, " ENGINE = {}", render_engine(e));
            }
            out
        }
        StatementKind::DetachDatabase(s) => {
            let mut out = String::from("DETACH DATABASE ");
            if s.if_exists {
                out.push_str("IF EXISTS ");
            }
            let _ = write!(out, "{}", s.name);
            push_cluster(&mut out, &s.cluster);
            if s.sync {
                out.push_str(" SYNC");
            }
            out
        }
        StatementKind::CreateTable(s) => render_create_table(s),
        StatementKind::AlterTable(s) => render_alter_table(s),
        StatementKind::Drop(s) => {
            let mut out = format!("DROP {} ", s.kind.keyword());
            if s.if_exists {
                out.push_str("IF EXISTS ");
            }
            let _ = write!(out, "{}", s.name);
            push_cluster(&mut out, &s.cluster);
            if s.sync {
                out.push_str(" SYNC");
            }
            out
        }
        StatementKind::Rename(s) => {
            let pairs = s
                .renames
                .iter()
                .map(|(from, to)| format!("{from} TO {to}"))
                .collect::<Vec<_>>()
                .join(", ");
            let mut out = format!("RENAME {} {}", s.kind.keyword(), pairs);
            push_cluster(&mut out, &s.cluster);
            out
        }
        StatementKind::Attach(s) => {
            let mut out = format!("ATTACH {} ", s.kind.keyword());
            if s.if_not_exists {
                out.push_str("IF NOT EXISTS ");
            }
            let _ = write!(out, "{}", s.name);
            push_cluster(&mut out, &s.cluster);
            out
        }
        StatementKind::Detach(s) => {
            let mut out = format!("DETACH {} ", s.kind.keyword());
            if s.if_exists {
                out.push_str("IF EXISTS ");
            }
            let _ = write!(out, "{}", s.name);
            push_cluster(&mut out, &s.cluster);
            if s.permanently {
                out.push_str(" PERMANENTLY");
            }
            if s.sync {
                out.push_str(" SYNC");
            }
            out
        }
        StatementKind::CreateDictionary(s) => render_create_dictionary(s),
        StatementKind::CreateNamedCollection(s) => render_create_collection(s),
        StatementKind::AlterNamedCollection(s) => render_alter_collection(s),
        StatementKind::DropNamedCollection(s) => {
            let mut out = String::from("DROP NAMED COLLECTION ");
            if s.if_exists {
                out.push_str("IF EXISTS ");
            }
            let _ = write!(out, "{}", s.name);
            push_cluster(&mut out, &s.cluster);
            out
        }
        StatementKind::CreateView(s) => render_create_view(s),
        StatementKind::CreateRole(s) => render_create_role(s),
        StatementKind::AlterRole(s) => render_alter_role(s),
        StatementKind::DropRole(s) => {
            let mut out = String::from("DROP ROLE ");
            if s.if_exists {
                out.push_str("IF EXISTS ");
            }
            out.push_str(&ident_list(&s.names));
            push_cluster(&mut out, &s.cluster);
            out
        }
        StatementKind::Grant(s) => render_grant(s),
        StatementKind::Revoke(s) => render_revoke(s),
        StatementKind::SetRole(s) => format!("SET ROLE {}", render_role_spec(&s.spec)),
        StatementKind::SetDefaultRole(s) => {
            format!("SET DEFAULT ROLE {} TO {}", render_role_spec(&s.spec), ident_list(&s.users))
        }
        StatementKind::CreateFunction(s) => {
            let mut out = String::from("CREATE ");
            if s.or_replace {
                out.push_str("OR REPLACE ");
            }
            out.push_str("FUNCTION ");
            if s.if_not_exists {
                out.push_str("IF NOT EXISTS ");
            }
            let _ = write!(out, "{}", s.name);
            push_cluster(&mut out, &s.cluster);
            let _ = write!(out, " AS {}", render_expr(&s.body));
            out
        }
        StatementKind::DropFunction(s) => {
            let mut out = String::from("DROP FUNCTION ");
            if s.if_exists {
                out.push_str("IF EXISTS ");
            }
            let _ = write!(out, "{}", s.name);
            push_cluster(&mut out, &s.cluster);
            out
        }
        StatementKind::CreateUser(s) => render_create_user(s),
        StatementKind::AlterUser(s) => render_alter_user(s),
        StatementKind::DropUser(s) => {
            let mut out = String::from("DROP USER ");
            if s.if_exists {
                out.push_str("IF EXISTS ");
            }
            out.push_str(&ident_list(&s.names));
            push_cluster(&mut out, &s.cluster);
            out
        }
        StatementKind::Select(q) => render_select(q),
    }
}

fn push_cluster(out: &mut String, cluster: &Option<crate::ident::Ident>) {
    if let Some(c) = cluster {
        let _ = write!(out, " ON CLUSTER {c}");
    }
}

fn ident_list(idents: &[crate::ident::Ident]) -> String {
    idents.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Databases

fn render_create_database(s: &CreateDatabase) -> String {
    let mut out = String::from("CREATE ");
    if s.or_replace {
        out.push_str("OR REPLACE ");
    }
    out.push_str("DATABASE ");
    if s.if_not_exists {
        out.push_str("IF NOT EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    if let Some(e) = &s.engine {
        let _ = write!(out, " ENGINE = {}", render_engine(e));
    }
    if let Some(c) = &s.comment {
        let _ = write!(out, " COMMENT {}", string_lit(c));
    }
    out
}

fn render_alter_database(s: &AlterDatabase) -> String {
    let mut out = format!("ALTER DATABASE {}", s.name);
    push_cluster(&mut out, &s.cluster);
    match &s.action {
        AlterDatabaseAction::ModifyComment(c) => {
            let _ = write!(out, " MODIFY COMMENT {}", string_lit(c));
        }
    }
    out
}

fn render_drop_database(s: &DropDatabase) -> String {
    let mut out = String::from("DROP DATABASE ");
    if s.if_exists {
        out.push_str("IF EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    if s.sync {
        out.push_str(" SYNC");
    }
    out
}

// ---------------------------------------------------------------------------
// Tables

fn render_create_table(s: &CreateTable) -> String {
    let mut out = String::from("CREATE ");
    if s.or_replace {
        out.push_str("OR REPLACE ");
    }
    out.push_str("TABLE ");
    if s.if_not_exists {
        out.push_str("IF NOT EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    if !s.elements.is_empty() {
        out.push_str("\n(\n");
        let rendered: Vec<String> = s.elements.iter().map(|e| format!("    {}", render_table_element(e))).collect();
        out.push_str(&rendered.join(",\n"));
        out.push_str("\n)");
    }
    if let Some(a) = &s.as_source {
        let _ = write!(out, " AS {}", render_as_source(a));
    }
    if let Some(e) = &s.engine {
        let _ = write!(out, "\nENGINE = {}", render_engine(e));
    }
    if let Some(x) = &s.order_by {
        let _ = write!(out, "\nORDER BY {}", render_expr(x));
    }
    if let Some(x) = &s.partition_by {
        let _ = write!(out, "\nPARTITION BY {}", render_expr(x));
    }
    if let Some(x) = &s.primary_key {
        let _ = write!(out, "\nPRIMARY KEY {}", render_expr(x));
    }
    if let Some(x) = &s.sample_by {
        let _ = write!(out, "\nSAMPLE BY {}", render_expr(x));
    }
    if let Some(x) = &s.ttl {
        let _ = write!(out, "\nTTL {}", render_expr(x));
    }
    if !s.settings.is_empty() {
        let _ = write!(out, "\nSETTINGS {}", render_settings(&s.settings));
    }
    if let Some(c) = &s.comment {
        let _ = write!(out, "\nCOMMENT {}", string_lit(c));
    }
    out
}

pub fn render_as_source(a: &AsSource) -> String {
    match a {
        AsSource::Table(name) => name.to_string(),
        AsSource::TableFunction { name, args } => format!("{name}({})", expr_list(args)),
    }
}

pub fn render_table_element(e: &TableElement) -> String {
    match e {
        TableElement::Column(c) => render_column(c),
        TableElement::Index(i) => format!("INDEX {}", render_index(i)),
        TableElement::Constraint(c) => format!("CONSTRAINT {}", render_constraint(c)),
    }
}

pub fn render_column(c: &ColumnDef) -> String {
    let mut out = c.name.to_string();
    if let Some(t) = &c.data_type {
        let _ = write!(out, " {}", render_data_type(t));
    }
    if let Some(d) = &c.default {
        let _ = write!(out, " {}", d.kind.keyword());
        if let Some(x) = &d.expr {
            let _ = write!(out, " {}", render_expr(x));
        }
    }
    if !c.codecs.is_empty() {
        let codecs: Vec<String> = c
            .codecs
            .iter()
            .map(|cd| {
                if cd.params.is_empty() {
                    cd.name.clone()
                } else {
                    format!("{}({})", cd.name, expr_list(&cd.params))
                }
            })
            .collect();
        let _ = write!(out, " CODEC({})", codecs.join(", "));
    }
    if let Some(t) = &c.ttl {
        let _ = write!(out, " TTL {}", render_expr(t));
    }
    if let Some(cm) = &c.comment {
        let _ = write!(out, " COMMENT {}", string_lit(cm));
    }
    out
}

pub fn render_index(i: &IndexDef) -> String {
    let mut out = format!("{} {} TYPE {}", i.name, render_expr(&i.expr), i.index_type.name);
    if !i.index_type.params.is_empty() {
        let _ = write!(out, "({})", expr_list(&i.index_type.params));
    }
    if let Some(g) = i.granularity {
        let _ = write!(out, " GRANULARITY {g}");
    }
    out
}

pub fn render_constraint(c: &ConstraintDef) -> String {
    let kw = match c.kind {
        ConstraintKind::Check => "CHECK",
        ConstraintKind::Assume => "ASSUME",
    };
    format!("{} {} {}", c.name, kw, render_expr(&c.expr))
}

pub fn render_engine(e: &Engine) -> String {
    match &e.params {
        None => e.name.clone(),
        Some(params) => {
            let rendered: Vec<String> = params
                .iter()
                .map(|p| match p {
                    EngineParam::Expr(x) => render_expr(x),
                    EngineParam::Opaque(raw) => raw.clone(),
                })
                .collect();
            format!("{}({})", e.name, rendered.join(", "))
        }
    }
}

fn render_alter_table(s: &AlterTable) -> String {
    let mut out = String::from("ALTER TABLE ");
    if s.if_exists {
        out.push_str("IF EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    out.push(' ');
    let ops: Vec<String> = s.ops.iter().map(render_alter_op).collect();
    out.push_str(&ops.join(", "));
    out
}

pub fn render_alter_op(op: &AlterTableOp) -> String {
    match op {
        AlterTableOp::AddColumn { if_not_exists, column, position } => {
            let mut out = String::from("ADD COLUMN ");
            if *if_not_exists {
                out.push_str("IF NOT EXISTS ");
            }
            out.push_str(&render_column(column));
            match position {
                Some(ColumnPosition::First) => out.push_str(" FIRST"),
                Some(ColumnPosition::After(after)) => {
                    let _ = write!(out, " AFTER {after}");
                }
                None => {}
            }
            out
        }
        AlterTableOp::DropColumn { if_exists, name } => {
            format!("DROP COLUMN {}{}", exists_prefix(*if_exists), name)
        }
        AlterTableOp::ModifyColumn { if_exists, column } => {
            format!("MODIFY COLUMN {}{}", exists_prefix(*if_exists), render_column(column))
        }
        AlterTableOp::RenameColumn { if_exists, from, to } => {
            format!("RENAME COLUMN {}{from} TO {to}", exists_prefix(*if_exists))
        }
        AlterTableOp::CommentColumn { if_exists, name, comment } => {
            format!("COMMENT COLUMN {}{name} {}", exists_prefix(*if_exists), string_lit(comment))
        }
        AlterTableOp::AddIndex { if_not_exists, index } => {
            let prefix = if *if_not_exists { "IF NOT EXISTS " } else { "" };
            format!("ADD INDEX {prefix}{}", render_index(index))
        }
        AlterTableOp::DropIndex { if_exists, name } => {
            format!("DROP INDEX {}{}", exists_prefix(*if_exists), name)
        }
        AlterTableOp::AddConstraint { if_not_exists, constraint } => {
            let prefix = if *if_not_exists { "IF NOT EXISTS " } else { "" };
            format!("ADD CONSTRAINT {prefix}{}", render_constraint(constraint))
        }
        AlterTableOp::DropConstraint { if_exists, name } => {
            format!("DROP CONSTRAINT {}{}", exists_prefix(*if_exists), name)
        }
        AlterTableOp::ModifyOrderBy(x) => format!("MODIFY ORDER BY {}", render_expr(x)),
        AlterTableOp::ModifyTtl(x) => format!("MODIFY TTL {}", render_expr(x)),
        AlterTableOp::ModifySettings(settings) => format!("MODIFY SETTING {}", render_settings(settings)),
        AlterTableOp::ModifyComment(c) => format!("MODIFY COMMENT {}", string_lit(c)),
    }
}

fn exists_prefix(if_exists: bool) -> &'static str {
    if if_exists {
        "IF EXISTS "
    } else {
        ""
    }
}

// ---------------------------------------------------------------------------
// Dictionaries

fn render_create_dictionary(s: &CreateDictionary) -> String {
    let mut out = String::from("CREATE ");
    if s.or_replace {
        out.push_str("OR REPLACE ");
    }
    out.push_str("DICTIONARY ");
    if s.if_not_exists {
        out.push_str("IF NOT EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    if !s.columns.is_empty() {
        out.push_str("\n(\n");
        let cols: Vec<String> = s.columns.iter().map(|c| format!("    {}", render_dictionary_column(c))).collect();
        out.push_str(&cols.join(",\n"));
        out.push_str("\n)");
    }
    if !s.primary_key.is_empty() {
        let _ = write!(out, "\nPRIMARY KEY {}", ident_list(&s.primary_key));
    }
    if let Some(src) = &s.source {
        let _ = write!(out, "\nSOURCE({}({}))", src.name, render_kv_params(&src.params));
    }
    if let Some(layout) = &s.layout {
        let _ = write!(out, "\nLAYOUT({}({}))", layout.name, render_kv_params(&layout.params));
    }
    match &s.lifetime {
        Some(Lifetime::Single(v)) => {
            let _ = write!(out, "\nLIFETIME({v})");
        }
        Some(Lifetime::MinMax { min, max }) => {
            let _ = write!(out, "\nLIFETIME(MIN {min} MAX {max})");
        }
        None => {}
    }
    if !s.settings.is_empty() {
        let _ = write!(out, "\nSETTINGS({})", render_settings(&s.settings));
    }
    if let Some(c) = &s.comment {
        let _ = write!(out, "\nCOMMENT {}", string_lit(c));
    }
    out
}

fn render_dictionary_column(c: &DictionaryColumn) -> String {
    let mut out = format!("{} {}", c.name, render_data_type(&c.data_type));
    if let Some(d) = &c.default {
        let _ = write!(out, " DEFAULT {}", render_expr(d));
    }
    if let Some(x) = &c.expression {
        let _ = write!(out, " EXPRESSION {}", render_expr(x));
    }
    if c.hierarchical {
        out.push_str(" HIERARCHICAL");
    }
    if c.injective {
        out.push_str(" INJECTIVE");
    }
    if c.is_object_id {
        out.push_str(" IS_OBJECT_ID");
    }
    out
}

fn render_kv_params(params: &[(crate::ident::Ident, Expr)]) -> String {
    params.iter().map(|(k, v)| format!("{k} {}", render_expr(v))).collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Named collections

fn render_create_collection(s: &CreateNamedCollection) -> String {
    let mut out = String::from("CREATE ");
    if s.or_replace {
        out.push_str("OR REPLACE ");
    }
    out.push_str("NAMED COLLECTION ");
    if s.if_not_exists {
        out.push_str("IF NOT EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    out.push_str(" AS ");
    let entries: Vec<String> = s.entries.iter().map(render_collection_entry).collect();
    out.push_str(&entries.join(", "));
    match s.overridable {
        Some(true) => out.push_str(" OVERRIDABLE"),
        Some(false) => out.push_str(" NOT OVERRIDABLE"),
        None => {}
    }
    if let Some(c) = &s.comment {
        let _ = write!(out, " COMMENT {}", string_lit(c));
    }
    out
}

fn render_collection_entry(e: &CollectionEntry) -> String {
    let mut out = format!("{} = {}", e.key, render_expr(&e.value));
    match e.overridable {
        Some(true) => out.push_str(" OVERRIDABLE"),
        Some(false) => out.push_str(" NOT OVERRIDABLE"),
        None => {}
    }
    out
}

fn render_alter_collection(s: &AlterNamedCollection) -> String {
    let mut out = String::from("ALTER NAMED COLLECTION ");
    if s.if_exists {
        out.push_str("IF EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    if !s.set.is_empty() {
        let entries: Vec<String> = s.set.iter().map(render_collection_entry).collect();
        let _ = write!(out, " SET {}", entries.join(", "));
    }
    if !s.delete.is_empty() {
        let _ = write!(out, " DELETE {}", ident_list(&s.delete));
    }
    out
}

// ---------------------------------------------------------------------------
// Views

fn render_create_view(s: &CreateView) -> String {
    let mut out = String::from("CREATE ");
    if s.or_replace {
        out.push_str("OR REPLACE ");
    }
    if s.materialized {
        out.push_str("MATERIALIZED ");
    }
    out.push_str("VIEW ");
    if s.if_not_exists {
        out.push_str("IF NOT EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    if let Some(to) = &s.to {
        let _ = write!(out, " TO {}", render_as_source(to));
    }
    if let Some(e) = &s.engine {
        let _ = write!(out, "\nENGINE = {}", render_engine(e));
    }
    if let Some(x) = &s.order_by {
        let _ = write!(out, "\nORDER BY {}", render_expr(x));
    }
    if let Some(x) = &s.partition_by {
        let _ = write!(out, "\nPARTITION BY {}", render_expr(x));
    }
    if let Some(x) = &s.primary_key {
        let _ = write!(out, "\nPRIMARY KEY {}", render_expr(x));
    }
    if let Some(x) = &s.sample_by {
        let _ = write!(out, "\nSAMPLE BY {}", render_expr(x));
    }
    if s.populate {
        out.push_str("\nPOPULATE");
    }
    let _ = write!(out, "\nAS {}", render_select(&s.query));
    if let Some(c) = &s.comment {
        let _ = write!(out, "\nCOMMENT {}", string_lit(c));
    }
    out
}

// ---------------------------------------------------------------------------
// Roles / users / grants

fn render_create_role(s: &CreateRole) -> String {
    let mut out = String::from("CREATE ");
    if s.or_replace {
        out.push_str("OR REPLACE ");
    }
    out.push_str("ROLE ");
    if s.if_not_exists {
        out.push_str("IF NOT EXISTS ");
    }
    out.push_str(&ident_list(&s.names));
    push_cluster(&mut out, &s.cluster);
    if !s.settings.is_empty() {
        let _ = write!(out, " SETTINGS {}", render_settings(&s.settings));
    }
    out
}

fn render_alter_role(s: &AlterRole) -> String {
    let mut out = String::from("ALTER ROLE ");
    if s.if_exists {
        out.push_str("IF EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    if let Some(to) = &s.rename_to {
        let _ = write!(out, " RENAME TO {to}");
    }
    if !s.settings.is_empty() {
        let _ = write!(out, " SETTINGS {}", render_settings(&s.settings));
    }
    out
}

fn render_grant(s: &GrantStmt) -> String {
    let mut out = String::from("GRANT");
    push_cluster(&mut out, &s.cluster);
    out.push(' ');
    match &s.kind {
        GrantKind::Privileges { privileges, target } => {
            out.push_str(&privilege_list(privileges));
            let _ = write!(out, " ON {}", render_grant_target(target));
        }
        GrantKind::Roles { roles } => out.push_str(&ident_list(roles)),
    }
    let _ = write!(out, " TO {}", ident_list(&s.grantees));
    if s.grant_option {
        out.push_str(" WITH GRANT OPTION");
    }
    if s.admin_option {
        out.push_str(" WITH ADMIN OPTION");
    }
    if s.replace_option {
        out.push_str(" WITH REPLACE OPTION");
    }
    out
}

fn render_revoke(s: &RevokeStmt) -> String {
    let mut out = String::from("REVOKE");
    push_cluster(&mut out, &s.cluster);
    out.push(' ');
    if s.grant_option_for {
        out.push_str("GRANT OPTION FOR ");
    }
    if s.admin_option_for {
        out.push_str("ADMIN OPTION FOR ");
    }
    match &s.kind {
        GrantKind::Privileges { privileges, target } => {
            out.push_str(&privilege_list(privileges));
            let _ = write!(out, " ON {}", render_grant_target(target));
        }
        GrantKind::Roles { roles } => out.push_str(&ident_list(roles)),
    }
    let _ = write!(out, " FROM {}", ident_list(&s.grantees));
    out
}

fn privilege_list(privileges: &[Privilege]) -> String {
    privileges
        .iter()
        .map(|p| {
            if p.columns.is_empty() {
                p.name.clone()
            } else {
                format!("{}({})", p.name, ident_list(&p.columns))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_grant_target(t: &GrantTarget) -> String {
    match (&t.database, &t.table) {
        (None, None) => "*.*".to_string(),
        (Some(db), None) => format!("{db}.*"),
        (Some(db), Some(table)) => format!("{db}.{table}"),
        (None, Some(table)) => table.clone(),
    }
}

fn render_role_spec(spec: &RoleSpec) -> String {
    match spec {
        RoleSpec::Default => "DEFAULT".to_string(),
        RoleSpec::None => "NONE".to_string(),
        RoleSpec::All => "ALL".to_string(),
        RoleSpec::AllExcept(except) => format!("ALL EXCEPT {}", ident_list(except)),
        RoleSpec::List(roles) => ident_list(roles),
    }
}

fn render_create_user(s: &CreateUser) -> String {
    let mut out = String::from("CREATE ");
    if s.or_replace {
        out.push_str("OR REPLACE ");
    }
    out.push_str("USER ");
    if s.if_not_exists {
        out.push_str("IF NOT EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    render_user_clauses(
        &mut out,
        &s.identification,
        Some(&s.hosts),
        &s.valid_until,
        &s.default_roles,
        &s.default_database,
        &s.grantees,
        &s.settings,
    );
    if let Some(storage) = &s.access_storage {
        let _ = write!(out, " IN {storage}");
    }
    out
}

fn render_alter_user(s: &AlterUser) -> String {
    let mut out = String::from("ALTER USER ");
    if s.if_exists {
        out.push_str("IF EXISTS ");
    }
    let _ = write!(out, "{}", s.name);
    push_cluster(&mut out, &s.cluster);
    if let Some(to) = &s.rename_to {
        let _ = write!(out, " RENAME TO {to}");
    }
    render_user_clauses(
        &mut out,
        &s.identification,
        s.hosts.as_deref(),
        &s.valid_until,
        &s.default_roles,
        &s.default_database,
        &s.grantees,
        &s.settings,
    );
    out
}

#[allow(clippy::too_many_arguments)]
fn render_user_clauses(
    out: &mut String,
    identification: &Option<Identification>,
    hosts: Option<&[HostClause]>,
    valid_until: &Option<String>,
    default_roles: &Option<RoleSpec>,
    default_database: &Option<crate::ident::Ident>,
    grantees: &Option<GranteesSpec>,
    settings: &[Setting],
) {
    if let Some(id) = identification {
        let _ = write!(out, " {}", render_identification(id));
    }
    if let Some(hosts) = hosts {
        if !hosts.is_empty() {
            let rendered: Vec<String> = hosts.iter().map(render_host).collect();
            let _ = write!(out, " HOST {}", rendered.join(", "));
        }
    }
    if let Some(v) = valid_until {
        let _ = write!(out, " VALID UNTIL {}", string_lit(v));
    }
    if let Some(spec) = default_roles {
        let _ = write!(out, " DEFAULT ROLE {}", render_role_spec(spec));
    }
    if let Some(db) = default_database {
        let _ = write!(out, " DEFAULT DATABASE {db}");
    }
    if let Some(g) = grantees {
        let items: Vec<String> = g.grantees.iter().map(render_grantee).collect();
        let _ = write!(out, " GRANTEES {}", items.join(", "));
        if !g.except.is_empty() {
            let except: Vec<String> = g.except.iter().map(render_grantee).collect();
            let _ = write!(out, " EXCEPT {}", except.join(", "));
        }
    }
    if !settings.is_empty() {
        let _ = write!(out, " SETTINGS {}", render_settings(settings));
    }
}

fn render_identification(id: &Identification) -> String {
    match id {
        Identification::NoPassword => "NOT IDENTIFIED".to_string(),
        Identification::PlaintextPassword(p) => {
            format!("IDENTIFIED WITH plaintext_password BY {}", string_lit(p))
        }
        Identification::Sha256Password(p) => format!("IDENTIFIED WITH sha256_password BY {}", string_lit(p)),
        Identification::Sha256Hash { hash, salt } => {
            let mut out = format!("IDENTIFIED WITH sha256_hash BY {}", string_lit(hash));
            if let Some(s) = salt {
                let _ = write!(out, " SALT {}", string_lit(s));
            }
            out
        }
        Identification::DoubleSha1Password(p) => {
            format!("IDENTIFIED WITH double_sha1_password BY {}", string_lit(p))
        }
        Identification::DoubleSha1Hash(h) => format!("IDENTIFIED WITH double_sha1_hash BY {}", string_lit(h)),
        Identification::BcryptPassword(p) => format!("IDENTIFIED WITH bcrypt_password BY {}", string_lit(p)),
        Identification::BcryptHash(h) => format!("IDENTIFIED WITH bcrypt_hash BY {}", string_lit(h)),
        Identification::Ldap { server } => format!("IDENTIFIED WITH ldap SERVER {}", string_lit(server)),
        Identification::Kerberos { realm } => match realm {
            Some(r) => format!("IDENTIFIED WITH kerberos REALM {}", string_lit(r)),
            None => "IDENTIFIED WITH kerberos".to_string(),
        },
        Identification::SslCertificate { common_names } => {
            let names: Vec<String> = common_names.iter().map(|n| string_lit(n)).collect();
            format!("IDENTIFIED WITH ssl_certificate CN {}", names.join(", "))
        }
    }
}

fn render_host(h: &HostClause) -> String {
    match h {
        HostClause::Any => "ANY".to_string(),
        HostClause::None => "NONE".to_string(),
        HostClause::Local => "LOCAL".to_string(),
        HostClause::Ip(v) => format!("IP {}", string_lit(v)),
        HostClause::Like(v) => format!("LIKE {}", string_lit(v)),
        HostClause::Name(v) => format!("NAME {}", string_lit(v)),
        HostClause::Regexp(v) => format!("REGEXP {}", string_lit(v)),
    }
}

fn render_grantee(g: &GranteeItem) -> String {
    match g {
        GranteeItem::Any => "ANY".to_string(),
        GranteeItem::None => "NONE".to_string(),
        GranteeItem::Named(name) => name.to_string(),
    }
}

// ---------------------------------------------------------------------------
// SELECT

pub fn render_select(q: &SelectQuery) -> String {
    let mut out = render_select_body(&q.body);
    for (all, body) in &q.unions {
        out.push_str(if *all { " UNION ALL " } else { " UNION DISTINCT " });
        out.push_str(&render_select_body(body));
    }
    out
}

fn render_select_body(b: &SelectBody) -> String {
    let mut out = String::new();
    if !b.with.is_empty() {
        let items: Vec<String> = b
            .with
            .iter()
            .map(|c| match c {
                CteItem::Query { name, query } => format!("{name} AS ({})", render_select(query)),
                CteItem::Scalar { expr, alias } => format!("{} AS {alias}", render_expr(expr)),
            })
            .collect();
        let _ = write!(out, "WITH {} ", items.join(", "));
    }
    out.push_str("SELECT ");
    if b.distinct {
        out.push_str("DISTINCT ");
    }
    let items: Vec<String> = b
        .items
        .iter()
        .map(|i| match i {
            SelectItem::Wildcard => "*".to_string(),
            SelectItem::QualifiedWildcard(name) => format!("{name}.*"),
            SelectItem::Expr { expr, alias } => match alias {
                Some(a) => format!("{} AS {a}", render_expr(expr)),
                None => render_expr(expr),
            },
        })
        .collect();
    out.push_str(&items.join(", "));
    if let Some(from) = &b.from {
        let _ = write!(out, " FROM {}", render_table_factor(&from.base));
        for j in &from.joins {
            let kw = match j.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
                JoinKind::Right => "RIGHT JOIN",
                JoinKind::Full => "FULL JOIN",
                JoinKind::Cross => "CROSS JOIN",
            };
            let _ = write!(out, " {kw} {}", render_table_factor(&j.factor));
            match &j.constraint {
                JoinConstraint::On(x) => {
                    let _ = write!(out, " ON {}", render_expr(x));
                }
                JoinConstraint::Using(cols) => {
                    let _ = write!(out, " USING ({})", ident_list(cols));
                }
                JoinConstraint::None => {}
            }
        }
    }
    if let Some(x) = &b.where_clause {
        let _ = write!(out, " WHERE {}", render_expr(x));
    }
    if !b.group_by.is_empty() {
        let _ = write!(out, " GROUP BY {}", expr_list(&b.group_by));
    }
    if let Some(x) = &b.having {
        let _ = write!(out, " HAVING {}", render_expr(x));
    }
    if !b.order_by.is_empty() {
        let items: Vec<String> = b.order_by.iter().map(render_order_expr).collect();
        let _ = write!(out, " ORDER BY {}", items.join(", "));
    }
    if let Some(l) = &b.limit {
        let _ = write!(out, " LIMIT {}", render_expr(&l.limit));
        if let Some(o) = &l.offset {
            let _ = write!(out, " OFFSET {}", render_expr(o));
        }
    }
    if !b.settings.is_empty() {
        let _ = write!(out, " SETTINGS {}", render_settings(&b.settings));
    }
    out
}

fn render_table_factor(f: &TableFactor) -> String {
    match f {
        TableFactor::Table { name, final_mod, alias } => {
            let mut out = name.to_string();
            if *final_mod {
                out.push_str(" FINAL");
            }
            if let Some(a) = alias {
                let _ = write!(out, " AS {a}");
            }
            out
        }
        TableFactor::Function { name, args, alias } => {
            let mut out = format!("{name}({})", expr_list(args));
            if let Some(a) = alias {
                let _ = write!(out, " AS {a}");
            }
            out
        }
        TableFactor::Subquery { query, alias } => {
            let mut out = format!("({})", render_select(query));
            if let Some(a) = alias {
                let _ = write!(out, " AS {a}");
            }
            out
        }
    }
}

fn render_order_expr(o: &OrderExpr) -> String {
    if o.desc {
        format!("{} DESC", render_expr(&o.expr))
    } else {
        render_expr(&o.expr)
    }
}

pub fn render_settings(settings: &[Setting]) -> String {
    settings
        .iter()
        .map(|s| format!("{} = {}", s.name, render_expr(&s.value)))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Expressions

/// Binding strength used to decide parenthesization; mirrors the parser's
/// precedence ladder.
fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::Binary { op, .. } => match op {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq
            | BinOp::NotEq
            | BinOp::Lt
            | BinOp::Gt
            | BinOp::LtEq
            | BinOp::GtEq
            | BinOp::Like
            | BinOp::NotLike
            | BinOp::ILike => 4,
            BinOp::Plus | BinOp::Minus | BinOp::Concat => 5,
            BinOp::Multiply | BinOp::Divide | BinOp::Modulo => 6,
        },
        Expr::Not(_) => 3,
        Expr::IsNull { .. } | Expr::InList { .. } | Expr::InQuery { .. } | Expr::Between { .. } => 4,
        Expr::Unary { .. } => 7,
        Expr::Lambda { .. } => 0,
        _ => 8,
    }
}

pub fn render_expr(e: &Expr) -> String {
    match e {
        Expr::Literal(l) => render_literal(l),
        Expr::Identifier(parts) => parts.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("."),
        Expr::Wildcard => "*".to_string(),
        Expr::Function(f) => render_function(f),
        Expr::Unary { op, expr } => {
            let sym = match op {
                UnaryOp::Plus => "+",
                UnaryOp::Minus => "-",
            };
            format!("{sym}{}", child(expr, 7))
        }
        Expr::Binary { left, op, right } => {
            let prec = precedence(e);
            format!("{} {} {}", child_left(left, prec), op.symbol(), child(right, prec))
        }
        Expr::Not(inner) => format!("NOT {}", child_left(inner, 4)),
        Expr::IsNull { expr, negated } => {
            let kw = if *negated { "IS NOT NULL" } else { "IS NULL" };
            format!("{} {kw}", child_left(expr, 5))
        }
        Expr::InList { expr, list, negated } => {
            let kw = if *negated { "NOT IN" } else { "IN" };
            format!("{} {kw} ({})", child_left(expr, 5), expr_list(list))
        }
        Expr::InQuery { expr, query, negated } => {
            let kw = if *negated { "NOT IN" } else { "IN" };
            format!("{} {kw} ({})", child_left(expr, 5), render_select(query))
        }
        Expr::Between { expr, low, high, negated } => {
            let kw = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
            format!("{} {kw} {} AND {}", child_left(expr, 5), child(low, 5), child(high, 5))
        }
        Expr::Array(items) => format!("[{}]", expr_list(items)),
        Expr::Tuple(items) => format!("({})", expr_list(items)),
        Expr::Cast { expr, data_type } => format!("CAST({} AS {})", render_expr(expr), render_data_type(data_type)),
        Expr::Case { operand, branches, else_expr } => {
            let mut out = String::from("CASE");
            if let Some(op) = operand {
                let _ = write!(out, " {}", render_expr(op));
            }
            for (cond, value) in branches {
                let _ = write!(out, " WHEN {} THEN {}", render_expr(cond), render_expr(value));
            }
            if let Some(x) = else_expr {
                let _ = write!(out, " ELSE {}", render_expr(x));
            }
            out.push_str(" END");
            out
        }
        Expr::Interval { value, unit } => format!("INTERVAL {} {unit}", child(value, 7)),
        Expr::Extract { unit, expr } => format!("EXTRACT({unit} FROM {})", render_expr(expr)),
        Expr::Lambda { params, body } => {
            if params.len() == 1 {
                format!("{} -> {}", params[0], render_expr(body))
            } else {
                let names: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                format!("({}) -> {}", names.join(", "), render_expr(body))
            }
        }
        Expr::Subquery(q) => format!("({})", render_select(q)),
        Expr::Index { base, index } => format!("{}[{}]", child(base, 8), render_expr(index)),
    }
}

/// Left operand of a left-associative operator keeps equal precedence bare.
fn child_left(e: &Expr, parent_prec: u8) -> String {
    if precedence(e) < parent_prec {
        format!("({})", render_expr(e))
    } else {
        render_expr(e)
    }
}

/// Right operands and unary bodies need parens at equal precedence too.
fn child(e: &Expr, parent_prec: u8) -> String {
    if precedence(e) <= parent_prec && precedence(e) < 8 {
        format!("({})", render_expr(e))
    } else {
        render_expr(e)
    }
}

fn render_function(f: &FunctionCall) -> String {
    let mut out = f.name.clone();
    if let Some(params) = &f.params {
        let _ = write!(out, "({})", expr_list(params));
    }
    out.push('(');
    if f.distinct {
        out.push_str("DISTINCT ");
    }
    out.push_str(&expr_list(&f.args));
    out.push(')');
    if let Some(over) = &f.over {
        out.push_str(" OVER (");
        let mut clauses: Vec<String> = Vec::new();
        if !over.partition_by.is_empty() {
            clauses.push(format!("PARTITION BY {}", expr_list(&over.partition_by)));
        }
        if !over.order_by.is_empty() {
            let items: Vec<String> = over.order_by.iter().map(render_order_expr).collect();
            clauses.push(format!("ORDER BY {}", items.join(", ")));
        }
        out.push_str(&clauses.join(" "));
        out.push(')');
    }
    out
}

fn expr_list(items: &[Expr]) -> String {
    items.iter().map(render_expr).collect::<Vec<_>>().join(", ")
}

pub fn render_literal(l: &Literal) -> String {
    match l {
        Literal::String(s) => string_lit(s),
        Literal::Number(n) => n.clone(),
        Literal::Bool(true) => "true".to_string(),
        Literal::Bool(false) => "false".to_string(),
        Literal::Null => "NULL".to_string(),
    }
}

pub fn string_lit(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r");
    format!("'{escaped}'")
}

// ---------------------------------------------------------------------------
// Data types

pub fn render_data_type(t: &DataType) -> String {
    match t {
        DataType::Simple { name, params } => {
            if params.is_empty() {
                name.clone()
            } else {
                let rendered: Vec<String> = params
                    .iter()
                    .map(|p| match p {
                        TypeParam::Type(inner) => render_data_type(inner),
                        TypeParam::Expr(x) => render_expr(x),
                    })
                    .collect();
                format!("{name}({})", rendered.join(", "))
            }
        }
        DataType::Nullable(inner) => format!("Nullable({})", render_data_type(inner)),
        DataType::Array(inner) => format!("Array({})", render_data_type(inner)),
        DataType::Map(k, v) => format!("Map({}, {})", render_data_type(k), render_data_type(v)),
        DataType::Tuple(elements) => {
            let rendered: Vec<String> = elements
                .iter()
                .map(|e| match &e.name {
                    Some(name) => format!("{name} {}", render_data_type(&e.data_type)),
                    None => render_data_type(&e.data_type),
                })
                .collect();
            format!("Tuple({})", rendered.join(", "))
        }
        DataType::Nested(columns) => {
            let rendered: Vec<String> = columns
                .iter()
                .map(|c| format!("{} {}", c.name, render_data_type(&c.data_type)))
                .collect();
            format!("Nested({})", rendered.join(", "))
        }
        DataType::LowCardinality(inner) => format!("LowCardinality({})", render_data_type(inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn roundtrip(sql: &str) {
        let first = parse(sql).expect("first parse");
        let rendered = render_statements(&first);
        let second = parse(&rendered).unwrap_or_else(|e| panic!("reparse of `{rendered}` failed: {e}"));
        assert_eq!(first, second, "round-trip drifted for `{sql}`\nrendered: {rendered}");
    }

    #[test]
    fn roundtrip_create_table() {
        roundtrip(
            "CREATE TABLE a.events (id UInt64, name String DEFAULT 'x', ts DateTime CODEC(Delta, ZSTD(3)) TTL ts + INTERVAL 30 DAY COMMENT 'when') ENGINE = MergeTree() ORDER BY id PARTITION BY toYYYYMM(ts) SETTINGS index_granularity = 8192 COMMENT 'events';",
        );
    }

    #[test]
    fn roundtrip_expressions() {
        roundtrip("SELECT a + b * c, (a + b) * c, -x, NOT (a OR b), quantile(0.9)(v) FROM t;");
        roundtrip("SELECT CASE WHEN x > 0 THEN 1 ELSE 0 END, CAST(x AS UInt64), x::String FROM t;");
        roundtrip("SELECT arrayMap(x -> x * 2, values), v[1], EXTRACT(YEAR FROM ts) FROM t;");
    }

    #[test]
    fn roundtrip_comments() {
        let sql = "-- leading note\nCREATE DATABASE a;\n\n-- standalone note\n\nCREATE DATABASE b; -- trailing";
        let first = parse(sql).expect("parse");
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].leading.len(), 1);
        assert!(matches!(first[1].kind, StatementKind::Comment(_)));
        assert!(first[2].trailing.is_some());
        let rendered = render_statements(&first);
        let second = parse(&rendered).expect("reparse");
        assert_eq!(first, second);
    }

    #[test]
    fn roundtrip_dictionary() {
        roundtrip(
            "CREATE DICTIONARY a.lookup (id UInt64, label String DEFAULT 'n/a' INJECTIVE) PRIMARY KEY id SOURCE(CLICKHOUSE(TABLE 'src' DB 'a')) LAYOUT(HASHED()) LIFETIME(MIN 60 MAX 600);",
        );
    }

    #[test]
    fn roundtrip_view_and_mv() {
        roundtrip("CREATE VIEW a.v AS SELECT id, name FROM a.t WHERE id > 0;");
        roundtrip(
            "CREATE MATERIALIZED VIEW a.mv TO a.agg AS SELECT id, count(*) AS n FROM a.t GROUP BY id;",
        );
        roundtrip(
            "CREATE MATERIALIZED VIEW a.mv2 ENGINE = SummingMergeTree() ORDER BY id POPULATE AS SELECT id, sum(v) AS s FROM a.t GROUP BY id;",
        );
    }

    #[test]
    fn roundtrip_access_control() {
        roundtrip("CREATE ROLE reader SETTINGS max_memory_usage = 10000;");
        roundtrip("GRANT SELECT, INSERT ON analytics.* TO reader WITH GRANT OPTION;");
        roundtrip("GRANT reader TO alice, bob WITH ADMIN OPTION;");
        roundtrip("REVOKE SELECT(id, name) ON analytics.events FROM reader;");
        roundtrip("SET DEFAULT ROLE ALL EXCEPT reader TO alice;");
    }

    #[test]
    fn roundtrip_user() {
        roundtrip(
            "CREATE USER alice IDENTIFIED WITH sha256_password BY 'secret' HOST IP '10.0.0.0/8', NAME 'host.example' VALID UNTIL '2027-01-01' DEFAULT ROLE reader DEFAULT DATABASE analytics GRANTEES ANY EXCEPT bob SETTINGS max_threads = 4;",
        );
    }

    #[test]
    fn roundtrip_function_and_collection() {
        roundtrip("CREATE FUNCTION linear AS (x, k, b) -> k * x + b;");
        roundtrip(
            "CREATE NAMED COLLECTION s3_prod AS url = 'https://bucket.s3.amazonaws.com/' OVERRIDABLE, secret_access_key = 'key' NOT OVERRIDABLE;",
        );
        roundtrip("ALTER NAMED COLLECTION s3_prod SET url = 'https://other/' DELETE secret_access_key;");
    }

    #[test]
    fn roundtrip_quoted_identifiers() {
        roundtrip("CREATE TABLE `my db`.`weird name` (`select` String) ENGINE = Memory;");
    }

    #[test]
    fn number_spelling_is_preserved() {
        let stmts = parse("SELECT 0.50, 1e9, 0xFF;").expect("parse");
        let rendered = render_statements(&stmts);
        assert!(rendered.contains("0.50"), "decimal spelling kept: {rendered}");
        assert!(rendered.contains("1e9"), "exponent spelling kept: {rendered}");
        assert!(rendered.contains("0xFF"), "hex spelling kept: {rendered}");
    }
}
