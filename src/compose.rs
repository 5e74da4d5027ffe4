//! Import resolver. An `-- import <relative-path>` line inlines the named
//! file at that point, resolved relative to the importing file. Cycles
//! fail with the full chain; a second import of the same absolute path is
//! a no-op; source order is preserved within each file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::parser::{self, ast::Statement};

/// Compose an entrypoint into an ordered, file-attributed statement list.
pub fn compose(entrypoint: &Path) -> AppResult<Vec<(Statement, String)>> {
    let mut out = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack: Vec<PathBuf> = Vec::new();
    visit(entrypoint, &mut visited, &mut stack, &mut |stmts| out.extend(stmts))?;
    Ok(out)
}

/// Textual inlining of the same traversal; two invocations over an acyclic
/// import graph produce byte-identical output.
pub fn compose_text(entrypoint: &Path) -> AppResult<String> {
    let mut out = String::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack: Vec<PathBuf> = Vec::new();
    visit_text(entrypoint, &mut visited, &mut stack, &mut out)?;
    Ok(out)
}

fn canonical(path: &Path) -> AppResult<PathBuf> {
    Ok(path
        .absolutize()
        .map_err(|e| AppError::config(format!("cannot resolve {}: {e}", path.display())))?
        .into_owned())
}

fn read(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))
}

/// Split a file into (line-offset, text) segments separated by import
/// directives, keeping each segment's absolute line position.
fn segments(text: &str) -> Vec<(usize, String, Option<String>)> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut buf_start = 0usize;
    for (idx, line) in text.lines().enumerate() {
        if let Some(target) = parse_import_line(line) {
            out.push((buf_start, std::mem::take(&mut buf), Some(target)));
            buf_start = idx + 1;
        } else {
            buf.push_str(line);
            buf.push('\n');
        }
    }
    out.push((buf_start, buf, None));
    out
}

fn parse_import_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let body = trimmed.strip_prefix("--")?.trim();
    let target = body.strip_prefix("import ")?.trim();
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

fn visit(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
    stack: &mut Vec<PathBuf>,
    sink: &mut dyn FnMut(Vec<(Statement, String)>),
) -> AppResult<()> {
    let abs = canonical(path)?;
    if stack.contains(&abs) {
        let mut chain: Vec<String> = stack.iter().map(|p| p.display().to_string()).collect();
        chain.push(abs.display().to_string());
        return Err(AppError::ImportCycle { chain });
    }
    if !visited.insert(abs.clone()) {
        debug!(target: "chkeeper::compose", "skipping already-imported {}", abs.display());
        return Ok(());
    }
    stack.push(abs.clone());

    let text = read(&abs)?;
    let file_label = path.display().to_string();
    let dir = abs.parent().map(Path::to_path_buf).unwrap_or_default();

    for (offset, segment, import) in segments(&text) {
        if !segment.trim().is_empty() {
            // Pad with blank lines so error positions match the original file.
            let padded = format!("{}{}", "\n".repeat(offset), segment);
            let stmts = parser::parse_with_file(&padded, &file_label)?;
            sink(stmts.into_iter().map(|s| (s, file_label.clone())).collect());
        }
        if let Some(target) = import {
            visit(&dir.join(&target), visited, stack, sink)?;
        }
    }

    stack.pop();
    Ok(())
}

fn visit_text(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
    stack: &mut Vec<PathBuf>,
    out: &mut String,
) -> AppResult<()> {
    let abs = canonical(path)?;
    if stack.contains(&abs) {
        let mut chain: Vec<String> = stack.iter().map(|p| p.display().to_string()).collect();
        chain.push(abs.display().to_string());
        return Err(AppError::ImportCycle { chain });
    }
    if !visited.insert(abs.clone()) {
        return Ok(());
    }
    stack.push(abs.clone());
    let text = read(&abs)?;
    let dir = abs.parent().map(Path::to_path_buf).unwrap_or_default();
    for (_, segment, import) in segments(&text) {
        out.push_str(&segment);
        if let Some(target) = import {
            visit_text(&dir.join(&target), visited, stack, out)?;
        }
    }
    stack.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::StatementKind;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(&path, content).expect("write fixture");
        path
    }

    #[test]
    fn inlines_imports_in_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "db.sql", "CREATE DATABASE a;\n");
        write(tmp.path(), "tables/t.sql", "CREATE TABLE a.t (id UInt64) ENGINE = Memory;\n");
        let entry = write(
            tmp.path(),
            "main.sql",
            "-- import db.sql\n-- import tables/t.sql\nCREATE DATABASE z;\n",
        );
        let stmts = compose(&entry).expect("compose");
        let kinds: Vec<&StatementKind> = stmts.iter().map(|(s, _)| &s.kind).collect();
        assert_eq!(kinds.len(), 3);
        assert!(matches!(kinds[0], StatementKind::CreateDatabase(db) if db.name.as_str() == "a"));
        assert!(matches!(kinds[1], StatementKind::CreateTable(_)));
        assert!(matches!(kinds[2], StatementKind::CreateDatabase(db) if db.name.as_str() == "z"));
    }

    #[test]
    fn second_import_is_a_no_op() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "shared.sql", "CREATE DATABASE shared;\n");
        write(tmp.path(), "a.sql", "-- import shared.sql\nCREATE DATABASE a;\n");
        write(tmp.path(), "b.sql", "-- import shared.sql\nCREATE DATABASE b;\n");
        let entry = write(tmp.path(), "main.sql", "-- import a.sql\n-- import b.sql\n");
        let stmts = compose(&entry).expect("compose");
        let shared_count = stmts
            .iter()
            .filter(|(s, _)| matches!(&s.kind, StatementKind::CreateDatabase(db) if db.name.as_str() == "shared"))
            .count();
        assert_eq!(shared_count, 1, "deduplicated by absolute path");
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn cycle_is_reported_with_chain() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "x.sql", "-- import y.sql\n");
        let entry = write(tmp.path(), "y.sql", "-- import x.sql\n");
        let err = compose(&entry).expect_err("cycle must fail");
        match err {
            AppError::ImportCycle { chain } => {
                assert!(chain.len() >= 3);
                assert!(chain[0].ends_with("y.sql"));
                assert!(chain.last().expect("chain end").ends_with("y.sql"));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn resolution_is_relative_to_importing_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "sub/inner.sql", "-- import sibling.sql\n");
        write(tmp.path(), "sub/sibling.sql", "CREATE DATABASE sib;\n");
        let entry = write(tmp.path(), "main.sql", "-- import sub/inner.sql\n");
        let stmts = compose(&entry).expect("compose");
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn composition_is_deterministic() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "a.sql", "CREATE DATABASE a;\n");
        write(tmp.path(), "b.sql", "CREATE DATABASE b;\n");
        let entry = write(tmp.path(), "main.sql", "-- import a.sql\n-- import b.sql\nCREATE DATABASE c;\n");
        let first = compose_text(&entry).expect("first");
        let second = compose_text(&entry).expect("second");
        assert_eq!(first, second, "byte-identical across invocations");
        assert!(first.contains("CREATE DATABASE a"));
    }

    #[test]
    fn errors_name_the_imported_file_and_line() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "bad.sql", "CREATE DATABASE ok;\nCREATE TABEL broken;\n");
        let entry = write(tmp.path(), "main.sql", "-- import bad.sql\n");
        let err = compose(&entry).expect_err("must fail");
        match err {
            AppError::Parse { file, line, .. } => {
                assert!(file.ends_with("bad.sql"), "file was {file}");
                assert_eq!(line, 2);
            }
            other => panic!("{other:?}"),
        }
    }
}
