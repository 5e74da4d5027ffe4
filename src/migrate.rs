//! Migration files and their lifecycle: discovery from the migrations
//! directory, version stamping, plan-file generation from a computed
//! diff, and the executor/revision machinery in the submodules.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use regex::Regex;
use walkdir::WalkDir;

use crate::diff::Operation;
use crate::error::{AppError, AppResult};

pub mod executor;
pub mod hash;
pub mod revision;

#[cfg(test)]
mod tests;

/// One migration file: its version (from the file stem), the statement
/// list and a stable hash per statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub version: String,
    pub path: PathBuf,
    pub statements: Vec<String>,
    pub hashes: Vec<String>,
}

impl Migration {
    pub fn from_text(version: &str, path: &Path, text: &str) -> Migration {
        let statements = hash::split_statements(text);
        let hashes = statements.iter().map(|s| hash::statement_hash(s)).collect();
        Migration { version: version.to_string(), path: path.to_path_buf(), statements, hashes }
    }
}

fn version_pattern() -> Regex {
    Regex::new(r"^\d{14}(_[A-Za-z0-9_]+)?$").expect("static pattern")
}

/// Load every `<version>.sql` under `dir`, ordered by version. Files with
/// non-version names are rejected rather than silently skipped.
pub fn load_migrations(dir: &Path) -> AppResult<Vec<Migration>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let pattern = version_pattern();
    let mut out: Vec<Migration> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| AppError::config(format!("cannot read migrations dir: {e}")))?;
        let path = entry.path();
        if !path.is_file() || path.extension().map(|e| e != "sql").unwrap_or(true) {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if !pattern.is_match(stem) {
            return Err(AppError::config(format!(
                "migration file name '{}' is not '<YYYYMMDDHHMMSS[_suffix]>.sql'",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))?;
        out.push(Migration::from_text(stem, path, &text));
    }
    out.sort_by(|a, b| a.version.cmp(&b.version));
    for pair in out.windows(2) {
        if pair[0].version == pair[1].version {
            return Err(AppError::config(format!("duplicate migration version {}", pair[0].version)));
        }
    }
    Ok(out)
}

/// `YYYYMMDDHHMMSS` stamp for a newly generated migration.
pub fn version_stamp(now: NaiveDateTime) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// Write a plan into `<dir>/<version>.sql`: header comment, then each
/// operation's statements separated by `;`.
pub fn write_plan_file(dir: &Path, version: &str, summary: &str, ops: &[Operation]) -> AppResult<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| AppError::config(format!("cannot create {}: {e}", dir.display())))?;
    let path = dir.join(format!("{version}.sql"));
    if path.exists() {
        return Err(AppError::config(format!("{} already exists", path.display())));
    }
    let mut text = format!("-- version: {version}\n-- {summary}\n\n");
    for op in ops {
        for statement in &op.statements {
            text.push_str(statement);
            text.push_str(";\n\n");
        }
    }
    std::fs::write(&path, text).map_err(|e| AppError::config(format!("cannot write {}: {e}", path.display())))?;
    Ok(path)
}
