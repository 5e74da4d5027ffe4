//! Unified application error model.
//! One enum covers every failure the toolchain reports: parse failures with
//! position and expected-token context, composer faults, planner validation
//! gates, revision-store integrity failures and database transport errors.
//! The CLI maps each variant onto a process exit code via `exit_code()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{file}:{line}:{column}: expected {}, found '{found}'\n  {context}", expected.join(" | "))]
    Parse {
        file: String,
        line: usize,
        column: usize,
        expected: Vec<String>,
        found: String,
        context: String,
    },

    #[error("import cycle: {}", chain.join(" -> "))]
    ImportCycle { chain: Vec<String> },

    #[error("duplicate definition of '{name}' (first at {first}, again at {second})")]
    DuplicateDefinition {
        name: String,
        first: String,
        second: String,
    },

    #[error("engine of '{name}' changed from {current} to {target}; engines are immutable, recreate the object manually")]
    EngineChange {
        name: String,
        current: String,
        target: String,
    },

    #[error("cluster of '{name}' changed from '{current}' to '{target}'; cluster placement is immutable")]
    ClusterChange {
        name: String,
        current: String,
        target: String,
    },

    #[error("'{name}' is a system object and cannot be modified")]
    SystemObjectModification { name: String },

    #[error("dictionary '{name}' cannot be altered in place: {reason}")]
    UnsupportedDictionaryAlter { name: String, reason: String },

    #[error("column '{column}' of '{name}': incompatible type change {current} -> {target}")]
    IncompatibleTypeChange {
        name: String,
        column: String,
        current: String,
        target: String,
    },

    #[error("migration {version}: statement {index} hash mismatch (stored {expected}, file {actual}); refusing to continue")]
    HashMismatch {
        version: String,
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("migration {version}: statement count mismatch (stored {expected}, file {actual})")]
    CountMismatch {
        version: String,
        expected: usize,
        actual: usize,
    },

    #[error("database error: {message}")]
    Database { message: String },

    #[error("canceled")]
    Canceled,

    #[error("{message}")]
    Config { message: String },

    /// Batch of planner validation failures. The planner never emits a
    /// partial plan alongside these.
    #[error("{} validation error(s):\n{}", errors.len(), errors.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Validation { errors: Vec<AppError> },
}

impl AppError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        AppError::Config { message: msg.into() }
    }

    pub fn database<S: Into<String>>(msg: S) -> Self {
        AppError::Database { message: msg.into() }
    }

    /// Map to the CLI exit-code contract: 1 user error, 2 database error,
    /// 3 integrity failure, 130 canceled.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Parse { .. }
            | AppError::ImportCycle { .. }
            | AppError::DuplicateDefinition { .. }
            | AppError::EngineChange { .. }
            | AppError::ClusterChange { .. }
            | AppError::SystemObjectModification { .. }
            | AppError::UnsupportedDictionaryAlter { .. }
            | AppError::IncompatibleTypeChange { .. }
            | AppError::Config { .. }
            | AppError::Validation { .. } => 1,
            AppError::Database { .. } => 2,
            AppError::HashMismatch { .. } | AppError::CountMismatch { .. } => 3,
            AppError::Canceled => 130,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Database { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_mapping() {
        let parse = AppError::Parse {
            file: "schema.sql".into(),
            line: 3,
            column: 9,
            expected: vec!["TABLE".into(), "DATABASE".into()],
            found: "TABEL".into(),
            context: "CREATE TABEL t".into(),
        };
        assert_eq!(parse.exit_code(), 1);
        assert_eq!(AppError::database("connection refused").exit_code(), 2);
        let mismatch = AppError::HashMismatch {
            version: "20240101000000".into(),
            index: 2,
            expected: "h1:aa".into(),
            actual: "h1:bb".into(),
        };
        assert_eq!(mismatch.exit_code(), 3);
        assert_eq!(AppError::Canceled.exit_code(), 130);
    }

    #[test]
    fn parse_error_names_position_and_expectations() {
        let err = AppError::Parse {
            file: "db.sql".into(),
            line: 12,
            column: 5,
            expected: vec!["ENGINE".into()],
            found: "ENGIN".into(),
            context: "ENGIN = MergeTree()".into(),
        };
        let text = err.to_string();
        assert!(text.contains("db.sql:12:5"), "position missing: {text}");
        assert!(text.contains("ENGINE"), "expected set missing: {text}");
    }

    #[test]
    fn validation_batch_lists_every_error() {
        let batch = AppError::Validation {
            errors: vec![
                AppError::EngineChange {
                    name: "a.t".into(),
                    current: "MergeTree".into(),
                    target: "ReplacingMergeTree".into(),
                },
                AppError::ClusterChange {
                    name: "a.u".into(),
                    current: "main".into(),
                    target: "other".into(),
                },
            ],
        };
        let text = batch.to_string();
        assert!(text.contains("2 validation error(s)"));
        assert!(text.contains("a.t"));
        assert!(text.contains("a.u"));
        assert_eq!(batch.exit_code(), 1);
    }
}
