//! YAML configuration. A single `Config` drives every command: connection
//! URL, optional cluster, ignored databases, corpus entrypoint and the
//! migration directory. Environment variables override file values the
//! same way the server URL can be injected in CI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_CONFIG_FILE: &str = "chkeeper.yaml";

fn default_url() -> String {
    "http://localhost:8123".to_string()
}

fn default_entrypoint() -> PathBuf {
    PathBuf::from("db/main.sql")
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("db/migrations")
}

fn default_integration_engines() -> Vec<String> {
    ["Kafka", "RabbitMQ", "MySQL", "PostgreSQL", "S3", "URL", "JDBC", "ODBC", "MongoDB", "NATS"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// ClickHouse HTTP endpoint.
    #[serde(default = "default_url")]
    pub url: String,
    /// When set, every DDL head carries `ON CLUSTER` and extraction
    /// normalizes the clause away before diffing.
    #[serde(default)]
    pub cluster: Option<String>,
    /// Databases excluded from extraction and diffing, on top of the
    /// built-in system namespaces.
    #[serde(default)]
    pub ignore_databases: Vec<String>,
    /// Corpus entrypoint file.
    #[serde(default = "default_entrypoint")]
    pub entrypoint: PathBuf,
    /// Directory of versioned migration files.
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
    /// Table engines whose storage is external; any structural change to
    /// such a table is planned as drop + create.
    #[serde(default = "default_integration_engines")]
    pub integration_engines: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            url: default_url(),
            cluster: None,
            ignore_databases: Vec::new(),
            entrypoint: default_entrypoint(),
            migrations_dir: default_migrations_dir(),
            integration_engines: default_integration_engines(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> AppResult<Config> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read config {}: {e}", path.display())))?;
        let mut config: Config = serde_yaml::from_str(&text)
            .map_err(|e| AppError::config(format!("invalid config {}: {e}", path.display())))?;
        config.apply_env();
        Ok(config)
    }

    /// Load `path` when given, else the default file when present, else
    /// built-in defaults. Env overrides apply in every case.
    pub fn load_or_default(path: Option<&Path>) -> AppResult<Config> {
        match path {
            Some(p) => Config::load(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Config::load(default_path)
                } else {
                    let mut config = Config::default();
                    config.apply_env();
                    Ok(config)
                }
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("CHKEEPER_URL") {
            if !url.is_empty() {
                self.url = url;
            }
        }
        if let Ok(cluster) = std::env::var("CHKEEPER_CLUSTER") {
            if !cluster.is_empty() {
                self.cluster = Some(cluster);
            }
        }
    }

    pub fn is_integration_engine(&self, engine: &str) -> bool {
        self.integration_engines.iter().any(|e| e.eq_ignore_ascii_case(engine))
    }
}
