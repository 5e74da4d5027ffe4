//! Command-line surface: `schema dump`, `diff`, `migrate`, `status`,
//! `rehash`. Thin orchestration over the library; every command loads the
//! config, builds the HTTP client and maps failures onto the exit-code
//! contract in `AppError::exit_code`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::client::{CancelToken, Database, HttpClient};
use crate::compose;
use crate::config::Config;
use crate::diff;
use crate::error::{AppError, AppResult};
use crate::extract::{normalize_cluster, Extractor};
use crate::migrate::executor::{self, VersionState};
use crate::migrate::revision::RevisionStore;
use crate::migrate::{load_migrations, version_stamp, write_plan_file};
use crate::render;
use crate::schema::Schema;

#[derive(Parser)]
#[command(name = "chkeeper", version, about = "ClickHouse schema housekeeping: diff a DDL corpus against a live database and apply resumable migrations")]
pub struct Cli {
    /// Config file (default: chkeeper.yaml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// ClickHouse HTTP URL; overrides the config file.
    #[arg(long, global = true, env = "CHKEEPER_URL")]
    pub url: Option<String>,

    /// Cluster name; overrides the config file.
    #[arg(long, global = true)]
    pub cluster: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Corpus and live-schema inspection.
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },
    /// Print the plan that would bring the live database in line with the corpus.
    Diff,
    /// Generate a migration from the current diff (when any) and apply pending migrations.
    Migrate {
        /// Show what would run without writing anything.
        #[arg(long)]
        dry_run: bool,
        /// Only generate the migration file; do not apply.
        #[arg(long)]
        plan_only: bool,
    },
    /// Report where every migration stands in the revision store.
    Status,
    /// Re-adopt a completed migration's hashes after a cosmetic edit.
    Rehash {
        /// Version to rehash.
        version: String,
    },
}

#[derive(Subcommand)]
pub enum SchemaAction {
    /// Extract the live database and print canonical DDL.
    Dump,
}

pub async fn run(cli: Cli) -> AppResult<()> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(cluster) = &cli.cluster {
        config.cluster = Some(cluster.clone());
    }

    let client = HttpClient::new(&config.url)?;
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Command::Schema { action: SchemaAction::Dump } => {
            let schema = Extractor::new(&client, &config).extract().await?;
            print!("{}", dump_schema(&schema));
            Ok(())
        }
        Command::Diff => {
            let ops = compute_plan(&client, &config).await?;
            if ops.is_empty() {
                println!("schema is in sync; nothing to do");
                return Ok(());
            }
            for op in &ops {
                println!("-- {:?} {}", op.kind, op.name);
                for statement in &op.statements {
                    println!("{statement};");
                }
                println!();
            }
            Ok(())
        }
        Command::Migrate { dry_run, plan_only } => {
            let ops = compute_plan(&client, &config).await?;
            if !ops.is_empty() {
                let version = version_stamp(chrono::Utc::now().naive_utc());
                if dry_run {
                    println!("-- would write migration {version} with {} operation(s)", ops.len());
                } else {
                    let path = write_plan_file(&config.migrations_dir, &version, "generated by chkeeper migrate", &ops)?;
                    info!(target: "chkeeper", path = %path.display(), "migration written");
                    println!("wrote {}", path.display());
                }
            }
            if plan_only {
                return Ok(());
            }
            let migrations = load_migrations(&config.migrations_dir)?;
            let mut store = RevisionStore::new(&client);
            let report = executor::execute(&client, &mut store, &migrations, &cancel, dry_run).await?;
            for (version, ran) in &report.applied {
                println!("applied {version} ({ran} statement(s))");
            }
            for version in &report.skipped {
                println!("up-to-date {version}");
            }
            for (version, statements) in &report.pending {
                println!("pending {version}:");
                for statement in statements {
                    println!("  {};", crate::migrate::hash::normalize(statement));
                }
            }
            Ok(())
        }
        Command::Status => {
            let migrations = load_migrations(&config.migrations_dir)?;
            let mut store = RevisionStore::new(&client);
            let states = executor::status(&mut store, &migrations).await?;
            for (version, state) in states {
                match state {
                    VersionState::Complete => println!("{version}  complete"),
                    VersionState::Pending => println!("{version}  pending"),
                    VersionState::Partial { applied, total, error } => match error {
                        Some(e) => println!("{version}  partial {applied}/{total} (last error: {e})"),
                        None => println!("{version}  partial {applied}/{total}"),
                    },
                    VersionState::HashDrift { index } => {
                        println!("{version}  HASH DRIFT at statement {index}; run `chkeeper rehash {version}` if the edit was cosmetic")
                    }
                }
            }
            Ok(())
        }
        Command::Rehash { version } => {
            let migrations = load_migrations(&config.migrations_dir)?;
            let migration = migrations
                .iter()
                .find(|m| m.version == version)
                .ok_or_else(|| AppError::config(format!("no migration file for version {version}")))?;
            let mut store = RevisionStore::new(&client);
            executor::rehash(&mut store, migration).await?;
            println!("rehashed {version}");
            Ok(())
        }
    }
}

/// Compose the corpus, extract the live side and plan.
async fn compute_plan<D: Database + Sync>(db: &D, config: &Config) -> AppResult<Vec<diff::Operation>> {
    let stmts = compose::compose(&config.entrypoint)?;
    let target = Schema::build(stmts.into_iter().map(|(s, site)| (s, site)))?
        .without_databases(&config.ignore_databases);
    let target = normalize_cluster(target, config.cluster.as_deref());
    let current = Extractor::new(db, config).extract().await?;
    diff::plan(&target, &current, config)
}

/// Canonical DDL for a whole schema, in the planner's forward order.
pub fn dump_schema(schema: &Schema) -> String {
    use crate::parser::ast::StatementKind;
    let mut out = String::new();
    let mut push = |kind: StatementKind| {
        out.push_str(&render::render_kind(&kind));
        out.push_str(";\n\n");
    };
    for role in schema.roles.values() {
        push(StatementKind::CreateRole(crate::parser::ast::CreateRole {
            or_replace: false,
            if_not_exists: false,
            names: vec![role.name.clone()],
            cluster: role.cluster.clone(),
            settings: role.settings.clone(),
        }));
    }
    for user in schema.users.values() {
        push(StatementKind::CreateUser(user.clone()));
    }
    for grant in &schema.grants {
        push(StatementKind::Grant(grant.clone()));
    }
    for function in schema.functions.values() {
        push(StatementKind::CreateFunction(function.clone()));
    }
    for db in schema.databases.values() {
        push(StatementKind::CreateDatabase(db.clone()));
    }
    for collection in schema.collections.values() {
        push(StatementKind::CreateNamedCollection(collection.clone()));
    }
    for table in schema.tables.values() {
        push(StatementKind::CreateTable(table.clone()));
    }
    for dictionary in schema.dictionaries.values() {
        push(StatementKind::CreateDictionary(dictionary.clone()));
    }
    for view in schema.views.values() {
        push(StatementKind::CreateView(view.clone()));
    }
    out
}
