//! Migration executor. Applies ordered migrations statement-by-statement,
//! advancing the revision row after every success, verifying stored
//! hashes before resuming, and stopping (with the error persisted) at the
//! first failure. Single-threaded by design: one outstanding statement,
//! cancellation checked only between statements.

use tracing::{info, warn};

use crate::client::{CancelToken, Database};
use crate::error::{AppError, AppResult};
use crate::migrate::revision::{Revision, RevisionBackend};
use crate::migrate::Migration;

#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// (version, statements applied this run)
    pub applied: Vec<(String, usize)>,
    /// Versions already complete.
    pub skipped: Vec<String>,
    /// Dry-run only: statements that would run, per version.
    pub pending: Vec<(String, Vec<String>)>,
}

pub async fn execute<D, R>(
    db: &D,
    store: &mut R,
    migrations: &[Migration],
    cancel: &CancelToken,
    dry_run: bool,
) -> AppResult<ExecutionReport>
where
    D: Database,
    R: RevisionBackend,
{
    verify_version_order(migrations)?;
    if !dry_run {
        store.ensure().await?;
    }

    let mut report = ExecutionReport::default();
    for migration in migrations {
        if cancel.is_canceled() {
            return Err(AppError::Canceled);
        }
        let existing = if dry_run {
            // A dry run issues no writes, including the store bootstrap;
            // an unreachable store reads as "nothing applied yet".
            store.get(&migration.version).await.unwrap_or(None)
        } else {
            store.get(&migration.version).await?
        };

        let mut rev = match existing {
            Some(rev) => rev,
            None => {
                let rev = Revision {
                    version: migration.version.clone(),
                    applied_count: 0,
                    total_count: migration.statements.len() as u32,
                    statement_hashes: migration.hashes.clone(),
                    error: None,
                    executed_at: None,
                };
                if !dry_run {
                    store.upsert(&rev).await?;
                }
                rev
            }
        };

        if rev.applied_count == rev.total_count && rev.error.is_none() {
            report.skipped.push(migration.version.clone());
            continue;
        }

        verify_resumable(&rev, migration)?;

        let start = rev.applied_count as usize;
        if dry_run {
            report
                .pending
                .push((migration.version.clone(), migration.statements[start..].to_vec()));
            continue;
        }

        info!(
            target: "chkeeper::migrate",
            version = %migration.version,
            resume_at = start,
            total = migration.statements.len(),
            "applying migration"
        );

        let mut ran = 0usize;
        for (index, statement) in migration.statements.iter().enumerate().skip(start) {
            if cancel.is_canceled() {
                // The revision row stays at the last success; the next
                // invocation resumes exactly here.
                warn!(target: "chkeeper::migrate", version = %migration.version, index, "canceled between statements");
                return Err(AppError::Canceled);
            }
            match db.exec(statement).await {
                Ok(()) => {
                    rev.applied_count = index as u32 + 1;
                    rev.error = None;
                    store.upsert(&rev).await?;
                    ran += 1;
                }
                Err(err) => {
                    let message = err.to_string();
                    warn!(target: "chkeeper::migrate", version = %migration.version, index, error = %message, "statement failed");
                    rev.error = Some(message);
                    store.upsert(&rev).await?;
                    return Err(err);
                }
            }
        }
        report.applied.push((migration.version.clone(), ran));
    }
    Ok(report)
}

/// Migrations must arrive lexicographically increasing by version.
fn verify_version_order(migrations: &[Migration]) -> AppResult<()> {
    for pair in migrations.windows(2) {
        if pair[0].version >= pair[1].version {
            return Err(AppError::config(format!(
                "migration sequence is not increasing: {} then {}",
                pair[0].version, pair[1].version
            )));
        }
    }
    Ok(())
}

/// Resume preconditions: stored counts are internally consistent, the
/// file still has the same statement count and every already-applied
/// statement still hashes the same.
fn verify_resumable(rev: &Revision, migration: &Migration) -> AppResult<()> {
    if rev.total_count as usize != migration.statements.len() {
        return Err(AppError::CountMismatch {
            version: migration.version.clone(),
            expected: rev.total_count as usize,
            actual: migration.statements.len(),
        });
    }
    if rev.statement_hashes.len() != rev.total_count as usize {
        return Err(AppError::CountMismatch {
            version: migration.version.clone(),
            expected: rev.total_count as usize,
            actual: rev.statement_hashes.len(),
        });
    }
    for index in 0..rev.applied_count as usize {
        if rev.statement_hashes[index] != migration.hashes[index] {
            return Err(AppError::HashMismatch {
                version: migration.version.clone(),
                index,
                expected: rev.statement_hashes[index].clone(),
                actual: migration.hashes[index].clone(),
            });
        }
    }
    Ok(())
}

/// Read-only view of where each migration stands.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionState {
    Pending,
    Partial { applied: u32, total: u32, error: Option<String> },
    Complete,
    HashDrift { index: usize },
}

pub async fn status<R: RevisionBackend>(store: &mut R, migrations: &[Migration]) -> AppResult<Vec<(String, VersionState)>> {
    let mut out = Vec::new();
    for migration in migrations {
        let state = match store.get(&migration.version).await.unwrap_or(None) {
            None => VersionState::Pending,
            Some(rev) => {
                let drift = rev
                    .statement_hashes
                    .iter()
                    .zip(&migration.hashes)
                    .position(|(stored, file)| stored != file);
                match drift {
                    Some(index) => VersionState::HashDrift { index },
                    None if rev.applied_count == rev.total_count && rev.error.is_none() => VersionState::Complete,
                    None => VersionState::Partial {
                        applied: rev.applied_count,
                        total: rev.total_count,
                        error: rev.error.clone(),
                    },
                }
            }
        };
        out.push((migration.version.clone(), state));
    }
    Ok(out)
}

/// Overwrite stored hashes for a completed version after a cosmetic edit
/// to its file. Refuses while a migration is anything but complete.
pub async fn rehash<R: RevisionBackend>(store: &mut R, migration: &Migration) -> AppResult<()> {
    let Some(mut rev) = store.get(&migration.version).await? else {
        return Err(AppError::config(format!("version {} has no revision row", migration.version)));
    };
    if rev.applied_count != rev.total_count || rev.error.is_some() {
        return Err(AppError::config(format!(
            "version {} is not complete ({}from {} of {}); rehash only applies to finished migrations",
            migration.version,
            rev.error.as_deref().map(|e| format!("failed: {e}; ")).unwrap_or_default(),
            rev.applied_count,
            rev.total_count
        )));
    }
    if rev.total_count as usize != migration.statements.len() {
        return Err(AppError::CountMismatch {
            version: migration.version.clone(),
            expected: rev.total_count as usize,
            actual: migration.statements.len(),
        });
    }
    rev.statement_hashes = migration.hashes.clone();
    store.upsert(&rev).await
}
