//! ClickHouse access over the HTTP interface. The `Database` trait is the
//! seam the extractor and executor work through; `HttpClient` is the real
//! implementation, tests substitute an in-memory one. The executor owns
//! the client exclusively for the duration of a run.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Cooperative cancellation, checked between statements (never within
/// one). Cloned handles share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub trait Database {
    /// Run a statement, discarding any result.
    fn exec(&self, sql: &str) -> impl Future<Output = AppResult<()>> + Send;

    /// Run a query and return rows of JSON values (JSONCompact shape).
    fn query_rows(&self, sql: &str) -> impl Future<Output = AppResult<Vec<Vec<serde_json::Value>>>> + Send;

    /// Connectivity probe.
    fn ping(&self) -> impl Future<Output = AppResult<()>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    base: Url,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CompactResponse {
    data: Vec<Vec<serde_json::Value>>,
}

impl HttpClient {
    pub fn new(url: &str) -> AppResult<Self> {
        Self::with_timeout(url, Duration::from_secs(600))
    }

    /// `timeout` bounds each statement round-trip.
    pub fn with_timeout(url: &str, timeout: Duration) -> AppResult<Self> {
        let base = Url::parse(url).map_err(|e| AppError::config(format!("invalid database URL '{url}': {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::database(e.to_string()))?;
        Ok(HttpClient { base, http })
    }

    async fn post(&self, sql: &str) -> AppResult<String> {
        debug!(target: "chkeeper::client", sql, "executing");
        let resp = self.http.post(self.base.clone()).body(sql.to_string()).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AppError::database(format!("HTTP {status}: {}", body.trim())));
        }
        Ok(body)
    }
}

impl Database for HttpClient {
    async fn exec(&self, sql: &str) -> AppResult<()> {
        self.post(sql).await.map(|_| ())
    }

    async fn query_rows(&self, sql: &str) -> AppResult<Vec<Vec<serde_json::Value>>> {
        let body = self.post(&format!("{sql} FORMAT JSONCompact")).await?;
        let parsed: CompactResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::database(format!("malformed JSONCompact response: {e}")))?;
        Ok(parsed.data)
    }

    async fn ping(&self) -> AppResult<()> {
        self.query_rows("SELECT 1").await.map(|_| ())
    }
}

/// Pull a plain string out of a JSONCompact cell; ClickHouse renders
/// UInt64 and friends as JSON strings.
pub fn cell_str(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn cell_u32(value: &serde_json::Value) -> AppResult<u32> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| AppError::database(format!("expected u32 cell, got {n}"))),
        serde_json::Value::String(s) => s
            .parse::<u32>()
            .map_err(|_| AppError::database(format!("expected u32 cell, got '{s}'"))),
        other => Err(AppError::database(format!("expected u32 cell, got {other}"))),
    }
}
