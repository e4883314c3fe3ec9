// src/engine/practice.rs

use std::{path::Path, time::Duration};

use sqlx::{
    ConnectOptions, Sqlite, SqlitePool,
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use super::{
    error::EngineError,
    evaluator::ExecutionLimits,
    fingerprint::{Fingerprint, fingerprint},
    sandbox::{StageError, Watchdog, engine_message, fetch_rows},
};

/// The shared practice database used for pre-computing reference fingerprints.
///
/// Opened read-only: the engine never writes to it, so concurrent readers need
/// no coordination beyond SQLite's own. Only bank-authored queries belong
/// here; untrusted candidate SQL goes through `Evaluator` instead.
#[derive(Debug, Clone)]
pub struct PracticeDatabase {
    pool: SqlitePool,
    stage_timeout: Duration,
    max_rows: usize,
}

impl PracticeDatabase {
    /// Opens an existing database file. A missing file is an error, never
    /// silently created.
    pub async fn open(path: impl AsRef<Path>, stage_timeout: Duration) -> Result<Self, EngineError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .read_only(true)
            .create_if_missing(false)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool, stage_timeout))
    }

    pub fn from_pool(pool: SqlitePool, stage_timeout: Duration) -> Self {
        Self {
            pool,
            stage_timeout,
            max_rows: ExecutionLimits::default().max_rows,
        }
    }

    /// Caps the rows a single query may return.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Runs a trusted query and returns only its fingerprint.
    pub async fn hash_only(&self, sql: &str) -> Result<Fingerprint, EngineError> {
        let mut conn = self.acquire().await?;

        let watchdog = Watchdog::default();
        watchdog.install(&mut conn).await?;
        let outcome = watchdog
            .run(self.stage_timeout, fetch_rows(&mut conn, sql, self.max_rows))
            .await;
        if let Err(e) = Watchdog::uninstall(&mut conn).await {
            // A connection left with a stale handler must not return to the pool.
            tracing::warn!("Failed to clear progress handler, detaching connection: {}", e);
            drop(conn.detach());
        }

        match outcome {
            Ok(rows) => Ok(fingerprint(&rows)),
            Err(StageError::TimedOut(limit)) => {
                tracing::warn!("Practice query timed out after {} ms", limit.as_millis());
                Err(EngineError::Timeout(limit))
            }
            Err(StageError::Failed(detail)) => Err(EngineError::Query(detail)),
            Err(e @ StageError::RowLimit(_)) => Err(EngineError::Query(e.detail())),
        }
    }

    /// Fingerprints a trusted query and compares it to a stored fingerprint.
    pub async fn matches(&self, sql: &str, expected: &Fingerprint) -> Result<bool, EngineError> {
        Ok(self.hash_only(sql).await? == *expected)
    }

    /// `CREATE` statements of every table and view, for display beside a
    /// practice question.
    pub async fn schema(&self) -> Result<String, EngineError> {
        let statements: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT sql
            FROM sqlite_master
            WHERE type IN ('table', 'view')
              AND sql IS NOT NULL
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::Query(engine_message(&e)))?;

        if statements.is_empty() {
            return Err(EngineError::Query("practice database has no tables".to_string()));
        }

        Ok(statements
            .iter()
            .map(|stmt| format!("{};", stmt.trim_end_matches(';')))
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    async fn acquire(&self) -> Result<PoolConnection<Sqlite>, EngineError> {
        self.pool.acquire().await.map_err(|e| {
            tracing::error!("Failed to acquire practice database connection: {:?}", e);
            EngineError::Provision(e)
        })
    }
}
