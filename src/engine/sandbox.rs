// src/engine/sandbox.rs

use std::{
    future::Future,
    str::FromStr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use futures::TryStreamExt;
use sqlx::{
    ConnectOptions, Connection, Either, Executor, SqliteConnection, sqlite::SqliteConnectOptions,
};

use super::{evaluator::ExecutionLimits, value::Row};

/// Number of SQLite virtual machine steps between deadline checks.
const PROGRESS_INTERVAL_OPS: i32 = 1_000;

/// Extra time the async backstop waits past the deadline before abandoning
/// a statement the progress handler failed to stop.
const BACKSTOP_GRACE: Duration = Duration::from_millis(250);

const MULTIPLE_STATEMENTS: &str = "You can only execute one statement at a time.";

/// Why a single execution stage did not produce a result.
#[derive(Debug, Clone, PartialEq)]
pub enum StageError {
    /// The storage engine rejected the SQL; carries its native message.
    Failed(String),

    /// The stage ran past its execution limit and was interrupted.
    TimedOut(Duration),

    /// The query produced more rows than a single result may hold.
    RowLimit(usize),
}

impl StageError {
    pub fn detail(&self) -> String {
        match self {
            StageError::Failed(msg) => msg.clone(),
            StageError::TimedOut(limit) => {
                format!("execution exceeded the {} ms limit", limit.as_millis())
            }
            StageError::RowLimit(max) => format!("result exceeded the {} row limit", max),
        }
    }
}

/// Failure of one batch of SQL, before the deadline is taken into account.
#[derive(Debug)]
pub(crate) enum ExecError {
    Engine(sqlx::Error),
    MultipleStatements,
    TooManyRows(usize),
}

impl From<sqlx::Error> for ExecError {
    fn from(err: sqlx::Error) -> Self {
        ExecError::Engine(err)
    }
}

/// Interrupts statements on one connection once the armed deadline passes.
///
/// The SQLite progress handler polls the shared deadline; an unarmed watchdog
/// never interrupts anything.
#[derive(Debug, Clone, Default)]
pub(crate) struct Watchdog {
    deadline: Arc<Mutex<Option<Instant>>>,
}

impl Watchdog {
    pub(crate) async fn install(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        let deadline = Arc::clone(&self.deadline);
        let mut handle = conn.lock_handle().await?;
        handle.set_progress_handler(PROGRESS_INTERVAL_OPS, move || match deadline.lock() {
            Ok(armed) => armed.is_none_or(|at| Instant::now() < at),
            Err(_) => false,
        });
        Ok(())
    }

    pub(crate) async fn uninstall(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        let mut handle = conn.lock_handle().await?;
        handle.remove_progress_handler();
        Ok(())
    }

    fn arm(&self, limit: Duration) {
        if let Ok(mut armed) = self.deadline.lock() {
            *armed = Some(Instant::now() + limit);
        }
    }

    /// Clears the deadline, reporting whether it had already passed.
    fn disarm(&self) -> bool {
        match self.deadline.lock() {
            Ok(mut armed) => armed.take().is_some_and(|at| Instant::now() >= at),
            Err(_) => true,
        }
    }

    /// Runs one stage under `limit`.
    ///
    /// An engine error raised after the deadline is the interrupt itself and is
    /// reported as a timeout rather than a failure.
    pub(crate) async fn run<T, F>(&self, limit: Duration, stage: F) -> Result<T, StageError>
    where
        F: Future<Output = Result<T, ExecError>>,
    {
        self.arm(limit);
        let outcome = tokio::time::timeout(limit + BACKSTOP_GRACE, stage).await;
        let expired = self.disarm();

        match outcome {
            Err(_) => Err(StageError::TimedOut(limit)),
            Ok(Err(ExecError::Engine(_))) if expired => Err(StageError::TimedOut(limit)),
            Ok(Err(ExecError::Engine(e))) => Err(StageError::Failed(engine_message(&e))),
            Ok(Err(ExecError::MultipleStatements)) => {
                Err(StageError::Failed(MULTIPLE_STATEMENTS.to_string()))
            }
            Ok(Err(ExecError::TooManyRows(max))) => Err(StageError::RowLimit(max)),
            Ok(Ok(value)) => Ok(value),
        }
    }
}

/// The storage engine's own wording for a failure, without sqlx's wrapping.
pub(crate) fn engine_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

/// Executes a single statement and decodes at most `max_rows` of its rows.
///
/// Text holding more than one statement is rejected as soon as the second
/// one produces anything.
pub(crate) async fn fetch_rows(
    conn: &mut SqliteConnection,
    sql: &str,
    max_rows: usize,
) -> Result<Vec<Row>, ExecError> {
    let mut results = Executor::fetch_many(&mut *conn, sqlx::raw_sql(sql));
    let mut rows = Vec::new();
    let mut finished = false;

    while let Some(step) = results.try_next().await? {
        if finished {
            return Err(ExecError::MultipleStatements);
        }
        match step {
            Either::Left(_) => finished = true,
            Either::Right(_) if rows.len() == max_rows => {
                return Err(ExecError::TooManyRows(max_rows));
            }
            Either::Right(row) => rows.push(Row::from_sqlite(&row)?),
        }
    }

    Ok(rows)
}

/// Executes every statement of a script, discarding any rows.
async fn run_script(conn: &mut SqliteConnection, sql: &str) -> Result<(), sqlx::Error> {
    Executor::execute(&mut *conn, sqlx::raw_sql(sql)).await.map(|_| ())
}

/// A private in-memory database that lives for exactly one evaluation.
///
/// Never pooled, never reused. Dropping it closes the connection, which
/// discards the database; `teardown` does the same and waits for it.
pub struct EphemeralDatabase {
    conn: SqliteConnection,
    watchdog: Watchdog,
    limits: ExecutionLimits,
}

impl EphemeralDatabase {
    /// Opens a fresh, empty database whose stages each run under `limits`.
    pub async fn provision(limits: ExecutionLimits) -> Result<Self, sqlx::Error> {
        // Each parse of `sqlite::memory:` yields a uniquely named database, so
        // no two instances can observe one another.
        let mut conn = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(false)
            .disable_statement_logging()
            .connect()
            .await?;

        let watchdog = Watchdog::default();
        watchdog.install(&mut conn).await?;

        Ok(Self {
            conn,
            watchdog,
            limits,
        })
    }

    /// Runs a multi-statement DDL/DML script.
    pub async fn apply_script(&mut self, script: &str) -> Result<(), StageError> {
        let conn = &mut self.conn;
        self.watchdog
            .run(self.limits.stage_timeout, async move {
                run_script(conn, script).await.map_err(ExecError::from)
            })
            .await
    }

    /// Forbids further writes to the database contents.
    pub async fn lock_contents(&mut self) -> Result<(), StageError> {
        run_script(&mut self.conn, "PRAGMA query_only = ON")
            .await
            .map_err(|e| StageError::Failed(engine_message(&e)))
    }

    /// Runs one query against the current contents.
    pub async fn query(&mut self, sql: &str) -> Result<Vec<Row>, StageError> {
        let ExecutionLimits {
            stage_timeout,
            max_rows,
            ..
        } = self.limits;
        self.watchdog
            .run(stage_timeout, fetch_rows(&mut self.conn, sql, max_rows))
            .await
    }

    /// Closes the connection, discarding every table and row.
    pub async fn teardown(self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!("Ephemeral database closed uncleanly: {}", e);
        }
    }
}
