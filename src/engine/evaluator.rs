// src/engine/evaluator.rs

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Semaphore;

use super::{
    error::EngineError,
    fingerprint::fingerprint,
    sandbox::{EphemeralDatabase, StageError},
};
use crate::models::verdict::Verdict;

/// Bounds on how much work one evaluation, and all of them together, may do.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionLimits {
    /// Deadline for each of setup, candidate and reference execution.
    pub stage_timeout: Duration,

    /// Evaluations allowed to hold a database at the same time.
    pub max_concurrent: usize,

    /// Rows a single query result may hold before it is abandoned.
    pub max_rows: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(2),
            max_concurrent: 8,
            max_rows: 10_000,
        }
    }
}

/// One grading attempt: the schema to build, the trusted answer and the
/// learner's submission.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub setup_script: String,
    pub reference_query: String,
    pub candidate_query: String,
}

impl EvaluationRequest {
    pub fn new(
        setup_script: impl Into<String>,
        reference_query: impl Into<String>,
        candidate_query: impl Into<String>,
    ) -> Self {
        Self {
            setup_script: setup_script.into(),
            reference_query: reference_query.into(),
            candidate_query: candidate_query.into(),
        }
    }
}

/// Grades candidate queries, each inside its own throwaway database.
///
/// Cheap to clone; clones share the concurrency budget.
#[derive(Debug, Clone)]
pub struct Evaluator {
    limits: ExecutionLimits,
    permits: Arc<Semaphore>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(ExecutionLimits::default())
    }
}

impl Evaluator {
    pub fn new(limits: ExecutionLimits) -> Self {
        Self {
            limits,
            permits: Arc::new(Semaphore::new(limits.max_concurrent.max(1))),
        }
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    /// Stops accepting work. Evaluations already holding a database finish;
    /// later calls fail with `EngineError::Unavailable`.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Provisions a fresh database, runs setup, reference and candidate, and
    /// classifies the outcome.
    ///
    /// Only infrastructure failures (no database could be provisioned) are
    /// returned as `Err`; every grading result is a `Verdict`. The database is
    /// torn down before this returns, whatever the outcome.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<Verdict, EngineError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| EngineError::Unavailable)?;

        let started = Instant::now();
        let mut db = EphemeralDatabase::provision(self.limits)
            .await
            .map_err(|e| {
                tracing::error!("Failed to provision ephemeral database: {:?}", e);
                EngineError::Provision(e)
            })?;

        let verdict = grade(&mut db, request).await;
        db.teardown().await;

        tracing::info!(
            "Evaluation finished: {} in {} ms",
            verdict.outcome().as_str(),
            started.elapsed().as_millis()
        );

        Ok(verdict)
    }
}

/// Runs the grading stages and classifies the first failure.
///
/// The reference query executes before the candidate so that nothing the
/// candidate does to the database can leak into the expected result.
/// Classification still gives a failing candidate precedence over a failing
/// reference.
async fn grade(db: &mut EphemeralDatabase, request: &EvaluationRequest) -> Verdict {
    if let Err(e) = db.apply_script(&request.setup_script).await {
        log_timeout("setup script", &e);
        return Verdict::SetupError {
            detail: format!("setup script failed: {}", e.detail()),
        };
    }

    if let Err(e) = db.lock_contents().await {
        return Verdict::SetupError {
            detail: format!("could not freeze setup state: {}", e.detail()),
        };
    }

    let reference = db.query(&request.reference_query).await;

    let candidate_rows = match db.query(&request.candidate_query).await {
        Ok(rows) => rows,
        Err(e @ StageError::TimedOut(_)) | Err(e @ StageError::RowLimit(_)) => {
            tracing::warn!("Candidate query stopped: {}", e.detail());
            return Verdict::ExecutionTimeout { detail: e.detail() };
        }
        Err(StageError::Failed(detail)) => {
            tracing::debug!("Candidate query rejected: {}", detail);
            return Verdict::SyntaxError { detail };
        }
    };

    // A failing reference query is a question-bank defect, so it is reported
    // the same way as a broken setup script.
    let reference_rows = match reference {
        Ok(rows) => rows,
        Err(e) => {
            log_timeout("reference query", &e);
            tracing::warn!("Reference query failed: {}", e.detail());
            return Verdict::SetupError {
                detail: format!("reference query failed: {}", e.detail()),
            };
        }
    };

    if fingerprint(&candidate_rows) == fingerprint(&reference_rows) {
        Verdict::Correct {
            candidate_rows,
            reference_rows,
        }
    } else {
        Verdict::ResultError {
            candidate_rows,
            reference_rows,
        }
    }
}

fn log_timeout(stage: &str, err: &StageError) {
    if let StageError::TimedOut(limit) = err {
        tracing::warn!("The {} timed out after {} ms", stage, limit.as_millis());
    }
}
