// src/engine/error.rs

use std::{fmt, time::Duration};

/// Failures of the grading infrastructure itself.
///
/// Grading outcomes (wrong answer, broken candidate SQL, ...) are never
/// reported through this type; they are variants of `Verdict`.
#[derive(Debug)]
pub enum EngineError {
    /// The storage engine could not hand out a database instance.
    Provision(sqlx::Error),

    /// The evaluator was closed and accepts no more work.
    Unavailable,

    /// A trusted query against the practice database failed.
    Query(String),

    /// A trusted query against the practice database ran past its deadline.
    Timeout(Duration),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Provision(e) => write!(f, "failed to provision database: {}", e),
            EngineError::Unavailable => write!(f, "evaluator is closed"),
            EngineError::Query(msg) => write!(f, "query failed: {}", msg),
            EngineError::Timeout(limit) => {
                write!(f, "query exceeded the {} ms execution limit", limit.as_millis())
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Provision(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Provision(err)
    }
}
