// src/engine/mod.rs

//! SQL answer grading.
//!
//! `Evaluator` runs untrusted candidate SQL in a private, disposable database
//! and compares its result to a reference query via `fingerprint`.
//! `PracticeDatabase` fingerprints trusted queries against a shared,
//! read-only database.

pub mod error;
pub mod evaluator;
pub mod fingerprint;
pub mod practice;
pub mod sandbox;
pub mod value;

pub use error::EngineError;
pub use evaluator::{EvaluationRequest, Evaluator, ExecutionLimits};
pub use fingerprint::{Fingerprint, fingerprint};
pub use practice::PracticeDatabase;
pub use value::{Row, SqlValue};
