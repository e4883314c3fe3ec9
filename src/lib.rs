// src/lib.rs

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

// Re-export specific items for convenience if needed
pub use engine::{EvaluationRequest, Evaluator, ExecutionLimits, PracticeDatabase};
pub use models::verdict::{Outcome, Verdict};
pub use routes::create_router;
