// src/handlers/evaluate.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    engine::{EvaluationRequest, Evaluator},
    error::AppError,
    models::{
        submission::{EvaluateRequest, EvaluateResponse},
        verdict::Outcome,
    },
};

/// Learner-facing summary for each outcome. The raw engine text stays in `detail`.
pub fn outcome_message(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Correct => "Correct! Your query returns exactly the expected result.",
        Outcome::ResultError => {
            "Your query runs, but its result does not match the expected answer."
        }
        Outcome::SyntaxError => "Your query could not be executed. Check the error details.",
        Outcome::ExecutionTimeout => {
            "Your query took too long or returned too many rows. Look for runaway joins or unbounded recursion."
        }
        Outcome::SetupError => "This question is misconfigured. Please contact an administrator.",
    }
}

/// Grades a candidate query against a reference query.
///
/// * Validates field sizes.
/// * Runs both queries in a fresh, private database built from `setup_sql`.
/// * Returns the verdict; only provisioning failures surface as 500.
pub async fn evaluate(
    State(evaluator): State<Evaluator>,
    Json(payload): Json<EvaluateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let request = EvaluationRequest::from(payload);
    let verdict = evaluator.evaluate(&request).await?;

    Ok(Json(EvaluateResponse {
        message: outcome_message(verdict.outcome()),
        verdict,
    }))
}
