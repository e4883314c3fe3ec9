// src/handlers/practice.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    engine::{EngineError, PracticeDatabase},
    error::AppError,
    models::submission::{FingerprintRequest, FingerprintResponse, SchemaResponse},
};

/// Returns the practice database schema for display beside questions.
pub async fn get_schema(
    State(practice): State<PracticeDatabase>,
) -> Result<impl IntoResponse, AppError> {
    let schema = practice.schema().await.map_err(|e| match e {
        EngineError::Query(msg) => AppError::NotFound(msg),
        other => AppError::from(other),
    })?;

    Ok(Json(SchemaResponse { schema }))
}

/// Fingerprints a bank-authored reference query against the practice database,
/// so later submissions can be compared without re-running it.
pub async fn fingerprint_query(
    State(practice): State<PracticeDatabase>,
    Json(payload): Json<FingerprintRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let fingerprint = practice.hash_only(&payload.sql).await.map_err(|e| {
        tracing::warn!("Reference fingerprint failed: {}", e);
        AppError::from(e)
    })?;

    Ok(Json(FingerprintResponse { fingerprint }))
}
