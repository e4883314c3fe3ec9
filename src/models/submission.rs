// src/models/submission.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    engine::{EvaluationRequest, Fingerprint},
    models::verdict::Verdict,
};

/// Upper bound on any single SQL field accepted over HTTP.
pub const MAX_SQL_BYTES: usize = 64 * 1024;

/// DTO for grading a candidate query.
#[derive(Debug, Deserialize, Validate)]
pub struct EvaluateRequest {
    /// DDL/DML that builds the question's schema. May be empty.
    #[validate(length(max = 65536, message = "Setup script must not exceed 64 KiB."))]
    pub setup_sql: String,

    /// The bank-authored answer.
    #[validate(custom(function = validate_query))]
    pub reference_sql: String,

    /// The learner's submission.
    #[validate(custom(function = validate_query))]
    pub candidate_sql: String,
}

impl From<EvaluateRequest> for EvaluationRequest {
    fn from(req: EvaluateRequest) -> Self {
        EvaluationRequest::new(req.setup_sql, req.reference_sql, req.candidate_sql)
    }
}

/// Verdict plus a learner-facing summary line.
#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub message: &'static str,
}

/// DTO for fingerprinting a trusted query against the practice database.
#[derive(Debug, Deserialize, Validate)]
pub struct FingerprintRequest {
    #[validate(custom(function = validate_query))]
    pub sql: String,
}

#[derive(Debug, Serialize)]
pub struct FingerprintResponse {
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub schema: String,
}

fn validate_query(sql: &str) -> Result<(), validator::ValidationError> {
    if sql.trim().is_empty() {
        return Err(validator::ValidationError::new("query_cannot_be_empty"));
    }
    if sql.len() > MAX_SQL_BYTES {
        return Err(validator::ValidationError::new("query_too_long"));
    }
    Ok(())
}
