// src/models/verdict.rs

use serde::Serialize;

use crate::engine::value::Row;

/// Terminal classification of one grading attempt.
///
/// Serialized with an `outcome` tag, e.g.
/// `{"outcome":"syntax_error","detail":"near \"SELEC\": syntax error"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verdict {
    /// The setup script or the reference query could not run. A content
    /// defect, never the learner's fault.
    SetupError { detail: String },

    /// The candidate query was rejected by the storage engine.
    SyntaxError { detail: String },

    /// The candidate query ran past its execution limit.
    ExecutionTimeout { detail: String },

    /// Both queries ran but their results differ.
    ResultError {
        candidate_rows: Vec<Row>,
        reference_rows: Vec<Row>,
    },

    Correct {
        candidate_rows: Vec<Row>,
        reference_rows: Vec<Row>,
    },
}

/// Outcome tag without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    SetupError,
    SyntaxError,
    ExecutionTimeout,
    ResultError,
    Correct,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::SetupError => "setup_error",
            Outcome::SyntaxError => "syntax_error",
            Outcome::ExecutionTimeout => "execution_timeout",
            Outcome::ResultError => "result_error",
            Outcome::Correct => "correct",
        }
    }
}

impl Verdict {
    pub fn outcome(&self) -> Outcome {
        match self {
            Verdict::SetupError { .. } => Outcome::SetupError,
            Verdict::SyntaxError { .. } => Outcome::SyntaxError,
            Verdict::ExecutionTimeout { .. } => Outcome::ExecutionTimeout,
            Verdict::ResultError { .. } => Outcome::ResultError,
            Verdict::Correct { .. } => Outcome::Correct,
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct { .. })
    }

    /// Engine error text, present only on error outcomes.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Verdict::SetupError { detail }
            | Verdict::SyntaxError { detail }
            | Verdict::ExecutionTimeout { detail } => Some(detail.as_str()),
            Verdict::ResultError { .. } | Verdict::Correct { .. } => None,
        }
    }

    /// Candidate rows, present only when both queries ran.
    pub fn candidate_rows(&self) -> Option<&[Row]> {
        match self {
            Verdict::ResultError { candidate_rows, .. } | Verdict::Correct { candidate_rows, .. } => {
                Some(candidate_rows.as_slice())
            }
            _ => None,
        }
    }

    pub fn reference_rows(&self) -> Option<&[Row]> {
        match self {
            Verdict::ResultError { reference_rows, .. } | Verdict::Correct { reference_rows, .. } => {
                Some(reference_rows.as_slice())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::SqlValue;

    #[test]
    fn error_verdict_serializes_without_rows() {
        let verdict = Verdict::SyntaxError {
            detail: "near \"SELEC\": syntax error".to_string(),
        };

        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["outcome"], "syntax_error");
        assert_eq!(json["detail"], "near \"SELEC\": syntax error");
        assert!(json.get("candidate_rows").is_none());
    }

    #[test]
    fn graded_verdict_serializes_rows_and_no_detail() {
        let rows = vec![Row::new().with("id", SqlValue::Integer(1))];
        let verdict = Verdict::Correct {
            candidate_rows: rows.clone(),
            reference_rows: rows,
        };

        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["outcome"], "correct");
        assert_eq!(json["candidate_rows"][0]["id"], 1);
        assert!(json.get("detail").is_none());
        assert_eq!(verdict.detail(), None);
        assert_eq!(verdict.outcome().as_str(), "correct");
    }
}
