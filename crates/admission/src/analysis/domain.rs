use serde::Serialize;
use serde_json::Value;

use crate::scoring::{round2, DepartmentId, ExamMode, ScoreComponent, UserId};

/// Validated `POST /api/analyze` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub user_id: UserId,
    pub mode: ExamMode,
}

impl AnalysisRequest {
    pub fn from_payload(payload: &Value) -> Result<Self, RequestError> {
        let user_id = payload
            .get("userId")
            .and_then(UserId::from_json)
            .ok_or(RequestError::MissingUserId)?;
        let mode = match payload.get("mode") {
            None | Some(Value::Null) => return Err(RequestError::MissingMode),
            Some(value) => value
                .as_str()
                .and_then(ExamMode::parse)
                .ok_or(RequestError::InvalidMode)?,
        };
        Ok(Self { user_id, mode })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("userId is required")]
    MissingUserId,
    #[error("mode is required")]
    MissingMode,
    #[error("mode must be 'before' or 'after'")]
    InvalidMode,
}

/// One scored department.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub department_id: DepartmentId,
    pub school_name: String,
    pub department_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub converted_score: f64,
    pub total_score: f64,
    pub percentage: f64,
    pub cutline_score: Option<f64>,
    pub is_passed: Option<bool>,
    #[serde(skip)]
    pub components: Vec<ScoreComponent>,
}

impl ResultEntry {
    pub(crate) fn percentage_of(converted: f64, total: f64) -> f64 {
        round2(converted / total * 100.0)
    }
}

/// Response body of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub count: usize,
    pub results: Vec<ResultEntry>,
}

impl AnalysisOutcome {
    pub fn scored(results: Vec<ResultEntry>) -> Self {
        Self {
            success: true,
            message: None,
            count: results.len(),
            results,
        }
    }

    /// Expected "nothing to show yet" outcome, reported with guidance rather than as an error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            count: 0,
            results: Vec::new(),
        }
    }
}
