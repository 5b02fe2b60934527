//! Exam score intake: the raw score sheet a student saves per exam mode.

pub mod router;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::repository::{ExamScoreRepository, RepositoryError};
use crate::scoring::{ExamMode, RawScores, UserId};

pub use router::intake_router;

/// Stored score sheet, unique per (user, mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamScoreRecord {
    pub user_id: UserId,
    pub mode: ExamMode,
    pub scores: RawScores,
    pub recorded_at: DateTime<Utc>,
}

/// Validated score submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamScoreSubmission {
    pub user_id: UserId,
    pub mode: ExamMode,
    pub scores: RawScores,
}

impl ExamScoreSubmission {
    /// Validates a `{userId, mode, scores}` body.
    pub fn from_payload(payload: &Value) -> Result<Self, IntakeError> {
        let user_id = payload
            .get("userId")
            .and_then(UserId::from_json)
            .ok_or(IntakeError::MissingUserId)?;
        let mode = payload
            .get("mode")
            .and_then(Value::as_str)
            .and_then(ExamMode::parse)
            .ok_or(IntakeError::InvalidMode)?;
        let scores = match payload.get("scores") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            _ => return Err(IntakeError::ScoresNotObject),
        };

        Ok(Self {
            user_id,
            mode,
            scores,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("userId is required")]
    MissingUserId,
    #[error("mode must be 'before' or 'after'")]
    InvalidMode,
    #[error("scores must be an object keyed by subject id")]
    ScoresNotObject,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Saves and reads score sheets.
pub struct ExamScoreService<S> {
    repository: Arc<S>,
}

impl<S> ExamScoreService<S>
where
    S: ExamScoreRepository + 'static,
{
    pub fn new(repository: Arc<S>) -> Self {
        Self { repository }
    }

    pub fn submit(&self, submission: ExamScoreSubmission) -> Result<ExamScoreRecord, IntakeError> {
        let record = ExamScoreRecord {
            user_id: submission.user_id,
            mode: submission.mode,
            scores: submission.scores,
            recorded_at: Utc::now(),
        };
        let stored = self.repository.upsert(record)?;
        info!(
            user_id = %stored.user_id,
            mode = stored.mode.label(),
            subjects = stored.scores.len(),
            "exam scores saved"
        );
        Ok(stored)
    }

    pub fn get(&self, user_id: UserId, mode: ExamMode) -> Result<Option<ExamScoreRecord>, IntakeError> {
        Ok(self.repository.fetch(user_id, mode)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submissions_require_every_field() {
        let valid = json!({ "userId": 3, "mode": "AFTER", "scores": { "1": { "default": {} } } });
        let submission = ExamScoreSubmission::from_payload(&valid).expect("valid payload");
        assert_eq!(submission.user_id, UserId(3));
        assert_eq!(submission.mode, ExamMode::After);
        assert_eq!(submission.scores.len(), 1);

        assert!(matches!(
            ExamScoreSubmission::from_payload(&json!({ "mode": "after", "scores": {} })),
            Err(IntakeError::MissingUserId)
        ));
        assert!(matches!(
            ExamScoreSubmission::from_payload(&json!({ "userId": 3, "mode": "midterm", "scores": {} })),
            Err(IntakeError::InvalidMode)
        ));
        assert!(matches!(
            ExamScoreSubmission::from_payload(&json!({ "userId": 3, "mode": "before", "scores": [] })),
            Err(IntakeError::ScoresNotObject)
        ));
    }

    #[test]
    fn records_serialize_in_camel_case() {
        let record = ExamScoreRecord {
            user_id: UserId(5),
            mode: ExamMode::Before,
            scores: RawScores::new(),
            recorded_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("valid timestamp"),
        };

        let value = serde_json::to_value(&record).expect("serializes");
        assert_eq!(value["userId"], json!(5));
        assert_eq!(value["mode"], json!("before"));
        assert!(value.get("recordedAt").is_some());
    }
}
