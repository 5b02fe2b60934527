//! Storage seams consumed by the intake, choice and analysis services.

use crate::catalog::DepartmentProfile;
use crate::intake::ExamScoreRecord;
use crate::scoring::{DepartmentId, ExamMode, MaxScoreRow, SubjectDirectory, UserId};

/// Saved exam scores, one record per (user, mode).
pub trait ExamScoreRepository: Send + Sync {
    fn fetch(
        &self,
        user_id: UserId,
        mode: ExamMode,
    ) -> Result<Option<ExamScoreRecord>, RepositoryError>;
    /// Inserts or replaces the record for its (user, mode).
    fn upsert(&self, record: ExamScoreRecord) -> Result<ExamScoreRecord, RepositoryError>;
}

/// Read-only reference data: subjects, departments with their policies, yearly max scores.
pub trait DepartmentCatalog: Send + Sync {
    fn subjects(&self) -> Result<SubjectDirectory, RepositoryError>;
    fn department(&self, id: DepartmentId) -> Result<Option<DepartmentProfile>, RepositoryError>;
    /// Departments the user has chosen, in the order they were chosen.
    fn chosen_departments(&self, user_id: UserId)
        -> Result<Vec<DepartmentProfile>, RepositoryError>;
    fn max_scores(&self, year: i32) -> Result<Vec<MaxScoreRow>, RepositoryError>;
}

/// A user's chosen department list.
pub trait ChoiceRepository: Send + Sync {
    fn choices(&self, user_id: UserId) -> Result<Vec<DepartmentId>, RepositoryError>;
    /// Appends a choice. Fails with `Conflict` when the department is already chosen and
    /// with `LimitReached` when the user already holds `limit` choices. Both checks run in
    /// the same critical section as the append.
    fn add(
        &self,
        user_id: UserId,
        department_id: DepartmentId,
        limit: usize,
    ) -> Result<(), RepositoryError>;
    /// Returns whether a choice was removed.
    fn remove(&self, user_id: UserId, department_id: DepartmentId)
        -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("at most {limit} records allowed")]
    LimitReached { limit: usize },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
