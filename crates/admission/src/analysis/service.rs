use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{AnalysisOutcome, AnalysisRequest, ResultEntry};
use crate::catalog::DepartmentProfile;
use crate::repository::{DepartmentCatalog, ExamScoreRepository, RepositoryError};
use crate::scoring::{
    normalize_scores, CanonicalScoreSet, EvaluationContext, EvaluationEngine, EvaluationError,
    GradeTableError, MaxScoreReference,
};

pub const NO_SCORES_MESSAGE: &str = "No exam scores saved for this mode. Enter your scores first.";
pub const NO_READABLE_SCORES_MESSAGE: &str =
    "The saved exam scores contain no recognizable subjects. Check the score sheet.";
pub const NO_CHOICES_MESSAGE: &str =
    "No departments chosen yet. Choose up to 3 departments to analyze.";
pub const NO_RESULTS_MESSAGE: &str =
    "None of the chosen departments could be scored with the saved exam scores.";

/// Orchestrates normalization and per-department evaluation for one student.
pub struct AnalysisService<S, D> {
    scores: Arc<S>,
    catalog: Arc<D>,
    engine: EvaluationEngine,
    reference_year: i32,
}

impl<S, D> AnalysisService<S, D>
where
    S: ExamScoreRepository + 'static,
    D: DepartmentCatalog + 'static,
{
    pub fn new(scores: Arc<S>, catalog: Arc<D>, reference_year: i32) -> Self {
        Self::with_engine(scores, catalog, reference_year, EvaluationEngine::new())
    }

    pub fn with_engine(
        scores: Arc<S>,
        catalog: Arc<D>,
        reference_year: i32,
        engine: EvaluationEngine,
    ) -> Self {
        Self {
            scores,
            catalog,
            engine,
            reference_year,
        }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Scores every chosen department. Departments that cannot be scored are left out; only
    /// storage failures surface as errors.
    pub fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisServiceError> {
        let AnalysisRequest { user_id, mode } = request;

        let Some(record) = self.scores.fetch(user_id, mode)? else {
            debug!(%user_id, mode = mode.label(), "no exam scores saved");
            return Ok(AnalysisOutcome::unavailable(NO_SCORES_MESSAGE));
        };
        if record.scores.is_empty() {
            return Ok(AnalysisOutcome::unavailable(NO_SCORES_MESSAGE));
        }

        let directory = self.catalog.subjects()?;
        let scores = normalize_scores(&record.scores, &directory);
        if scores.is_empty() {
            warn!(%user_id, mode = mode.label(), "score sheet normalized to nothing");
            return Ok(AnalysisOutcome::unavailable(NO_READABLE_SCORES_MESSAGE));
        }

        let departments = self.catalog.chosen_departments(user_id)?;
        if departments.is_empty() {
            return Ok(AnalysisOutcome::unavailable(NO_CHOICES_MESSAGE));
        }

        let rows = self.catalog.max_scores(self.reference_year)?;
        let max_scores = MaxScoreReference::from_rows(self.reference_year, &rows);

        let results = rank_departments(&self.engine, &scores, &departments, &max_scores);
        info!(
            %user_id,
            mode = mode.label(),
            chosen = departments.len(),
            scored = results.len(),
            "analysis completed"
        );

        if results.is_empty() {
            Ok(AnalysisOutcome::unavailable(NO_RESULTS_MESSAGE))
        } else {
            Ok(AnalysisOutcome::scored(results))
        }
    }
}

/// Evaluates each department independently and sorts the scored ones by converted score,
/// highest first. Equal scores keep the input order.
pub fn rank_departments(
    engine: &EvaluationEngine,
    scores: &CanonicalScoreSet,
    departments: &[DepartmentProfile],
    max_scores: &MaxScoreReference,
) -> Vec<ResultEntry> {
    let mut results: Vec<ResultEntry> = departments
        .iter()
        .filter_map(|department| match score_department(engine, scores, department, max_scores) {
            Ok(Some(entry)) => Some(entry),
            Ok(None) => {
                debug!(department_id = %department.id, "department has no scoring configuration");
                None
            }
            Err(error) => {
                warn!(department_id = %department.id, %error, "department skipped");
                None
            }
        })
        .collect();

    results.sort_by(|left, right| right.converted_score.total_cmp(&left.converted_score));
    results
}

fn score_department(
    engine: &EvaluationEngine,
    scores: &CanonicalScoreSet,
    department: &DepartmentProfile,
    max_scores: &MaxScoreReference,
) -> Result<Option<ResultEntry>, DepartmentError> {
    let grades = department.grade_table()?;
    let context = EvaluationContext {
        scores,
        grades: &grades,
        max_scores,
    };
    let Some(evaluation) = engine.evaluate(&department.policy, &context)? else {
        return Ok(None);
    };

    let converted = evaluation.converted_score;
    let total = department.policy.effective_total();
    let cutline = department.policy.effective_cutline();

    Ok(Some(ResultEntry {
        department_id: department.id,
        school_name: department.school_name.clone(),
        department_name: department.name.clone(),
        division: department.division.clone(),
        region: department.region.clone(),
        converted_score: converted,
        total_score: total,
        percentage: ResultEntry::percentage_of(converted, total),
        cutline_score: cutline,
        is_passed: cutline.map(|cutline| converted >= cutline),
        components: evaluation.components,
    }))
}

/// Failure confined to a single department.
#[derive(Debug, thiserror::Error)]
pub enum DepartmentError {
    #[error(transparent)]
    Grades(#[from] GradeTableError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Error raised by the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
