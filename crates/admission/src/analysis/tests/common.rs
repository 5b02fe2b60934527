use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::{json, Value};

use crate::analysis::{analysis_router, AnalysisService};
use crate::catalog::DepartmentProfile;
use crate::intake::ExamScoreRecord;
use crate::repository::{DepartmentCatalog, ExamScoreRepository, RepositoryError};
use crate::scoring::{
    DepartmentId, DepartmentScoringPolicy, ExamMode, GradeConversionEntry, GradeSubjectCode,
    MaxScoreRow, RawScores, ScoreType, Subject, SubjectDirectory, SubjectId, SubjectKind,
    SubjectRatios, SubjectScoreConfig, UserId,
};

pub(super) const STUDENT: UserId = UserId(7);
pub(super) const YEAR: i32 = 2025;

pub(super) fn subjects() -> Vec<Subject> {
    [
        (1, "국어"),
        (2, "수학"),
        (3, "영어"),
        (4, "한국사"),
        (5, "사회탐구"),
    ]
    .into_iter()
    .map(|(id, name)| Subject {
        id: SubjectId(id),
        name: name.to_string(),
        category: None,
        kind: None,
    })
    .collect()
}

pub(super) fn raw_scores() -> RawScores {
    serde_json::from_value(json!({
        "1": { "default": { "standardScore": 131, "percentile": 95, "grade": 1 } },
        "2": { "default": { "standardScore": "127", "percentile": "90", "grade": 2 } },
        "3": { "default": { "grade": 2 } },
        "4": { "default": { "grade": 4 } },
        "5": {
            "1": { "standardScore": 64, "percentile": 80 },
            "2": { "standardScore": 67, "percentile": 90 }
        }
    }))
    .expect("raw scores are an object")
}

pub(super) fn record(user_id: UserId, mode: ExamMode, scores: RawScores) -> ExamScoreRecord {
    ExamScoreRecord {
        user_id,
        mode,
        scores,
        recorded_at: Utc::now(),
    }
}

fn slot(subject: SubjectKind, score_type: ScoreType) -> SubjectScoreConfig {
    SubjectScoreConfig {
        subject,
        score_type,
        max_score_method: None,
        max_score_value: None,
        priority_group: None,
    }
}

fn profile(id: u64, name: &str, policy: DepartmentScoringPolicy) -> DepartmentProfile {
    DepartmentProfile {
        id: DepartmentId(id),
        school_name: "Hanbit University".to_string(),
        name: name.to_string(),
        division: Some("가".to_string()),
        region: None,
        policy,
        grade_conversions: Vec::new(),
    }
}

/// Percentile ratios 0.3/0.3/0.4, cutline 90: converts to 91.5.
pub(super) fn economics() -> DepartmentProfile {
    let mut policy = DepartmentScoringPolicy::ratio(
        SubjectRatios {
            korean: Some(0.3),
            math: Some(0.3),
            inquiry: Some(0.4),
            english: None,
        },
        vec![
            slot(SubjectKind::Korean, ScoreType::Percentile),
            slot(SubjectKind::Math, ScoreType::Percentile),
            slot(SubjectKind::Inquiry, ScoreType::Percentile),
        ],
    );
    policy.cutline_score = Some(90.0);
    profile(10, "Economics", policy)
}

/// Standard-score halves of Korean and math, cutline 130: converts to 129.
pub(super) fn physics() -> DepartmentProfile {
    let mut policy = DepartmentScoringPolicy::ratio(
        SubjectRatios {
            korean: Some(0.5),
            math: Some(0.5),
            inquiry: None,
            english: None,
        },
        vec![
            slot(SubjectKind::Korean, ScoreType::StandardScore),
            slot(SubjectKind::Math, ScoreType::StandardScore),
        ],
    );
    policy.cutline_score = Some(130.0);
    let mut department = profile(11, "Physics", policy);
    department.region = Some("Seoul".to_string());
    department
}

pub(super) fn unconfigured() -> DepartmentProfile {
    profile(
        12,
        "Philosophy",
        DepartmentScoringPolicy::ratio(SubjectRatios::default(), Vec::new()),
    )
}

/// Configured, but its duplicated grade rows make it unscorable.
pub(super) fn broken_grades() -> DepartmentProfile {
    let mut department = economics();
    department.id = DepartmentId(13);
    department.name = "Statistics".to_string();
    let row = GradeConversionEntry {
        department_id: DepartmentId(13),
        subject_code: GradeSubjectCode::English,
        grade: 1,
        converted_score: 100.0,
    };
    department.grade_conversions = vec![row.clone(), row];
    department
}

#[derive(Default)]
pub(super) struct MemoryScores {
    records: Mutex<HashMap<(UserId, ExamMode), ExamScoreRecord>>,
}

impl MemoryScores {
    pub(super) fn with(self, record: ExamScoreRecord) -> Self {
        self.upsert(record).expect("memory upsert");
        self
    }
}

impl ExamScoreRepository for MemoryScores {
    fn fetch(
        &self,
        user_id: UserId,
        mode: ExamMode,
    ) -> Result<Option<ExamScoreRecord>, RepositoryError> {
        let guard = self.records.lock().expect("score mutex poisoned");
        Ok(guard.get(&(user_id, mode)).cloned())
    }

    fn upsert(&self, record: ExamScoreRecord) -> Result<ExamScoreRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("score mutex poisoned");
        guard.insert((record.user_id, record.mode), record.clone());
        Ok(record)
    }
}

#[derive(Default)]
pub(super) struct MemoryCatalog {
    pub(super) departments: Vec<DepartmentProfile>,
    pub(super) choices: HashMap<UserId, Vec<DepartmentId>>,
    pub(super) max_scores: Vec<MaxScoreRow>,
}

impl MemoryCatalog {
    pub(super) fn choosing(departments: Vec<DepartmentProfile>) -> Self {
        let ids = departments.iter().map(|department| department.id).collect();
        Self {
            departments,
            choices: HashMap::from([(STUDENT, ids)]),
            max_scores: Vec::new(),
        }
    }
}

impl DepartmentCatalog for MemoryCatalog {
    fn subjects(&self) -> Result<SubjectDirectory, RepositoryError> {
        Ok(SubjectDirectory::from_subjects(&subjects()))
    }

    fn department(&self, id: DepartmentId) -> Result<Option<DepartmentProfile>, RepositoryError> {
        Ok(self.departments.iter().find(|d| d.id == id).cloned())
    }

    fn chosen_departments(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DepartmentProfile>, RepositoryError> {
        let ids = self.choices.get(&user_id).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.departments.iter().find(|d| d.id == id).cloned())
            .collect())
    }

    fn max_scores(&self, year: i32) -> Result<Vec<MaxScoreRow>, RepositoryError> {
        Ok(self
            .max_scores
            .iter()
            .filter(|row| row.year == year)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableCatalog;

impl DepartmentCatalog for UnavailableCatalog {
    fn subjects(&self) -> Result<SubjectDirectory, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn department(&self, _id: DepartmentId) -> Result<Option<DepartmentProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn chosen_departments(
        &self,
        _user_id: UserId,
    ) -> Result<Vec<DepartmentProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn max_scores(&self, _year: i32) -> Result<Vec<MaxScoreRow>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn scored_student() -> MemoryScores {
    MemoryScores::default().with(record(STUDENT, ExamMode::After, raw_scores()))
}

pub(super) fn build_service<D>(scores: MemoryScores, catalog: D) -> AnalysisService<MemoryScores, D>
where
    D: DepartmentCatalog + 'static,
{
    AnalysisService::new(Arc::new(scores), Arc::new(catalog), YEAR)
}

pub(super) fn router_with<D>(scores: MemoryScores, catalog: D) -> axum::Router
where
    D: DepartmentCatalog + 'static,
{
    analysis_router(Arc::new(build_service(scores, catalog)))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
