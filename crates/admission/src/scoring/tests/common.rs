use crate::scoring::conversion::GradeConversionTable;
use crate::scoring::domain::{
    CanonicalScoreSet, CanonicalSubjectScore, ScoreType, SubjectId, SubjectKind, SubjectRole,
};
use crate::scoring::evaluation::{DepartmentEvaluation, EvaluationContext, EvaluationEngine};
use crate::scoring::max_score::{MaxScoreMethod, MaxScoreReference};
use crate::scoring::policy::{
    DepartmentScoringPolicy, DepartmentSubjectConfig, SubjectRatios, SubjectScoreConfig,
};
use crate::scoring::subjects::SubjectDirectory;

pub(super) const YEAR: i32 = 2025;

pub(super) fn percentile(value: f64) -> CanonicalSubjectScore {
    CanonicalSubjectScore {
        percentile: Some(value),
        ..CanonicalSubjectScore::default()
    }
}

pub(super) fn scored(standard: f64, percentile: f64) -> CanonicalSubjectScore {
    CanonicalSubjectScore {
        standard_score: Some(standard),
        percentile: Some(percentile),
        ..CanonicalSubjectScore::default()
    }
}

pub(super) fn graded(grade: u8) -> CanonicalSubjectScore {
    CanonicalSubjectScore {
        grade: Some(grade),
        ..CanonicalSubjectScore::default()
    }
}

/// Korean 95, math 90, inquiries 80/90 (percentiles), English grade 2, Korean History grade 4.
pub(super) fn student_scores() -> CanonicalScoreSet {
    CanonicalScoreSet::new()
        .with(SubjectRole::Korean, scored(131.0, 95.0))
        .with(SubjectRole::Math, scored(127.0, 90.0))
        .with(SubjectRole::English, graded(2))
        .with(SubjectRole::KoreanHistory, graded(4))
        .with(SubjectRole::Inquiry1, scored(64.0, 80.0))
        .with(SubjectRole::Inquiry2, scored(67.0, 90.0))
}

pub(super) fn slot(subject: SubjectKind, score_type: ScoreType) -> SubjectScoreConfig {
    SubjectScoreConfig {
        subject,
        score_type,
        max_score_method: None,
        max_score_value: None,
        priority_group: None,
    }
}

pub(super) fn english_slot() -> SubjectScoreConfig {
    SubjectScoreConfig {
        max_score_method: Some(MaxScoreMethod::Fixed100),
        ..slot(SubjectKind::English, ScoreType::GradeConversion)
    }
}

pub(super) fn grouped(mut config: SubjectScoreConfig, group: u32) -> SubjectScoreConfig {
    config.priority_group = Some(group);
    config
}

pub(super) fn ratios(korean: f64, math: f64, inquiry: f64, english: Option<f64>) -> SubjectRatios {
    SubjectRatios {
        korean: Some(korean),
        math: Some(math),
        inquiry: Some(inquiry),
        english,
    }
}

/// Korean, math and inquiry percentiles with the given ratios.
pub(super) fn percentile_policy(korean: f64, math: f64, inquiry: f64) -> DepartmentScoringPolicy {
    DepartmentScoringPolicy::ratio(
        ratios(korean, math, inquiry, None),
        vec![
            slot(SubjectKind::Korean, ScoreType::Percentile),
            slot(SubjectKind::Math, ScoreType::Percentile),
            slot(SubjectKind::Inquiry, ScoreType::Percentile),
        ],
    )
}

pub(super) fn rule_slot(id: u64, subject: SubjectKind) -> DepartmentSubjectConfig {
    DepartmentSubjectConfig {
        subject_id: SubjectId(id),
        subject,
        score_type: ScoreType::Percentile,
        max_score_method: None,
        max_score_value: None,
    }
}

pub(super) fn directory() -> SubjectDirectory {
    SubjectDirectory::default()
        .with_kind(SubjectId(1), SubjectKind::Korean)
        .with_kind(SubjectId(2), SubjectKind::Math)
        .with_kind(SubjectId(3), SubjectKind::English)
        .with_kind(SubjectId(4), SubjectKind::KoreanHistory)
        .with_kind(SubjectId(5), SubjectKind::Inquiry)
}

pub(super) fn evaluate(
    policy: &DepartmentScoringPolicy,
    scores: &CanonicalScoreSet,
) -> Option<DepartmentEvaluation> {
    evaluate_with(&EvaluationEngine::new(), policy, scores, &GradeConversionTable::default())
}

pub(super) fn evaluate_with(
    engine: &EvaluationEngine,
    policy: &DepartmentScoringPolicy,
    scores: &CanonicalScoreSet,
    grades: &GradeConversionTable,
) -> Option<DepartmentEvaluation> {
    let max_scores = MaxScoreReference::fallback(YEAR);
    let context = EvaluationContext {
        scores,
        grades,
        max_scores: &max_scores,
    };
    engine
        .evaluate(policy, &context)
        .expect("policy evaluates without error")
}

pub(super) fn converted(policy: &DepartmentScoringPolicy, scores: &CanonicalScoreSet) -> f64 {
    evaluate(policy, scores)
        .expect("department is configured")
        .converted_score
}
