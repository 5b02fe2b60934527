use super::common::*;
use crate::analysis::service::{
    NO_CHOICES_MESSAGE, NO_READABLE_SCORES_MESSAGE, NO_RESULTS_MESSAGE, NO_SCORES_MESSAGE,
};
use crate::analysis::{rank_departments, AnalysisRequest, AnalysisServiceError};
use crate::repository::{ExamScoreRepository, RepositoryError};
use crate::scoring::{
    normalize_scores, DepartmentId, EvaluationEngine, ExamMode, MaxScoreReference, RawScores,
    SubjectDirectory,
};

fn request(mode: ExamMode) -> AnalysisRequest {
    AnalysisRequest {
        user_id: STUDENT,
        mode,
    }
}

#[test]
fn analyze_ranks_scored_departments() {
    let catalog = MemoryCatalog::choosing(vec![economics(), physics(), unconfigured()]);
    let service = build_service(scored_student(), catalog);

    let outcome = service.analyze(request(ExamMode::After)).expect("analysis runs");

    assert!(outcome.success);
    assert_eq!(outcome.message, None);
    assert_eq!(outcome.count, 2);

    let physics = &outcome.results[0];
    assert_eq!(physics.department_name, "Physics");
    assert_eq!(physics.converted_score, 129.0);
    assert_eq!(physics.total_score, 1000.0);
    assert_eq!(physics.percentage, 12.9);
    assert_eq!(physics.is_passed, Some(false));
    assert_eq!(physics.region.as_deref(), Some("Seoul"));

    let economics = &outcome.results[1];
    assert_eq!(economics.converted_score, 91.5);
    assert_eq!(economics.percentage, 9.15);
    assert_eq!(economics.cutline_score, Some(90.0));
    assert_eq!(economics.is_passed, Some(true));
    assert_eq!(economics.division.as_deref(), Some("가"));
    assert_eq!(economics.components.len(), 3);
}

#[test]
fn departments_without_cutline_report_no_pass_state() {
    let mut department = economics();
    department.policy.cutline_score = None;
    department.policy.total_score = 500.0;
    let service = build_service(scored_student(), MemoryCatalog::choosing(vec![department]));

    let outcome = service.analyze(request(ExamMode::After)).expect("analysis runs");

    let entry = &outcome.results[0];
    assert_eq!(entry.is_passed, None);
    assert_eq!(entry.cutline_score, None);
    assert_eq!(entry.percentage, 18.3);
}

#[test]
fn zero_cutline_reports_no_pass_state() {
    let mut department = economics();
    department.policy.cutline_score = Some(0.0);
    let service = build_service(scored_student(), MemoryCatalog::choosing(vec![department]));

    let outcome = service.analyze(request(ExamMode::After)).expect("analysis runs");

    let entry = &outcome.results[0];
    assert_eq!(entry.cutline_score, None);
    assert_eq!(entry.is_passed, None);
}

#[test]
fn failing_departments_are_skipped_not_fatal() {
    let catalog = MemoryCatalog::choosing(vec![broken_grades(), economics()]);
    let service = build_service(scored_student(), catalog);

    let outcome = service.analyze(request(ExamMode::After)).expect("analysis runs");

    assert!(outcome.success);
    assert_eq!(outcome.count, 1);
    assert_eq!(outcome.results[0].department_id, DepartmentId(10));
}

#[test]
fn missing_score_row_is_reported_without_error() {
    let service = build_service(scored_student(), MemoryCatalog::choosing(vec![economics()]));

    let outcome = service.analyze(request(ExamMode::Before)).expect("analysis runs");

    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some(NO_SCORES_MESSAGE));
    assert_eq!(outcome.count, 0);
    assert!(outcome.results.is_empty());
}

#[test]
fn empty_and_unreadable_score_sheets_are_reported() {
    let scores = MemoryScores::default();
    scores
        .upsert(record(STUDENT, ExamMode::Before, RawScores::new()))
        .expect("upsert");
    let unreadable: RawScores =
        serde_json::from_value(serde_json::json!({ "999": { "default": { "percentile": 50 } } }))
            .expect("object");
    scores
        .upsert(record(STUDENT, ExamMode::After, unreadable))
        .expect("upsert");
    let service = build_service(scores, MemoryCatalog::choosing(vec![economics()]));

    let empty = service.analyze(request(ExamMode::Before)).expect("runs");
    assert_eq!(empty.message.as_deref(), Some(NO_SCORES_MESSAGE));

    let unreadable = service.analyze(request(ExamMode::After)).expect("runs");
    assert_eq!(unreadable.message.as_deref(), Some(NO_READABLE_SCORES_MESSAGE));
    assert!(!unreadable.success);
}

#[test]
fn no_chosen_departments_is_reported() {
    let service = build_service(scored_student(), MemoryCatalog::default());

    let outcome = service.analyze(request(ExamMode::After)).expect("analysis runs");

    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some(NO_CHOICES_MESSAGE));
}

#[test]
fn zero_scored_departments_is_reported() {
    let catalog = MemoryCatalog::choosing(vec![unconfigured(), broken_grades()]);
    let service = build_service(scored_student(), catalog);

    let outcome = service.analyze(request(ExamMode::After)).expect("analysis runs");

    assert!(!outcome.success);
    assert_eq!(outcome.count, 0);
    assert_eq!(outcome.message.as_deref(), Some(NO_RESULTS_MESSAGE));
}

#[test]
fn catalog_failures_propagate() {
    let service = build_service(scored_student(), UnavailableCatalog);

    match service.analyze(request(ExamMode::After)) {
        Err(AnalysisServiceError::Repository(RepositoryError::Unavailable(reason))) => {
            assert_eq!(reason, "database offline");
        }
        other => panic!("expected repository error, got {other:?}"),
    }
}

#[test]
fn equal_scores_keep_choice_order() {
    let first = economics();
    let mut second = economics();
    second.id = DepartmentId(20);
    second.name = "Business".to_string();
    let directory = SubjectDirectory::from_subjects(&subjects());
    let scores = normalize_scores(&raw_scores(), &directory);

    let results = rank_departments(
        &EvaluationEngine::new(),
        &scores,
        &[first, second],
        &MaxScoreReference::fallback(YEAR),
    );

    assert_eq!(results[0].department_id, DepartmentId(10));
    assert_eq!(results[1].department_id, DepartmentId(20));
}

#[test]
fn analysis_is_repeatable() {
    let catalog = MemoryCatalog::choosing(vec![economics(), physics()]);
    let service = build_service(scored_student(), catalog);

    let first = service.analyze(request(ExamMode::After)).expect("runs");
    let second = service.analyze(request(ExamMode::After)).expect("runs");

    assert_eq!(first, second);
}
