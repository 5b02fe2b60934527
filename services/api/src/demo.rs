use crate::infra::{load_catalog, read_score_sheet, InMemoryCatalog, InMemoryExamScoreRepository};
use admission::analysis::{rank_departments, AnalysisOutcome, AnalysisRequest, AnalysisService, ResultEntry};
use admission::catalog::CatalogSnapshot;
use admission::config::DEFAULT_REFERENCE_YEAR;
use admission::error::AppError;
use admission::intake::{ExamScoreService, ExamScoreSubmission};
use admission::scoring::{
    normalize_scores, EvaluationEngine, ExamMode, MaxScoreReference, RawScores, UserId,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) const DEMO_STUDENT: UserId = UserId(1);

const DEMO_CATALOG: &str = r#"{
    "subjects": [
        { "id": 1, "name": "국어", "category": "공통", "kind": "korean" },
        { "id": 2, "name": "수학", "category": "공통", "kind": "math" },
        { "id": 3, "name": "영어", "category": "공통", "kind": "english" },
        { "id": 4, "name": "한국사", "category": "공통", "kind": "korean_history" },
        { "id": 5, "name": "사회탐구", "category": "탐구" },
        { "id": 6, "name": "과학탐구", "category": "탐구" }
    ],
    "departments": [
        {
            "id": 1,
            "school_name": "Hanbit University",
            "name": "Economics",
            "division": "가",
            "region": "Seoul",
            "policy": {
                "inquiry_subject_count": 2,
                "history_bonus": "A_ADD",
                "cutline_score": 95,
                "scoring": {
                    "shape": "ratio",
                    "ratios": { "korean": 0.3, "math": 0.3, "inquiry": 0.4 },
                    "subjects": [
                        { "subject": "korean", "score_type": "percentile" },
                        { "subject": "math", "score_type": "percentile" },
                        { "subject": "inquiry", "score_type": "percentile" }
                    ]
                }
            }
        },
        {
            "id": 2,
            "school_name": "Hanbit University",
            "name": "Mechanical Engineering",
            "division": "가",
            "region": "Seoul",
            "policy": {
                "cutline_score": 80,
                "scoring": {
                    "shape": "ratio",
                    "ratios": { "korean": 0.2, "math": 0.4, "inquiry": 0.2, "english": 0.2 },
                    "subjects": [
                        { "subject": "korean", "score_type": "standard_score", "max_score_method": "highest_of_year" },
                        { "subject": "math", "score_type": "standard_score", "max_score_method": "highest_of_year" },
                        { "subject": "inquiry", "score_type": "converted_standard_score", "max_score_method": "fixed_100" },
                        { "subject": "english", "score_type": "grade_conversion", "max_score_method": "fixed_100" }
                    ]
                }
            }
        },
        {
            "id": 3,
            "school_name": "Daeyang Institute",
            "name": "Business Administration",
            "division": "나",
            "region": "Busan",
            "policy": {
                "english_bonus": "B_ADD",
                "history_bonus": "A_ADD",
                "total_score": 500,
                "scoring": {
                    "shape": "ratio",
                    "ratios": { "korean": 0.5, "math": 0.5 },
                    "subjects": [
                        { "subject": "korean", "score_type": "percentile" },
                        { "subject": "math", "score_type": "percentile" },
                        { "subject": "english", "score_type": "grade_conversion", "max_score_method": "custom", "max_score_value": 50 }
                    ]
                }
            }
        },
        {
            "id": 4,
            "school_name": "Daeyang Institute",
            "name": "Computer Science",
            "division": "나",
            "policy": {
                "cutline_score": 75,
                "scoring": {
                    "shape": "rule",
                    "subjects": [
                        { "subject_id": 1, "subject": "korean", "score_type": "percentile" },
                        { "subject_id": 2, "subject": "math", "score_type": "percentile" },
                        { "subject_id": 6, "subject": "inquiry", "score_type": "percentile" }
                    ],
                    "rules": [
                        { "subject_group": [2], "pick_count": 1, "weight_type": "FIXED", "weights": [40] },
                        { "subject_group": [1, 6], "pick_count": 1, "weight_type": "RANK", "weights": [40] }
                    ]
                }
            }
        },
        {
            "id": 5,
            "school_name": "Mirae College",
            "name": "Nursing",
            "division": "다",
            "region": "Daejeon",
            "policy": {
                "scoring": {
                    "shape": "ratio",
                    "ratios": { "korean": 0.4, "math": 0.2, "inquiry": 0.2, "english": 0.2 },
                    "subjects": [
                        { "subject": "korean", "score_type": "percentile", "priority_group": 0 },
                        { "subject": "math", "score_type": "percentile", "priority_group": 1 },
                        { "subject": "inquiry", "score_type": "percentile", "priority_group": 1 },
                        { "subject": "english", "score_type": "grade_conversion", "max_score_method": "fixed_100", "priority_group": 1 }
                    ]
                }
            }
        },
        {
            "id": 6,
            "school_name": "Mirae College",
            "name": "Design",
            "division": "다",
            "policy": {}
        }
    ],
    "grade_conversions": [
        { "department_id": 3, "subject_code": "ENGLISH", "grade": 1, "converted_score": 50 },
        { "department_id": 3, "subject_code": "ENGLISH", "grade": 2, "converted_score": 48 },
        { "department_id": 3, "subject_code": "ENGLISH", "grade": 3, "converted_score": 44 },
        { "department_id": 3, "subject_code": "K_HISTORY", "grade": 4, "converted_score": 4 }
    ],
    "max_scores": [
        { "year": 2025, "subject_code": "KOR_MAX", "max_standard_score": 139 },
        { "year": 2025, "subject_code": "MATH_MAX", "max_standard_score": 140 },
        { "year": 2025, "subject_code": "INQUIRY_MAX", "max_standard_score": 73 }
    ],
    "choices": [
        { "user_id": 1, "department_ids": [1, 3, 4] }
    ]
}"#;

const DEMO_SCORES: &str = r#"{
    "1": { "default": { "standardScore": 131, "percentile": 95, "grade": 1 } },
    "2": { "default": { "standardScore": 127, "percentile": 90, "grade": 2 } },
    "3": { "default": { "grade": 2 } },
    "4": { "default": { "grade": 4 } },
    "6": {
        "탐구1": { "standardScore": 64, "percentile": 80, "convertedStandardScore": 66.5 },
        "탐구2": { "standardScore": 67, "percentile": 90, "convertedStandardScore": 68.2 }
    }
}"#;

pub(crate) fn demo_catalog() -> Result<CatalogSnapshot, AppError> {
    Ok(CatalogSnapshot::from_reader(DEMO_CATALOG.as_bytes())?)
}

fn demo_scores() -> Result<RawScores, AppError> {
    Ok(serde_json::from_str(DEMO_SCORES)?)
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Exam mode the demo score sheet is saved under.
    #[arg(long, default_value = "after")]
    pub(crate) mode: String,
    /// Print the weighted components behind every converted score.
    #[arg(long)]
    pub(crate) components: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// JSON score sheet keyed by subject id.
    #[arg(long)]
    pub(crate) scores: PathBuf,
    /// Department catalog JSON. Defaults to the bundled demo catalog.
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Grade conversion CSV attached to the catalog.
    #[arg(long)]
    pub(crate) grades: Option<PathBuf>,
    /// Admission year whose max-score rows are used.
    #[arg(long, default_value_t = DEFAULT_REFERENCE_YEAR)]
    pub(crate) year: i32,
    /// Only score these department ids.
    #[arg(long = "department")]
    pub(crate) departments: Vec<u64>,
    /// Print the ranking as JSON instead of a table.
    #[arg(long)]
    pub(crate) json: bool,
    /// Print the weighted components behind every converted score.
    #[arg(long)]
    pub(crate) components: bool,
}

/// Scores one sheet against the catalog without any stored state.
pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let snapshot = load_catalog(args.catalog.as_deref(), args.grades.as_deref())?;
    let raw = read_score_sheet(&args.scores)?;
    let departments: Vec<_> = snapshot
        .departments
        .iter()
        .filter(|department| {
            args.departments.is_empty() || args.departments.contains(&department.id.0)
        })
        .cloned()
        .collect();

    let results = rank_catalog(&snapshot, &raw, &departments, args.year);

    if args.json {
        let outcome = AnalysisOutcome::scored(results);
        let rendered = serde_json::to_string_pretty(&outcome)?;
        println!("{rendered}");
    } else {
        render_results(&results, args.components);
    }
    Ok(())
}

fn rank_catalog(
    snapshot: &CatalogSnapshot,
    raw: &RawScores,
    departments: &[admission::catalog::DepartmentProfile],
    year: i32,
) -> Vec<ResultEntry> {
    let scores = normalize_scores(raw, &snapshot.directory());
    let max_scores = MaxScoreReference::from_rows(year, &snapshot.max_scores);
    rank_departments(&EvaluationEngine::new(), &scores, departments, &max_scores)
}

/// Saves the demo sheet, analyzes the seeded choices, then ranks the whole catalog.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mode = ExamMode::parse(&args.mode)
        .ok_or_else(|| AppError::Input("mode must be 'before' or 'after'".to_string()))?;
    let snapshot = demo_catalog()?;
    let raw = demo_scores()?;

    let scores = Arc::new(InMemoryExamScoreRepository::default());
    let catalog = Arc::new(InMemoryCatalog::from_snapshot(snapshot.clone()));
    let intake = ExamScoreService::new(scores.clone());
    intake
        .submit(ExamScoreSubmission {
            user_id: DEMO_STUDENT,
            mode,
            scores: raw.clone(),
        })
        .map_err(|err| AppError::Input(err.to_string()))?;

    let analysis = AnalysisService::new(scores, catalog.clone(), DEFAULT_REFERENCE_YEAR);
    let outcome = analysis.analyze(AnalysisRequest {
        user_id: DEMO_STUDENT,
        mode,
    })?;

    println!(
        "Converted score demo (student {}, {} exam, reference year {})",
        DEMO_STUDENT,
        mode.label(),
        analysis.reference_year()
    );
    println!("\nChosen departments");
    match outcome.message.as_deref() {
        Some(message) => println!("  {message}"),
        None => render_results(&outcome.results, args.components),
    }

    println!("\nWhole catalog");
    let results = rank_catalog(&snapshot, &raw, catalog.departments(), DEFAULT_REFERENCE_YEAR);
    render_results(&results, args.components);
    let skipped = catalog.departments().len() - results.len();
    if skipped > 0 {
        println!("  ({skipped} department(s) have no scoring configuration)");
    }

    Ok(())
}

fn render_results(results: &[ResultEntry], components: bool) {
    if results.is_empty() {
        println!("  no department could be scored");
        return;
    }

    for (rank, entry) in results.iter().enumerate() {
        let verdict = match entry.is_passed {
            Some(true) => "above cutline",
            Some(false) => "below cutline",
            None => "no cutline",
        };
        println!(
            "  {:>2}. {} {} [{}] {:.2} / {:.0} ({:.2}%) {}",
            rank + 1,
            entry.school_name,
            entry.department_name,
            entry.division.as_deref().unwrap_or("-"),
            entry.converted_score,
            entry.total_score,
            entry.percentage,
            verdict
        );
        if components {
            for component in &entry.components {
                println!(
                    "        - {}: {:.2} x {:.3} = {:.2} ({})",
                    component.factor,
                    component.value,
                    component.weight,
                    component.contribution,
                    component.notes
                );
            }
        }
    }
}
