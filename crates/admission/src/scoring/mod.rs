//! Converted-score engine: normalization, grade conversion, score resolution and the
//! per-department rule evaluator.

pub mod conversion;
pub mod domain;
pub mod evaluation;
pub mod max_score;
pub mod normalizer;
pub mod policy;
pub mod resolver;
pub mod subjects;

#[cfg(test)]
mod tests;

pub use conversion::{
    entries_from_csv, GradeConversionEntry, GradeConversionTable, GradeSubjectCode,
    GradeTableError,
};
pub use domain::{
    round2, CanonicalScoreSet, CanonicalSubjectScore, DepartmentId, ExamMode, ScoreType,
    SubjectId, SubjectKind, SubjectRole, UserId,
};
pub use evaluation::{
    BasePolicyFormula, DepartmentEvaluation, EvaluationContext, EvaluationEngine,
    EvaluationError, FormulaEvaluator, ScoreComponent, ScoreFactor,
};
pub use max_score::{MaxScoreMethod, MaxScoreReference, MaxScoreRow};
pub use normalizer::{normalize_scores, RawScores};
pub use policy::{
    BonusMode, CalculationType, DepartmentScoreRule, DepartmentScoringPolicy,
    DepartmentSubjectConfig, RatioPolicy, RulePolicy, ScoringPolicy, SubjectRatios,
    SubjectScoreConfig, WeightType,
};
pub use subjects::{Subject, SubjectDirectory};
