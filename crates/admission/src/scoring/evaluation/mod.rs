mod bonus;
mod ratio;
mod rules;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::conversion::GradeConversionTable;
use super::domain::{round2, CanonicalScoreSet, ScoreType, SubjectKind, SubjectRole};
use super::max_score::MaxScoreReference;
use super::policy::{CalculationType, DepartmentScoringPolicy, ScoringPolicy};
use super::resolver::{resolve_grade, resolve_inquiry, resolve_score};

/// Read-only inputs shared by every department evaluated for one request.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub scores: &'a CanonicalScoreSet,
    pub grades: &'a GradeConversionTable,
    pub max_scores: &'a MaxScoreReference,
}

/// Interprets a department's literal formula text.
///
/// Returning `None` defers to the department's base policy.
pub trait FormulaEvaluator: Send + Sync {
    fn evaluate(&self, formula: &str, context: &EvaluationContext<'_>) -> Option<f64>;
}

/// Formula evaluator that never interprets the text, so every formula department is scored by
/// its base policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasePolicyFormula;

impl FormulaEvaluator for BasePolicyFormula {
    fn evaluate(&self, _formula: &str, _context: &EvaluationContext<'_>) -> Option<f64> {
        None
    }
}

/// What a score component was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Subject(SubjectKind),
    EnglishBonus,
    HistoryBonus,
    Formula,
}

impl fmt::Display for ScoreFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreFactor::Subject(kind) => f.write_str(kind.label()),
            ScoreFactor::EnglishBonus => f.write_str("english bonus"),
            ScoreFactor::HistoryBonus => f.write_str("korean history bonus"),
            ScoreFactor::Formula => f.write_str("formula"),
        }
    }
}

/// Discrete contribution to a converted score, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<f64>,
    pub notes: String,
}

/// Converted score of one department and the trail that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentEvaluation {
    pub converted_score: f64,
    pub components: Vec<ScoreComponent>,
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("{subject:?} ratio {ratio} is outside 0.0..=1.0")]
    RatioOutOfRange { subject: SubjectKind, ratio: f64 },
    #[error("rule {rule} has a non-finite weight {weight}")]
    InvalidWeight { rule: usize, weight: f64 },
    #[error("converted score is not a finite number")]
    NonFiniteScore,
}

/// Stateless evaluator applying a department policy to canonical scores.
///
/// Runs CollectSubjectScores, ApplyWeighting, ApplyBonuses and Finalize in order. The same
/// inputs always produce the same rounded score.
#[derive(Clone)]
pub struct EvaluationEngine {
    formula: Arc<dyn FormulaEvaluator>,
}

impl Default for EvaluationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EvaluationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationEngine").finish_non_exhaustive()
    }
}

impl EvaluationEngine {
    pub fn new() -> Self {
        Self::with_formula_evaluator(Arc::new(BasePolicyFormula))
    }

    pub fn with_formula_evaluator(formula: Arc<dyn FormulaEvaluator>) -> Self {
        Self { formula }
    }

    /// Scores one department. `Ok(None)` means the department has no usable configuration.
    pub fn evaluate(
        &self,
        policy: &DepartmentScoringPolicy,
        context: &EvaluationContext<'_>,
    ) -> Result<Option<DepartmentEvaluation>, EvaluationError> {
        if !policy.scoring.is_configured() {
            debug!("department has no subject configuration");
            return Ok(None);
        }
        validate(policy)?;

        if policy.calculation_type == CalculationType::Formula {
            if let Some(total) = self.evaluate_formula(policy, context) {
                let component = ScoreComponent {
                    factor: ScoreFactor::Formula,
                    value: total,
                    weight: 1.0,
                    contribution: total,
                    ceiling: None,
                    notes: "special formula".to_string(),
                };
                return finalize(total, vec![component]).map(Some);
            }
        }

        let mut components = Vec::new();
        let weighted = match &policy.scoring {
            ScoringPolicy::Ratio(ratio_policy) => {
                let collected = ratio::collect_subject_scores(ratio_policy, policy, context);
                ratio::apply_weighting(ratio_policy, &collected, &mut components)
            }
            ScoringPolicy::Rule(rule_policy) => {
                let collected = rules::collect_subject_scores(rule_policy, policy, context);
                rules::apply_weighting(rule_policy, &collected, &mut components)
            }
        };
        debug!(weighted, "weighting applied");

        let bonus = bonus::apply_bonuses(policy, context, &mut components);
        debug!(bonus, "bonuses applied");

        finalize(weighted + bonus, components).map(Some)
    }

    fn evaluate_formula(
        &self,
        policy: &DepartmentScoringPolicy,
        context: &EvaluationContext<'_>,
    ) -> Option<f64> {
        let formula = policy
            .special_formula
            .as_deref()
            .map(str::trim)
            .filter(|formula| !formula.is_empty())?;

        let total = self.formula.evaluate(formula, context);
        if total.is_none() {
            debug!(formula, "formula not interpreted, scoring by base policy");
        }
        total
    }
}

fn validate(policy: &DepartmentScoringPolicy) -> Result<(), EvaluationError> {
    match &policy.scoring {
        ScoringPolicy::Ratio(ratio_policy) => {
            for subject in [
                SubjectKind::Korean,
                SubjectKind::Math,
                SubjectKind::Inquiry,
                SubjectKind::English,
            ] {
                if let Some(ratio) = ratio_policy.ratios.get(subject) {
                    if !(0.0..=1.0).contains(&ratio) {
                        return Err(EvaluationError::RatioOutOfRange { subject, ratio });
                    }
                }
            }
        }
        ScoringPolicy::Rule(rule_policy) => {
            for (rule, definition) in rule_policy.rules.iter().enumerate() {
                if let Some(weight) = definition.weights.iter().find(|weight| !weight.is_finite()) {
                    return Err(EvaluationError::InvalidWeight {
                        rule,
                        weight: *weight,
                    });
                }
            }
        }
    }
    Ok(())
}

fn finalize(
    total: f64,
    components: Vec<ScoreComponent>,
) -> Result<DepartmentEvaluation, EvaluationError> {
    if !total.is_finite() {
        return Err(EvaluationError::NonFiniteScore);
    }
    Ok(DepartmentEvaluation {
        converted_score: round2(total),
        components,
    })
}

/// Value a configured slot contributes before weighting, `None` when the student has no
/// usable result for it.
pub(super) fn resolve_slot_value(
    kind: SubjectKind,
    score_type: ScoreType,
    ceiling: f64,
    inquiry_count: u8,
    context: &EvaluationContext<'_>,
) -> Option<f64> {
    match kind {
        SubjectKind::Korean => resolve_score(context.scores, SubjectRole::Korean, score_type),
        SubjectKind::Math => resolve_score(context.scores, SubjectRole::Math, score_type),
        SubjectKind::Inquiry => resolve_inquiry(context.scores, score_type, inquiry_count),
        SubjectKind::English => context
            .grades
            .english_score(resolve_grade(context.scores, SubjectRole::English), ceiling),
        SubjectKind::KoreanHistory => resolve_grade(context.scores, SubjectRole::KoreanHistory)
            .map(|grade| context.grades.history_bonus(Some(grade))),
    }
}

/// Weighted candidate considered by priority groups and RANK rules.
#[derive(Debug, Clone, Copy)]
pub(super) struct Candidate {
    pub(super) subject: SubjectKind,
    pub(super) value: f64,
    pub(super) weight: f64,
    pub(super) weighted: f64,
    pub(super) ceiling: f64,
}

impl Candidate {
    pub(super) fn into_component(self, notes: String) -> ScoreComponent {
        ScoreComponent {
            factor: ScoreFactor::Subject(self.subject),
            value: self.value,
            weight: self.weight,
            contribution: self.weighted,
            ceiling: Some(self.ceiling),
            notes,
        }
    }
}

/// Sorts candidates by descending weighted score. Ties keep declaration order.
pub(super) fn rank_descending(candidates: &mut [Candidate]) {
    candidates.sort_by(|left, right| right.weighted.total_cmp(&left.weighted));
}
