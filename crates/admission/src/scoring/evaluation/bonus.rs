use super::{EvaluationContext, ScoreComponent, ScoreFactor};
use crate::scoring::domain::{SubjectKind, SubjectRole};
use crate::scoring::policy::{DepartmentScoringPolicy, ScoringPolicy};
use crate::scoring::resolver::resolve_grade;

const DEFAULT_ENGLISH_CEILING: f64 = 100.0;

/// Adds the English and Korean History conversions for the additive modes.
///
/// `A_ADD` and `B_ADD` behave the same: the converted value is added to the weighted total.
pub(super) fn apply_bonuses(
    policy: &DepartmentScoringPolicy,
    context: &EvaluationContext<'_>,
    components: &mut Vec<ScoreComponent>,
) -> f64 {
    let mut total = 0.0;

    if policy.english_bonus.is_additive() {
        let ceiling = english_ceiling(policy, context);
        let grade = resolve_grade(context.scores, SubjectRole::English);
        if let Some(score) = context.grades.english_score(grade, ceiling) {
            total += score;
            components.push(ScoreComponent {
                factor: ScoreFactor::EnglishBonus,
                value: score,
                weight: 1.0,
                contribution: score,
                ceiling: Some(ceiling),
                notes: format!("english grade {}", grade.unwrap_or_default()),
            });
        }
    }

    if policy.history_bonus.is_additive() {
        let grade = resolve_grade(context.scores, SubjectRole::KoreanHistory);
        let bonus = context.grades.history_bonus(grade);
        total += bonus;
        components.push(ScoreComponent {
            factor: ScoreFactor::HistoryBonus,
            value: bonus,
            weight: 1.0,
            contribution: bonus,
            ceiling: None,
            notes: match grade {
                Some(grade) => format!("korean history grade {grade}"),
                None => "no korean history grade".to_string(),
            },
        });
    }

    total
}

/// Ceiling of the department's English slot, used to scale the default English table.
fn english_ceiling(policy: &DepartmentScoringPolicy, context: &EvaluationContext<'_>) -> f64 {
    let slot = match &policy.scoring {
        ScoringPolicy::Ratio(ratio_policy) => ratio_policy
            .subjects
            .iter()
            .find(|slot| slot.subject == SubjectKind::English)
            .map(|slot| (slot.max_score_method, slot.max_score_value)),
        ScoringPolicy::Rule(rule_policy) => rule_policy
            .subjects
            .iter()
            .find(|slot| slot.subject == SubjectKind::English)
            .map(|slot| (slot.max_score_method, slot.max_score_value)),
    };

    match slot {
        Some((method, value)) => context.max_scores.ceiling(SubjectKind::English, method, value),
        None => DEFAULT_ENGLISH_CEILING,
    }
}
