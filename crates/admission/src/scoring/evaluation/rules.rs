use std::collections::BTreeMap;

use tracing::debug;

use super::{resolve_slot_value, Candidate, EvaluationContext, ScoreComponent};
use crate::scoring::domain::{SubjectId, SubjectKind};
use crate::scoring::policy::{DepartmentScoreRule, DepartmentScoringPolicy, RulePolicy, WeightType};

#[derive(Debug, Clone, Copy)]
pub(super) struct CollectedScore {
    subject: SubjectKind,
    value: f64,
    ceiling: f64,
}

pub(super) type CollectedScores = BTreeMap<SubjectId, CollectedScore>;

pub(super) fn collect_subject_scores(
    rule_policy: &RulePolicy,
    policy: &DepartmentScoringPolicy,
    context: &EvaluationContext<'_>,
) -> CollectedScores {
    let mut collected = CollectedScores::new();

    for slot in &rule_policy.subjects {
        if policy.is_added_as_bonus(slot.subject) {
            debug!(subject = slot.subject.label(), "added as a bonus, left out of weighting");
            continue;
        }

        let ceiling =
            context
                .max_scores
                .ceiling(slot.subject, slot.max_score_method, slot.max_score_value);
        match resolve_slot_value(
            slot.subject,
            slot.score_type,
            ceiling,
            policy.inquiry_count(),
            context,
        ) {
            Some(value) => {
                collected.insert(
                    slot.subject_id,
                    CollectedScore {
                        subject: slot.subject,
                        value,
                        ceiling,
                    },
                );
            }
            None => debug!(subject_id = %slot.subject_id, "no usable score, slot dropped"),
        }
    }

    collected
}

pub(super) fn apply_weighting(
    rule_policy: &RulePolicy,
    collected: &CollectedScores,
    components: &mut Vec<ScoreComponent>,
) -> f64 {
    rule_policy
        .rules
        .iter()
        .enumerate()
        .map(|(index, rule)| match rule.weight_type {
            WeightType::Fixed => apply_fixed(index, rule, collected, components),
            WeightType::Rank => apply_rank(index, rule, collected, components),
        })
        .sum()
}

/// Weights follow declaration order; a subject without a score contributes zero.
fn apply_fixed(
    index: usize,
    rule: &DepartmentScoreRule,
    collected: &CollectedScores,
    components: &mut Vec<ScoreComponent>,
) -> f64 {
    let mut total = 0.0;

    for (position, subject_id) in rule.subject_group.iter().enumerate() {
        let Some(score) = collected.get(subject_id) else {
            debug!(rule = index, %subject_id, "fixed rule subject has no score, counted as zero");
            continue;
        };
        let weight = rule.weight_at(position);
        let candidate = Candidate {
            subject: score.subject,
            value: score.value,
            weight,
            weighted: score.value * weight / 100.0,
            ceiling: score.ceiling,
        };
        total += candidate.weighted;
        components.push(candidate.into_component(format!("rule {index} fixed slot {position}")));
    }

    total
}

/// The best `pick_count` scores of the group receive the weights in rank order.
fn apply_rank(
    index: usize,
    rule: &DepartmentScoreRule,
    collected: &CollectedScores,
    components: &mut Vec<ScoreComponent>,
) -> f64 {
    let mut ranked: Vec<&CollectedScore> = rule
        .subject_group
        .iter()
        .filter_map(|subject_id| collected.get(subject_id))
        .collect();
    ranked.sort_by(|left, right| right.value.total_cmp(&left.value));

    let mut total = 0.0;
    for (rank, score) in ranked.into_iter().take(rule.pick_count).enumerate() {
        let weight = rule.weight_at(rank);
        let candidate = Candidate {
            subject: score.subject,
            value: score.value,
            weight,
            weighted: score.value * weight / 100.0,
            ceiling: score.ceiling,
        };
        total += candidate.weighted;
        components.push(candidate.into_component(format!("rule {index} rank {}", rank + 1)));
    }

    total
}
