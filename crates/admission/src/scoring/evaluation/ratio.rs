use std::collections::BTreeMap;

use tracing::debug;

use super::{rank_descending, resolve_slot_value, Candidate, EvaluationContext, ScoreComponent, ScoreFactor};
use crate::scoring::domain::SubjectKind;
use crate::scoring::policy::{DepartmentScoringPolicy, RatioPolicy, SubjectScoreConfig};

const RATIO_ORDER: [SubjectKind; 4] = [
    SubjectKind::Korean,
    SubjectKind::Math,
    SubjectKind::Inquiry,
    SubjectKind::English,
];

#[derive(Debug, Clone, Copy)]
pub(super) struct CollectedScore {
    value: f64,
    ceiling: f64,
}

/// Resolved value per subject kind; a later slot for the same kind replaces an earlier one.
pub(super) type CollectedScores = BTreeMap<SubjectKind, CollectedScore>;

pub(super) fn collect_subject_scores(
    ratio_policy: &RatioPolicy,
    policy: &DepartmentScoringPolicy,
    context: &EvaluationContext<'_>,
) -> CollectedScores {
    let mut collected = CollectedScores::new();

    for slot in &ratio_policy.subjects {
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
                collected.insert(slot.subject, CollectedScore { value, ceiling });
            }
            None => debug!(subject = slot.subject.label(), "no usable score, slot dropped"),
        }
    }

    collected
}

pub(super) fn apply_weighting(
    ratio_policy: &RatioPolicy,
    collected: &CollectedScores,
    components: &mut Vec<ScoreComponent>,
) -> f64 {
    if ratio_policy.uses_priority_groups() {
        apply_priority_groups(ratio_policy, collected, components)
    } else {
        apply_fixed_ratios(ratio_policy, collected, components)
    }
}

fn apply_fixed_ratios(
    ratio_policy: &RatioPolicy,
    collected: &CollectedScores,
    components: &mut Vec<ScoreComponent>,
) -> f64 {
    let mut total = 0.0;

    for subject in RATIO_ORDER {
        let Some(ratio) = ratio_policy.ratios.get(subject).filter(|ratio| *ratio != 0.0) else {
            continue;
        };
        let Some(score) = collected.get(&subject) else {
            continue;
        };

        let contribution = score.value * ratio;
        total += contribution;
        components.push(ScoreComponent {
            factor: ScoreFactor::Subject(subject),
            value: score.value,
            weight: ratio,
            contribution,
            ceiling: Some(score.ceiling),
            notes: format!("{:.2} x {:.3}", score.value, ratio),
        });
    }

    total
}

/// Group 0 is summed outright and consumes part of the ratio budget; each other group fills
/// the remaining budget with its best weighted candidates.
fn apply_priority_groups(
    ratio_policy: &RatioPolicy,
    collected: &CollectedScores,
    components: &mut Vec<ScoreComponent>,
) -> f64 {
    let mut groups: BTreeMap<u32, Vec<&SubjectScoreConfig>> = BTreeMap::new();
    for slot in &ratio_policy.subjects {
        groups
            .entry(slot.priority_group.unwrap_or(0))
            .or_default()
            .push(slot);
    }

    let mut total = 0.0;
    let mut used_ratio = 0.0;

    if let Some(mandatory) = groups.get(&0) {
        for slot in mandatory {
            let Some(score) = collected.get(&slot.subject) else {
                continue;
            };
            let ratio = ratio_policy.ratios.ratio_for(slot.subject);
            let contribution = score.value * ratio;
            total += contribution;
            used_ratio += ratio;
            components.push(ScoreComponent {
                factor: ScoreFactor::Subject(slot.subject),
                value: score.value,
                weight: ratio,
                contribution,
                ceiling: Some(score.ceiling),
                notes: "mandatory group".to_string(),
            });
        }
    }

    for (group, slots) in groups.iter().filter(|(group, _)| **group != 0) {
        let mut candidates: Vec<Candidate> = slots
            .iter()
            .filter_map(|slot| {
                let score = collected.get(&slot.subject)?;
                let ratio = ratio_policy.ratios.ratio_for(slot.subject);
                (ratio > 0.0).then_some(Candidate {
                    subject: slot.subject,
                    value: score.value,
                    weight: ratio,
                    weighted: score.value * ratio,
                    ceiling: score.ceiling,
                })
            })
            .collect();

        if candidates.is_empty() {
            debug!(group, "priority group has no selectable subject");
            continue;
        }
        rank_descending(&mut candidates);

        let remaining = 1.0 - used_ratio;
        let count = selection_count(remaining, candidates[0].weight);
        debug!(group, remaining, count, "priority group selection");

        for candidate in candidates.into_iter().take(count) {
            total += candidate.weighted;
            components.push(candidate.into_component(format!("priority group {group}")));
        }
    }

    total
}

/// `round(remaining / ratio)` with halves rounding up; negative or undefined counts select
/// nothing. This is an approximation when candidates carry different ratios.
pub(super) fn selection_count(remaining: f64, ratio: f64) -> usize {
    let count = (remaining / ratio + 0.5).floor();
    if count.is_finite() && count > 0.0 {
        count as usize
    } else {
        0
    }
}
