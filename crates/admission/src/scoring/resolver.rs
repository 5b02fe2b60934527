use super::domain::{CanonicalScoreSet, ScoreType, SubjectRole};

/// The requested field of a role's result, if both exist.
pub fn resolve_score(set: &CanonicalScoreSet, role: SubjectRole, score_type: ScoreType) -> Option<f64> {
    set.get(role)?.field(score_type)
}

/// Inquiry reduction: best of two for `subject_count == 1`, average of two for
/// `subject_count == 2`. The second inquiry never stands in for a missing first one.
pub fn resolve_inquiry(set: &CanonicalScoreSet, score_type: ScoreType, subject_count: u8) -> Option<f64> {
    let first = resolve_score(set, SubjectRole::Inquiry1, score_type)?;
    let second = resolve_score(set, SubjectRole::Inquiry2, score_type);

    match (subject_count, second) {
        (1, Some(second)) => Some(first.max(second)),
        (2, Some(second)) => Some((first + second) / 2.0),
        _ => Some(first),
    }
}

/// Grade of a role, used by the English and Korean History conversions.
pub fn resolve_grade(set: &CanonicalScoreSet, role: SubjectRole) -> Option<u8> {
    set.get(role)?.grade
}
