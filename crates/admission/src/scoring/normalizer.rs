use std::collections::BTreeMap;

use serde_json::Value;

use super::domain::{CanonicalScoreSet, CanonicalSubjectScore, SubjectId, SubjectKind, SubjectRole};
use super::subjects::SubjectDirectory;

/// Raw score payload as stored by intake: subject id -> result payload.
pub type RawScores = BTreeMap<String, Value>;

const DEFAULT_RECORD: &str = "default";
const FIRST_INQUIRY_KEYS: [&str; 3] = ["1", "탐구1", "inquiry1"];
const SECOND_INQUIRY_KEYS: [&str; 3] = ["2", "탐구2", "inquiry2"];

/// Maps a raw payload onto the canonical subject roles.
///
/// Entries whose id is unknown (or not a subject id at all) are skipped so partially entered
/// score sheets still produce whatever can be scored.
pub fn normalize_scores(raw: &RawScores, directory: &SubjectDirectory) -> CanonicalScoreSet {
    let mut set = CanonicalScoreSet::new();

    // Subject ids are visited in numeric order so "5" is read before "10".
    let mut entries: BTreeMap<SubjectId, &Value> = BTreeMap::new();
    for (key, payload) in raw {
        match parse_subject_id(key) {
            Some(subject_id) => {
                entries.insert(subject_id, payload);
            }
            None => tracing::debug!(key = %key, "skipping non numeric subject key"),
        }
    }

    for (subject_id, payload) in entries {
        let Some(kind) = directory.kind_of(subject_id) else {
            tracing::debug!(%subject_id, "skipping unknown subject");
            continue;
        };

        match kind {
            SubjectKind::Inquiry => {
                if let Some(record) = sub_record(payload, &FIRST_INQUIRY_KEYS) {
                    set.insert(SubjectRole::Inquiry1, coerce_record(record, subject_id));
                }
                if let Some(record) = sub_record(payload, &SECOND_INQUIRY_KEYS) {
                    set.insert(SubjectRole::Inquiry2, coerce_record(record, subject_id));
                }
                if !set.contains(SubjectRole::Inquiry1) {
                    if let Some(record) = sub_record(payload, &[DEFAULT_RECORD]) {
                        set.insert(SubjectRole::Inquiry1, coerce_record(record, subject_id));
                    }
                }
            }
            other => {
                if let Some(record) = sub_record(payload, &[DEFAULT_RECORD]) {
                    set.insert(role_for(other), coerce_record(record, subject_id));
                }
            }
        }
    }

    set
}

fn role_for(kind: SubjectKind) -> SubjectRole {
    match kind {
        SubjectKind::Korean => SubjectRole::Korean,
        SubjectKind::Math => SubjectRole::Math,
        SubjectKind::English => SubjectRole::English,
        SubjectKind::KoreanHistory => SubjectRole::KoreanHistory,
        SubjectKind::Inquiry => SubjectRole::Inquiry1,
    }
}

fn parse_subject_id(key: &str) -> Option<SubjectId> {
    key.trim().parse::<u64>().ok().map(SubjectId)
}

fn sub_record<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let object = payload.as_object()?;
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| value.is_object())
}

fn coerce_record(record: &Value, subject_id: SubjectId) -> CanonicalSubjectScore {
    CanonicalSubjectScore {
        standard_score: record.get("standardScore").and_then(coerce_number),
        percentile: record.get("percentile").and_then(coerce_number),
        converted_standard_score: record.get("convertedStandardScore").and_then(coerce_number),
        grade: record.get("grade").and_then(coerce_grade),
        raw_score: record.get("rawScore").and_then(coerce_number),
        subject_id: Some(subject_id),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|number| number.is_finite())
}

fn coerce_grade(value: &Value) -> Option<u8> {
    let grade = coerce_number(value)?.trunc();
    if (0.0..=f64::from(u8::MAX)).contains(&grade) {
        Some(grade as u8)
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) fn coerce_number_for_tests(value: &Value) -> Option<f64> {
    coerce_number(value)
}
