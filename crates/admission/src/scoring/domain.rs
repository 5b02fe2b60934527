use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier wrapper for students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    /// Accepts a positive JSON integer or a numeric string, the shapes request bodies use.
    pub fn from_json(value: &Value) -> Option<Self> {
        positive_id(value).map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for school departments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepartmentId(pub u64);

impl DepartmentId {
    pub fn from_json(value: &Value) -> Option<Self> {
        positive_id(value).map(Self)
    }
}

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for catalog subjects (the keys of a raw score payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub u64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn positive_id(value: &Value) -> Option<u64> {
    let id = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

/// Exam context a score set belongs to: the mock exam (`before`) or the actual one (`after`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamMode {
    Before,
    After,
}

impl ExamMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// Enumerated subject kind a catalog subject maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Korean,
    Math,
    English,
    KoreanHistory,
    Inquiry,
}

impl SubjectKind {
    /// Derives the kind from a display name, for catalogs that do not store one.
    ///
    /// Order matters: Korean History has to be checked before the bare `korean` alias.
    pub fn from_display_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }

        if lowered.contains("한국사")
            || lowered == "korean history"
            || lowered == "korean_history"
            || lowered == "history"
        {
            Some(Self::KoreanHistory)
        } else if lowered.contains("국어") || lowered == "korean" {
            Some(Self::Korean)
        } else if lowered.contains("수학") || lowered == "math" {
            Some(Self::Math)
        } else if lowered.contains("영어") || lowered == "english" {
            Some(Self::English)
        } else if lowered.contains("탐구")
            || lowered.contains("사회")
            || lowered.contains("과학")
            || lowered == "inquiry"
        {
            Some(Self::Inquiry)
        } else {
            None
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Korean => "korean",
            Self::Math => "math",
            Self::English => "english",
            Self::KoreanHistory => "korean_history",
            Self::Inquiry => "inquiry",
        }
    }
}

/// Slot of a canonical score set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRole {
    Korean,
    Math,
    English,
    KoreanHistory,
    Inquiry1,
    Inquiry2,
}

impl SubjectRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Korean => "korean",
            Self::Math => "math",
            Self::English => "english",
            Self::KoreanHistory => "korean_history",
            Self::Inquiry1 => "inquiry1",
            Self::Inquiry2 => "inquiry2",
        }
    }
}

/// Which field of a subject result a department reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreType {
    #[serde(rename = "standard_score", alias = "표준점수")]
    StandardScore,
    #[serde(rename = "percentile", alias = "백분위")]
    Percentile,
    #[serde(rename = "converted_standard_score", alias = "변환표준점수")]
    ConvertedStandardScore,
    #[serde(rename = "grade_conversion", alias = "fixed_max_score")]
    GradeConversion,
}

/// Normalized result for one subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSubjectScore {
    pub standard_score: Option<f64>,
    pub percentile: Option<f64>,
    pub converted_standard_score: Option<f64>,
    pub grade: Option<u8>,
    pub raw_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<SubjectId>,
}

impl CanonicalSubjectScore {
    /// Numeric field for the requested score type. Grade conversion has no direct field.
    pub fn field(&self, score_type: ScoreType) -> Option<f64> {
        match score_type {
            ScoreType::StandardScore => self.standard_score,
            ScoreType::Percentile => self.percentile,
            ScoreType::ConvertedStandardScore => self.converted_standard_score,
            ScoreType::GradeConversion => None,
        }
    }
}

/// Canonical scores of one student for one exam mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalScoreSet {
    scores: BTreeMap<SubjectRole, CanonicalSubjectScore>,
}

impl CanonicalScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, role: SubjectRole) -> Option<&CanonicalSubjectScore> {
        self.scores.get(&role)
    }

    pub fn contains(&self, role: SubjectRole) -> bool {
        self.scores.contains_key(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn roles(&self) -> impl Iterator<Item = SubjectRole> + '_ {
        self.scores.keys().copied()
    }

    /// Builder used while normalizing and in tests.
    pub fn with(mut self, role: SubjectRole, score: CanonicalSubjectScore) -> Self {
        self.scores.insert(role, score);
        self
    }

    pub(crate) fn insert(&mut self, role: SubjectRole, score: CanonicalSubjectScore) {
        self.scores.insert(role, score);
    }
}

/// Rounds to two decimal places, the precision of every reported score.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_resolve_to_kinds() {
        assert_eq!(SubjectKind::from_display_name("국어"), Some(SubjectKind::Korean));
        assert_eq!(SubjectKind::from_display_name("Math"), Some(SubjectKind::Math));
        assert_eq!(SubjectKind::from_display_name("영어"), Some(SubjectKind::English));
        assert_eq!(
            SubjectKind::from_display_name("한국사"),
            Some(SubjectKind::KoreanHistory)
        );
        assert_eq!(
            SubjectKind::from_display_name("Korean History"),
            Some(SubjectKind::KoreanHistory)
        );
        assert_eq!(
            SubjectKind::from_display_name("사회탐구"),
            Some(SubjectKind::Inquiry)
        );
        assert_eq!(SubjectKind::from_display_name("제2외국어"), None);
    }

    #[test]
    fn ids_parse_from_numbers_and_strings() {
        assert_eq!(UserId::from_json(&serde_json::json!(42)), Some(UserId(42)));
        assert_eq!(UserId::from_json(&serde_json::json!(" 7 ")), Some(UserId(7)));
        assert_eq!(UserId::from_json(&serde_json::json!(0)), None);
        assert_eq!(UserId::from_json(&serde_json::json!(-3)), None);
        assert_eq!(DepartmentId::from_json(&serde_json::json!(null)), None);
        assert_eq!(DepartmentId::from_json(&serde_json::json!("abc")), None);
    }

    #[test]
    fn exam_mode_parses_case_insensitively() {
        assert_eq!(ExamMode::parse(" After "), Some(ExamMode::After));
        assert_eq!(ExamMode::parse("before"), Some(ExamMode::Before));
        assert_eq!(ExamMode::parse("during"), None);
    }

    #[test]
    fn score_type_accepts_korean_aliases() {
        let parsed: ScoreType = serde_json::from_str("\"백분위\"").expect("alias parses");
        assert_eq!(parsed, ScoreType::Percentile);
        let parsed: ScoreType =
            serde_json::from_str("\"converted_standard_score\"").expect("name parses");
        assert_eq!(parsed, ScoreType::ConvertedStandardScore);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(69.0), 69.0);
        assert_eq!(round2(123.456), 123.46);
        assert_eq!(round2(0.1 + 0.2), 0.3);
    }
}
