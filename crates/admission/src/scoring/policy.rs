use serde::{Deserialize, Serialize};

use super::domain::{ScoreType, SubjectId, SubjectKind};
use super::max_score::MaxScoreMethod;

pub const DEFAULT_TOTAL_SCORE: f64 = 1000.0;

/// Whether a department scores by its base policy or through a literal formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalculationType {
    #[default]
    #[serde(rename = "ratio", alias = "기본비율")]
    Ratio,
    #[serde(rename = "formula", alias = "특수공식")]
    Formula,
}

/// How the English or Korean History conversion is applied on top of the weighted total.
///
/// Both additive modes add the converted value to the running total; `None` means the subject
/// is either folded into the weighting or not reflected at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BonusMode {
    #[serde(rename = "A_ADD")]
    ApplyBeforeRatio,
    #[serde(rename = "B_ADD")]
    ApplyAfterRatio,
    #[default]
    #[serde(rename = "NONE")]
    None,
}

impl BonusMode {
    pub const fn is_additive(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Per-subject department ratios, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubjectRatios {
    #[serde(default)]
    pub korean: Option<f64>,
    #[serde(default)]
    pub math: Option<f64>,
    #[serde(default)]
    pub inquiry: Option<f64>,
    #[serde(default)]
    pub english: Option<f64>,
}

impl SubjectRatios {
    pub fn get(&self, kind: SubjectKind) -> Option<f64> {
        match kind {
            SubjectKind::Korean => self.korean,
            SubjectKind::Math => self.math,
            SubjectKind::Inquiry => self.inquiry,
            SubjectKind::English => self.english,
            SubjectKind::KoreanHistory => None,
        }
    }

    /// Ratio with an absent entry read as zero.
    pub fn ratio_for(&self, kind: SubjectKind) -> f64 {
        self.get(kind).unwrap_or(0.0)
    }
}

/// Ratio-shape subject slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectScoreConfig {
    pub subject: SubjectKind,
    pub score_type: ScoreType,
    #[serde(default)]
    pub max_score_method: Option<MaxScoreMethod>,
    #[serde(default)]
    pub max_score_value: Option<f64>,
    /// `None` and `Some(0)` are mandatory; any other group is a selection pool.
    #[serde(default)]
    pub priority_group: Option<u32>,
}

/// Fixed ratios, optionally with priority-group selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatioPolicy {
    #[serde(default)]
    pub ratios: SubjectRatios,
    #[serde(default)]
    pub subjects: Vec<SubjectScoreConfig>,
}

impl RatioPolicy {
    pub fn uses_priority_groups(&self) -> bool {
        self.subjects
            .iter()
            .any(|subject| subject.priority_group.is_some())
    }
}

/// Rule-shape subject slot keyed by catalog subject id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSubjectConfig {
    pub subject_id: SubjectId,
    /// Kind resolved from the subject catalog when the department was loaded.
    pub subject: SubjectKind,
    pub score_type: ScoreType,
    #[serde(default)]
    pub max_score_method: Option<MaxScoreMethod>,
    #[serde(default)]
    pub max_score_value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeightType {
    Fixed,
    Rank,
}

/// Explicit weighting rule over a group of subjects. Weights are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentScoreRule {
    pub subject_group: Vec<SubjectId>,
    pub pick_count: usize,
    pub weight_type: WeightType,
    #[serde(default)]
    pub weights: Vec<f64>,
}

impl DepartmentScoreRule {
    /// Weight of a position, zero when the rule does not define one.
    pub fn weight_at(&self, index: usize) -> f64 {
        self.weights.get(index).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RulePolicy {
    #[serde(default)]
    pub subjects: Vec<DepartmentSubjectConfig>,
    #[serde(default)]
    pub rules: Vec<DepartmentScoreRule>,
}

impl RulePolicy {
    pub fn subject(&self, id: SubjectId) -> Option<&DepartmentSubjectConfig> {
        self.subjects.iter().find(|subject| subject.subject_id == id)
    }
}

/// Weighting shape a department is configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ScoringPolicy {
    Ratio(RatioPolicy),
    Rule(RulePolicy),
}

impl ScoringPolicy {
    /// A department without subject configuration cannot be scored.
    pub fn is_configured(&self) -> bool {
        match self {
            Self::Ratio(policy) => !policy.subjects.is_empty(),
            Self::Rule(policy) => !policy.subjects.is_empty() && !policy.rules.is_empty(),
        }
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::Ratio(RatioPolicy::default())
    }
}

/// Complete scoring configuration of a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentScoringPolicy {
    #[serde(default)]
    pub calculation_type: CalculationType,
    #[serde(default = "default_inquiry_subject_count")]
    pub inquiry_subject_count: u8,
    #[serde(default)]
    pub history_bonus: BonusMode,
    #[serde(default)]
    pub english_bonus: BonusMode,
    #[serde(default)]
    pub special_formula: Option<String>,
    #[serde(default)]
    pub cutline_score: Option<f64>,
    #[serde(default = "default_total_score")]
    pub total_score: f64,
    #[serde(default)]
    pub scoring: ScoringPolicy,
}

impl DepartmentScoringPolicy {
    pub fn ratio(ratios: SubjectRatios, subjects: Vec<SubjectScoreConfig>) -> Self {
        Self::with_scoring(ScoringPolicy::Ratio(RatioPolicy { ratios, subjects }))
    }

    pub fn rules(subjects: Vec<DepartmentSubjectConfig>, rules: Vec<DepartmentScoreRule>) -> Self {
        Self::with_scoring(ScoringPolicy::Rule(RulePolicy { subjects, rules }))
    }

    fn with_scoring(scoring: ScoringPolicy) -> Self {
        Self {
            calculation_type: CalculationType::Ratio,
            inquiry_subject_count: default_inquiry_subject_count(),
            history_bonus: BonusMode::None,
            english_bonus: BonusMode::None,
            special_formula: None,
            cutline_score: None,
            total_score: default_total_score(),
            scoring,
        }
    }

    /// English and Korean History are left out of the weighting when their conversion is
    /// added as a bonus.
    pub fn is_added_as_bonus(&self, kind: SubjectKind) -> bool {
        match kind {
            SubjectKind::English => self.english_bonus.is_additive(),
            SubjectKind::KoreanHistory => self.history_bonus.is_additive(),
            SubjectKind::Korean | SubjectKind::Math | SubjectKind::Inquiry => false,
        }
    }

    /// Inquiry count with the unset value read as best-of-one.
    pub fn inquiry_count(&self) -> u8 {
        self.inquiry_subject_count.max(1)
    }

    /// Total used for percentages; non-positive totals fall back to the default.
    pub fn effective_total(&self) -> f64 {
        if self.total_score > 0.0 {
            self.total_score
        } else {
            DEFAULT_TOTAL_SCORE
        }
    }

    /// Cutline used for the pass verdict; zero or negative values mean no cutline.
    pub fn effective_cutline(&self) -> Option<f64> {
        self.cutline_score.filter(|cutline| *cutline > 0.0)
    }
}

fn default_inquiry_subject_count() -> u8 {
    1
}

fn default_total_score() -> f64 {
    DEFAULT_TOTAL_SCORE
}
