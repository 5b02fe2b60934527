use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::SubjectKind;

pub const KOREAN_MAX_CODE: &str = "KOR_MAX";
pub const MATH_MAX_CODE: &str = "MATH_MAX";
pub const INQUIRY_MAX_CODE: &str = "INQUIRY_MAX";

const KOREAN_MAX_FALLBACK: f64 = 150.0;
const MATH_MAX_FALLBACK: f64 = 150.0;
const INQUIRY_MAX_FALLBACK: f64 = 70.0;
const DEFAULT_CEILING: f64 = 100.0;

/// How a subject slot's full-marks ceiling is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxScoreMethod {
    HighestOfYear,
    #[serde(rename = "fixed_200")]
    Fixed200,
    #[serde(rename = "fixed_100")]
    Fixed100,
    Custom,
}

/// One row of the yearly max-score table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxScoreRow {
    pub year: i32,
    pub subject_code: String,
    #[serde(default)]
    pub max_standard_score: Option<f64>,
    #[serde(default)]
    pub max_converted_score: Option<f64>,
}

/// Highest standard scores of an admission year, with the built-in fallbacks applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxScoreReference {
    year: i32,
    standard: BTreeMap<String, f64>,
}

impl MaxScoreReference {
    /// Builds the reference from the year's rows; rows of other years are ignored.
    pub fn from_rows<'a, I>(year: i32, rows: I) -> Self
    where
        I: IntoIterator<Item = &'a MaxScoreRow>,
    {
        let mut standard = BTreeMap::new();
        for row in rows {
            if row.year != year {
                continue;
            }
            if let Some(max) = row.max_standard_score.filter(|max| *max > 0.0) {
                standard.insert(row.subject_code.clone(), max);
            }
        }

        for (code, fallback) in [
            (KOREAN_MAX_CODE, KOREAN_MAX_FALLBACK),
            (MATH_MAX_CODE, MATH_MAX_FALLBACK),
            (INQUIRY_MAX_CODE, INQUIRY_MAX_FALLBACK),
        ] {
            standard.entry(code.to_string()).or_insert(fallback);
        }

        Self { year, standard }
    }

    /// Reference made only of the fallbacks.
    pub fn fallback(year: i32) -> Self {
        Self::from_rows(year, std::iter::empty::<&MaxScoreRow>())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn max_standard_score(&self, code: &str) -> Option<f64> {
        self.standard.get(code).copied()
    }

    /// Year-high for a subject kind, when the table tracks one.
    pub fn highest_for(&self, kind: SubjectKind) -> Option<f64> {
        let code = match kind {
            SubjectKind::Korean => KOREAN_MAX_CODE,
            SubjectKind::Math => MATH_MAX_CODE,
            SubjectKind::Inquiry => INQUIRY_MAX_CODE,
            SubjectKind::English | SubjectKind::KoreanHistory => return None,
        };
        self.max_standard_score(code)
    }

    /// Full-marks ceiling of a configured slot.
    pub fn ceiling(
        &self,
        kind: SubjectKind,
        method: Option<MaxScoreMethod>,
        value: Option<f64>,
    ) -> f64 {
        match method {
            Some(MaxScoreMethod::Fixed200) => 200.0,
            Some(MaxScoreMethod::Fixed100) => 100.0,
            Some(MaxScoreMethod::HighestOfYear) => {
                self.highest_for(kind).unwrap_or(DEFAULT_CEILING)
            }
            Some(MaxScoreMethod::Custom) | None => {
                value.filter(|value| *value > 0.0).unwrap_or(DEFAULT_CEILING)
            }
        }
    }
}
