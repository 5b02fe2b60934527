use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};

use super::domain::DepartmentId;

/// Subject code a grade conversion row applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GradeSubjectCode {
    English,
    KoreanHistory,
    Other(String),
}

impl GradeSubjectCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::English => "ENGLISH",
            Self::KoreanHistory => "K_HISTORY",
            Self::Other(code) => code.as_str(),
        }
    }
}

impl From<String> for GradeSubjectCode {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ENGLISH" => Self::English,
            "K_HISTORY" => Self::KoreanHistory,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<GradeSubjectCode> for String {
    fn from(value: GradeSubjectCode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for GradeSubjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One department-specific grade conversion row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeConversionEntry {
    pub department_id: DepartmentId,
    pub subject_code: GradeSubjectCode,
    pub grade: u8,
    pub converted_score: f64,
}

/// Errors raised while building or loading grade conversion tables.
#[derive(Debug, thiserror::Error)]
pub enum GradeTableError {
    #[error("duplicate grade conversion for department {department_id}, {subject_code} grade {grade}")]
    Duplicate {
        department_id: DepartmentId,
        subject_code: GradeSubjectCode,
        grade: u8,
    },
    #[error("invalid grade conversion CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Grade conversions of one department, indexed by subject code then grade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeConversionTable {
    by_code: HashMap<GradeSubjectCode, BTreeMap<u8, f64>>,
}

impl GradeConversionTable {
    /// Builds the table from every row belonging to `department_id`; other rows are ignored.
    pub fn for_department<'a, I>(department_id: DepartmentId, entries: I) -> Result<Self, GradeTableError>
    where
        I: IntoIterator<Item = &'a GradeConversionEntry>,
    {
        let mut by_code: HashMap<GradeSubjectCode, BTreeMap<u8, f64>> = HashMap::new();

        for entry in entries {
            if entry.department_id != department_id {
                continue;
            }
            let grades = by_code.entry(entry.subject_code.clone()).or_default();
            if grades.insert(entry.grade, entry.converted_score).is_some() {
                return Err(GradeTableError::Duplicate {
                    department_id,
                    subject_code: entry.subject_code.clone(),
                    grade: entry.grade,
                });
            }
        }

        Ok(Self { by_code })
    }

    pub fn lookup(&self, code: &GradeSubjectCode, grade: u8) -> Option<f64> {
        self.by_code
            .get(code)
            .and_then(|grades| grades.get(&grade))
            .copied()
    }

    /// English converted score: the department row, else the default ratio table scaled by `max`.
    /// A missing grade yields no score at all.
    pub fn english_score(&self, grade: Option<u8>, max: f64) -> Option<f64> {
        let grade = grade?;
        if let Some(score) = self.lookup(&GradeSubjectCode::English, grade) {
            return Some(score);
        }
        Some(default_english_ratio(grade) * max)
    }

    /// Korean History bonus: the department row, else the default additive table.
    pub fn history_bonus(&self, grade: Option<u8>) -> f64 {
        let Some(grade) = grade else {
            return 0.0;
        };
        self.lookup(&GradeSubjectCode::KoreanHistory, grade)
            .unwrap_or_else(|| default_history_bonus(grade))
    }
}

/// Fraction of the configured max awarded per English grade when a department has no row.
pub fn default_english_ratio(grade: u8) -> f64 {
    match grade {
        1 => 1.0,
        2 => 0.95,
        3 => 0.9,
        4 => 0.85,
        5 => 0.8,
        6 => 0.75,
        7 => 0.7,
        8 => 0.65,
        9 => 0.6,
        _ => 0.0,
    }
}

/// Korean History bonus per grade when a department has no row.
pub fn default_history_bonus(grade: u8) -> f64 {
    match grade {
        1..=5 => 10.0,
        6 => 8.0,
        7 => 6.0,
        8 => 4.0,
        9 => 2.0,
        _ => 0.0,
    }
}

/// Reads `department_id,subject_code,grade,converted_score` rows, rejecting duplicates.
pub fn entries_from_csv<R: Read>(reader: R) -> Result<Vec<GradeConversionEntry>, GradeTableError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for row in csv_reader.deserialize::<GradeConversionRow>() {
        let row = row?;
        let entry = GradeConversionEntry {
            department_id: DepartmentId(row.department_id),
            subject_code: GradeSubjectCode::from(row.subject_code),
            grade: row.grade,
            converted_score: row.converted_score,
        };
        if !seen.insert((entry.department_id, entry.subject_code.clone(), entry.grade)) {
            return Err(GradeTableError::Duplicate {
                department_id: entry.department_id,
                subject_code: entry.subject_code,
                grade: entry.grade,
            });
        }
        entries.push(entry);
    }

    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct GradeConversionRow {
    department_id: u64,
    subject_code: String,
    grade: u8,
    converted_score: f64,
}
