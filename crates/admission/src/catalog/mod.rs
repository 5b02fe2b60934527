//! Department catalog: department profiles, the JSON snapshot the service is seeded from,
//! and the chosen-department list.

pub mod choices;
pub mod router;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::scoring::{
    entries_from_csv, DepartmentId, DepartmentScoringPolicy, GradeConversionEntry,
    GradeConversionTable, GradeTableError, MaxScoreRow, ScoringPolicy, Subject,
    SubjectDirectory, UserId,
};

pub use choices::{ChoiceError, ChoiceService, ChoiceView, MAX_CHOICES};
pub use router::choice_router;

/// A school department together with everything needed to score it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentProfile {
    pub id: DepartmentId,
    pub school_name: String,
    pub name: String,
    /// Admission group (가/나/다).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub policy: DepartmentScoringPolicy,
    #[serde(default)]
    pub grade_conversions: Vec<GradeConversionEntry>,
}

impl DepartmentProfile {
    pub fn grade_table(&self) -> Result<GradeConversionTable, GradeTableError> {
        GradeConversionTable::for_department(self.id, &self.grade_conversions)
    }
}

/// Departments a user starts with when the catalog is seeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSeed {
    pub user_id: UserId,
    pub department_ids: Vec<DepartmentId>,
}

/// Whole catalog as stored on disk.
///
/// Grade conversion rows may be listed per department or at the top level; top-level rows are
/// moved onto their department when the snapshot is prepared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub departments: Vec<DepartmentProfile>,
    #[serde(default)]
    pub grade_conversions: Vec<GradeConversionEntry>,
    #[serde(default)]
    pub max_scores: Vec<MaxScoreRow>,
    #[serde(default)]
    pub choices: Vec<ChoiceSeed>,
}

impl CatalogSnapshot {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let snapshot: Self = serde_json::from_reader(reader)?;
        snapshot.prepare()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Adds grade conversion rows read from CSV.
    pub fn attach_grade_csv<R: Read>(&mut self, reader: R) -> Result<usize, CatalogError> {
        let entries = entries_from_csv(reader)?;
        let count = entries.len();
        self.grade_conversions.extend(entries);
        self.distribute_grade_conversions()?;
        Ok(count)
    }

    pub fn attach_grade_csv_path(&mut self, path: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.attach_grade_csv(BufReader::new(file))
    }

    pub fn directory(&self) -> SubjectDirectory {
        SubjectDirectory::from_subjects(&self.subjects)
    }

    fn prepare(mut self) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for department in &self.departments {
            if !seen.insert(department.id) {
                return Err(CatalogError::DuplicateDepartment(department.id));
            }
        }
        for seed in &self.choices {
            if seed.department_ids.len() > MAX_CHOICES {
                return Err(CatalogError::OversizedChoiceSeed {
                    user_id: seed.user_id,
                    count: seed.department_ids.len(),
                });
            }
        }

        self.resolve_rule_subjects();
        self.distribute_grade_conversions()?;
        Ok(self)
    }

    /// Rule slots are keyed by subject id; the catalog's subject kind wins over the declared one.
    fn resolve_rule_subjects(&mut self) {
        let directory = self.directory();
        for department in &mut self.departments {
            let ScoringPolicy::Rule(rule_policy) = &mut department.policy.scoring else {
                continue;
            };
            for slot in &mut rule_policy.subjects {
                match directory.kind_of(slot.subject_id) {
                    Some(kind) if kind != slot.subject => {
                        warn!(
                            department_id = %department.id,
                            subject_id = %slot.subject_id,
                            declared = slot.subject.label(),
                            resolved = kind.label(),
                            "rule slot kind differs from the subject catalog"
                        );
                        slot.subject = kind;
                    }
                    Some(_) => {}
                    None => debug!(subject_id = %slot.subject_id, "rule slot subject not in catalog"),
                }
            }
        }
    }

    fn distribute_grade_conversions(&mut self) -> Result<(), CatalogError> {
        for entry in std::mem::take(&mut self.grade_conversions) {
            match self
                .departments
                .iter_mut()
                .find(|department| department.id == entry.department_id)
            {
                Some(department) => department.grade_conversions.push(entry),
                None => warn!(
                    department_id = %entry.department_id,
                    "grade conversion row for unknown department dropped"
                ),
            }
        }

        for department in &self.departments {
            department.grade_table()?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Grades(#[from] GradeTableError),
    #[error("department {0} is defined twice")]
    DuplicateDepartment(DepartmentId),
    #[error("user {user_id} is seeded with {count} choices, at most {} are allowed", MAX_CHOICES)]
    OversizedChoiceSeed { user_id: UserId, count: usize },
}
