use admission::catalog::{CatalogSnapshot, DepartmentProfile};
use admission::error::AppError;
use admission::intake::ExamScoreRecord;
use admission::repository::{
    ChoiceRepository, DepartmentCatalog, ExamScoreRepository, RepositoryError,
};
use admission::scoring::{
    DepartmentId, ExamMode, MaxScoreRow, RawScores, SubjectDirectory, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryExamScoreRepository {
    records: Arc<Mutex<HashMap<(UserId, ExamMode), ExamScoreRecord>>>,
}

impl ExamScoreRepository for InMemoryExamScoreRepository {
    fn fetch(
        &self,
        user_id: UserId,
        mode: ExamMode,
    ) -> Result<Option<ExamScoreRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(&(user_id, mode)).cloned())
    }

    fn upsert(&self, record: ExamScoreRecord) -> Result<ExamScoreRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        guard.insert((record.user_id, record.mode), record.clone());
        Ok(record)
    }
}

/// Catalog served from a loaded snapshot, with the mutable choice lists kept alongside.
pub(crate) struct InMemoryCatalog {
    directory: SubjectDirectory,
    departments: Vec<DepartmentProfile>,
    max_scores: Vec<MaxScoreRow>,
    choices: Mutex<HashMap<UserId, Vec<DepartmentId>>>,
}

impl InMemoryCatalog {
    pub(crate) fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let directory = snapshot.directory();
        let choices = snapshot
            .choices
            .into_iter()
            .map(|seed| (seed.user_id, seed.department_ids))
            .collect();

        Self {
            directory,
            departments: snapshot.departments,
            max_scores: snapshot.max_scores,
            choices: Mutex::new(choices),
        }
    }

    pub(crate) fn departments(&self) -> &[DepartmentProfile] {
        &self.departments
    }

    fn find(&self, id: DepartmentId) -> Option<&DepartmentProfile> {
        self.departments.iter().find(|department| department.id == id)
    }
}

impl DepartmentCatalog for InMemoryCatalog {
    fn subjects(&self) -> Result<SubjectDirectory, RepositoryError> {
        Ok(self.directory.clone())
    }

    fn department(&self, id: DepartmentId) -> Result<Option<DepartmentProfile>, RepositoryError> {
        Ok(self.find(id).cloned())
    }

    fn chosen_departments(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DepartmentProfile>, RepositoryError> {
        let ids = self.choices(user_id)?;
        Ok(ids
            .into_iter()
            .filter_map(|id| self.find(id).cloned())
            .collect())
    }

    fn max_scores(&self, year: i32) -> Result<Vec<MaxScoreRow>, RepositoryError> {
        Ok(self
            .max_scores
            .iter()
            .filter(|row| row.year == year)
            .cloned()
            .collect())
    }
}

impl ChoiceRepository for InMemoryCatalog {
    fn choices(&self, user_id: UserId) -> Result<Vec<DepartmentId>, RepositoryError> {
        let guard = lock(&self.choices)?;
        Ok(guard.get(&user_id).cloned().unwrap_or_default())
    }

    fn add(
        &self,
        user_id: UserId,
        department_id: DepartmentId,
        limit: usize,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.choices)?;
        let chosen = guard.entry(user_id).or_default();
        if chosen.contains(&department_id) {
            return Err(RepositoryError::Conflict);
        }
        if chosen.len() >= limit {
            return Err(RepositoryError::LimitReached { limit });
        }
        chosen.push(department_id);
        Ok(())
    }

    fn remove(
        &self,
        user_id: UserId,
        department_id: DepartmentId,
    ) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.choices)?;
        let Some(chosen) = guard.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = chosen.len();
        chosen.retain(|id| *id != department_id);
        Ok(chosen.len() != before)
    }
}

/// Reads the catalog from `catalog_path`, or the bundled demo catalog, then attaches the
/// optional grade conversion CSV.
pub(crate) fn load_catalog(
    catalog_path: Option<&Path>,
    grade_table_path: Option<&Path>,
) -> Result<CatalogSnapshot, AppError> {
    let mut snapshot = match catalog_path {
        Some(path) => {
            let snapshot = CatalogSnapshot::from_path(path)?;
            info!(path = %path.display(), departments = snapshot.departments.len(), "catalog loaded");
            snapshot
        }
        None => {
            info!("no catalog configured, serving the demo catalog");
            crate::demo::demo_catalog()?
        }
    };

    if let Some(path) = grade_table_path {
        let rows = snapshot.attach_grade_csv_path(path)?;
        info!(path = %path.display(), rows, "grade conversion rows attached");
    }

    Ok(snapshot)
}

/// Reads a score sheet file: either the bare `{subjectId: payload}` object or a saved
/// record carrying it under `scores`.
pub(crate) fn read_score_sheet(path: &Path) -> Result<RawScores, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|err| AppError::Input(format!("{}: {err}", path.display())))?;
    let scores = match value.get("scores") {
        Some(nested) => nested.clone(),
        None => value,
    };
    match scores {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(AppError::Input(format!(
            "{}: scores must be an object keyed by subject id",
            path.display()
        ))),
    }
}
