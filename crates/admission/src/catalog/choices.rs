use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::DepartmentProfile;
use crate::repository::{ChoiceRepository, DepartmentCatalog, RepositoryError};
use crate::scoring::{DepartmentId, UserId};

/// Maximum number of departments a user may choose.
pub const MAX_CHOICES: usize = 3;

/// Chosen department as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
    pub department_id: DepartmentId,
    pub school_name: String,
    pub department_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl From<&DepartmentProfile> for ChoiceView {
    fn from(profile: &DepartmentProfile) -> Self {
        Self {
            department_id: profile.id,
            school_name: profile.school_name.clone(),
            department_name: profile.name.clone(),
            division: profile.division.clone(),
            region: profile.region.clone(),
        }
    }
}

/// Maintains each user's chosen department list.
pub struct ChoiceService<D, H> {
    catalog: Arc<D>,
    choices: Arc<H>,
}

impl<D, H> ChoiceService<D, H>
where
    D: DepartmentCatalog + 'static,
    H: ChoiceRepository + 'static,
{
    pub fn new(catalog: Arc<D>, choices: Arc<H>) -> Self {
        Self { catalog, choices }
    }

    pub fn list(&self, user_id: UserId) -> Result<Vec<ChoiceView>, ChoiceError> {
        let mut views = Vec::new();
        for department_id in self.choices.choices(user_id)? {
            match self.catalog.department(department_id)? {
                Some(profile) => views.push(ChoiceView::from(&profile)),
                None => warn!(%user_id, %department_id, "chosen department missing from catalog"),
            }
        }
        Ok(views)
    }

    pub fn add(
        &self,
        user_id: UserId,
        department_id: DepartmentId,
    ) -> Result<Vec<ChoiceView>, ChoiceError> {
        if self.catalog.department(department_id)?.is_none() {
            return Err(ChoiceError::UnknownDepartment(department_id));
        }

        match self.choices.add(user_id, department_id, MAX_CHOICES) {
            Ok(()) => {}
            Err(RepositoryError::Conflict) => {
                return Err(ChoiceError::AlreadyChosen(department_id));
            }
            Err(RepositoryError::LimitReached { limit }) => {
                return Err(ChoiceError::LimitReached { limit });
            }
            Err(other) => return Err(other.into()),
        }
        info!(%user_id, %department_id, "department chosen");

        self.list(user_id)
    }

    pub fn remove(&self, user_id: UserId, department_id: DepartmentId) -> Result<(), ChoiceError> {
        if self.choices.remove(user_id, department_id)? {
            info!(%user_id, %department_id, "department choice removed");
            Ok(())
        } else {
            Err(ChoiceError::NotChosen(department_id))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChoiceError {
    #[error("department {0} does not exist")]
    UnknownDepartment(DepartmentId),
    #[error("department {0} is already chosen")]
    AlreadyChosen(DepartmentId),
    #[error("at most {limit} departments can be chosen")]
    LimitReached { limit: usize },
    #[error("department {0} is not among the chosen departments")]
    NotChosen(DepartmentId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
