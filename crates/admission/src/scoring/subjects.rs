use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::{SubjectId, SubjectKind};

/// Catalog subject row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Stable kind tag. Rows without one fall back to their display name at load time.
    #[serde(default)]
    pub kind: Option<SubjectKind>,
}

/// Subject id to kind lookup, resolved once when the catalog is read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectDirectory {
    kinds: HashMap<SubjectId, SubjectKind>,
}

impl SubjectDirectory {
    pub fn from_subjects<'a, I>(subjects: I) -> Self
    where
        I: IntoIterator<Item = &'a Subject>,
    {
        let mut kinds = HashMap::new();
        for subject in subjects {
            match subject
                .kind
                .or_else(|| SubjectKind::from_display_name(&subject.name))
            {
                Some(kind) => {
                    kinds.insert(subject.id, kind);
                }
                None => {
                    tracing::debug!(subject_id = %subject.id, name = %subject.name, "subject has no scoring kind");
                }
            }
        }
        Self { kinds }
    }

    pub fn with_kind(mut self, id: SubjectId, kind: SubjectKind) -> Self {
        self.kinds.insert(id, kind);
        self
    }

    pub fn kind_of(&self, id: SubjectId) -> Option<SubjectKind> {
        self.kinds.get(&id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
