//! Seed snapshot consumed once when a repository is constructed.
//!
//! # Responsibility
//! - Decode the initial activity list from JSON text or a file.
//! - Reject snapshots that would break id uniqueness.
//!
//! # Invariants
//! - A `SeedSnapshot` never holds two activities with the same id.
//! - The snapshot is immutable once built; repositories copy it.

use crate::model::activity::{Activity, ActivityId};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Error raised while building a seed snapshot.
#[derive(Debug)]
pub enum SeedError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    DuplicateId(ActivityId),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read seed file `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "invalid seed json: {err}"),
            Self::DuplicateId(id) => write!(f, "duplicate activity id {id} in seed snapshot"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::DuplicateId(_) => None,
        }
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Immutable initial dataset for one repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedSnapshot {
    activities: Vec<Activity>,
}

impl SeedSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot from in-memory records.
    ///
    /// # Errors
    /// - `SeedError::DuplicateId` when two records share an id.
    pub fn from_activities(activities: Vec<Activity>) -> Result<Self, SeedError> {
        let mut seen = HashSet::with_capacity(activities.len());
        for activity in &activities {
            if !seen.insert(activity.id) {
                return Err(SeedError::DuplicateId(activity.id));
            }
        }
        Ok(Self { activities })
    }

    /// Decodes a JSON array of activities.
    pub fn from_json_str(raw: &str) -> Result<Self, SeedError> {
        let activities: Vec<Activity> = serde_json::from_str(raw)?;
        Self::from_activities(activities)
    }

    /// Reads and decodes a JSON seed file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{SeedError, SeedSnapshot};

    #[test]
    fn decodes_mixed_date_shapes_and_keeps_unknown_fields() {
        let seed = SeedSnapshot::from_json_str(
            r#"[
                {"Id": 1, "type": "call", "date": "2024-01-01", "contactId": 3, "outcome": "busy"},
                {"Id": 2, "type": "email", "date": "2024-01-02T09:30:00Z", "dealId": null}
            ]"#,
        )
        .unwrap();

        assert_eq!(seed.len(), 2);
        let first = &seed.activities()[0];
        assert_eq!(first.contact_id.map(|id| id.get()), Some(3));
        assert_eq!(first.extra["outcome"], "busy");
        assert!(seed.activities()[1].deal_id.is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = SeedSnapshot::from_json_str(
            r#"[
                {"Id": 7, "type": "note", "date": "2024-01-01"},
                {"Id": 7, "type": "call", "date": "2024-01-02"}
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SeedError::DuplicateId(id) if id.get() == 7));
    }

    #[test]
    fn rejects_zero_id_and_unknown_type() {
        assert!(matches!(
            SeedSnapshot::from_json_str(r#"[{"Id": 0, "type": "note", "date": "2024-01-01"}]"#),
            Err(SeedError::Json(_))
        ));
        assert!(matches!(
            SeedSnapshot::from_json_str(r#"[{"Id": 1, "type": "fax", "date": "2024-01-01"}]"#),
            Err(SeedError::Json(_))
        ));
    }
}
