//! Project persistence.
//!
//! The engine treats a project as one opaque record: stores only load and
//! save whole [`Project`] values by id. Nothing here knows about progress or
//! schedules.

pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::ErrorCode;
use crate::model::Project;

/// Errors raised by a [`ProjectStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("project not found: {0}")]
    NotFound(String),

    #[error("project already exists: {0}")]
    AlreadyExists(String),

    #[error("project {id} changed since revision {expected} was read")]
    Conflict { id: String, expected: u32 },

    #[error("corrupt project record {id}: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode project record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare store location: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Machine-readable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::ProjectNotFound,
            Self::AlreadyExists(_) => ErrorCode::ProjectExists,
            Self::Conflict { .. } => ErrorCode::ProjectChanged,
            Self::Corrupt { .. } => ErrorCode::CorruptRecord,
            Self::Encode(_) | Self::Sqlite(_) | Self::Io(_) => ErrorCode::StoreWriteFailed,
            Self::Poisoned => ErrorCode::InternalUnexpected,
        }
    }
}

/// CRUD over whole project records, keyed by [`Project::id`].
pub trait ProjectStore: Send + Sync {
    /// Load one project.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no project has `id`, or a backend failure.
    fn get(&self, id: &str) -> Result<Project, StoreError>;

    /// Every project, ordered by name then id.
    ///
    /// # Errors
    ///
    /// Returns a backend failure, or [`StoreError::Corrupt`] for an
    /// unreadable record.
    fn list(&self) -> Result<Vec<Project>, StoreError>;

    /// Insert a new project.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyExists`] if the id is taken.
    fn create(&self, project: &Project) -> Result<(), StoreError>;

    /// Replace an existing project, provided its stored revision still
    /// equals `project.revision`. On success `project.revision` is bumped to
    /// the newly stored value.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no project has this id,
    /// [`StoreError::Conflict`] if another writer got there first.
    fn update(&self, project: &mut Project) -> Result<(), StoreError>;

    /// Remove a project.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no project has `id`.
    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

pub(crate) fn by_name_then_id(a: &Project, b: &Project) -> std::cmp::Ordering {
    a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_codes() {
        assert_eq!(
            StoreError::NotFound("prj-x".into()).code(),
            ErrorCode::ProjectNotFound
        );
        assert_eq!(
            StoreError::AlreadyExists("prj-x".into()).code(),
            ErrorCode::ProjectExists
        );
        assert_eq!(StoreError::Poisoned.code(), ErrorCode::InternalUnexpected);
        assert_eq!(
            StoreError::Conflict {
                id: "prj-x".into(),
                expected: 3
            }
            .code(),
            ErrorCode::ProjectChanged
        );
    }

    #[test]
    fn not_found_message_names_project() {
        let err = StoreError::NotFound("prj-abc".into());
        assert_eq!(err.to_string(), "project not found: prj-abc");
    }
}
