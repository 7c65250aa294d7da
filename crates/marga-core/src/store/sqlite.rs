//! SQLite-backed project store.
//!
//! Runtime pragmas:
//! - `journal_mode = WAL` so readers do not block the writer
//! - `busy_timeout = 5s` to ride out short lock contention
//! - `synchronous = NORMAL`

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use super::{ProjectStore, StoreError, migrations};
use crate::model::Project;

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Project store in a single SQLite file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, apply pragmas, and migrate
    /// the schema to the latest version.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or opening,
    /// configuring, or migrating the database fails.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        debug!(path = %path.display(), "opened project store");
        Ok(store)
    }

    /// In-memory database with the full schema, for tests and scratch use.
    ///
    /// # Errors
    ///
    /// Returns an error if migrating the schema fails.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StoreError> {
        configure_connection(&conn)?;
        migrations::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// The `revision` column is authoritative over the copy inside the JSON.
fn decode(id: &str, json: &str, revision: u32) -> Result<Project, StoreError> {
    let mut project: Project = serde_json::from_str(json).map_err(|source| StoreError::Corrupt {
        id: id.to_string(),
        source,
    })?;
    project.revision = revision;
    Ok(project)
}

impl ProjectStore for SqliteStore {
    fn get(&self, id: &str) -> Result<Project, StoreError> {
        let conn = self.lock()?;
        let row: Option<(String, u32)> = conn
            .query_row(
                "SELECT record_json, revision FROM projects WHERE project_id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (json, revision) = row.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        decode(id, &json, revision)
    }

    fn list(&self) -> Result<Vec<Project>, StoreError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT project_id, record_json, revision FROM projects ORDER BY name, project_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, u32>(2)?))
        })?;

        let mut projects = Vec::new();
        for row in rows {
            let (id, json, revision) = row?;
            projects.push(decode(&id, &json, revision)?);
        }
        Ok(projects)
    }

    fn create(&self, project: &Project) -> Result<(), StoreError> {
        let json = serde_json::to_string(project)?;
        let now_us = Utc::now().timestamp_micros();
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO projects (project_id, name, record_json, created_at_us, updated_at_us, revision)
             VALUES (?1, ?2, ?3, ?4, ?4, ?5)",
            params![project.id, project.name, json, now_us, project.revision],
        )?;
        if inserted == 0 {
            return Err(StoreError::AlreadyExists(project.id.clone()));
        }
        debug!(project_id = %project.id, "project record created");
        Ok(())
    }

    fn update(&self, project: &mut Project) -> Result<(), StoreError> {
        let expected = project.revision;
        let mut next = project.clone();
        next.revision = expected + 1;
        let json = serde_json::to_string(&next)?;
        let now_us = Utc::now().timestamp_micros();
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE projects SET name = ?2, record_json = ?3, updated_at_us = ?4, revision = ?5
             WHERE project_id = ?1 AND revision = ?6",
            params![next.id, next.name, json, now_us, next.revision, expected],
        )?;
        if updated == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE project_id = ?1)",
                [&project.id],
                |row| row.get(0),
            )?;
            return Err(if exists {
                StoreError::Conflict {
                    id: project.id.clone(),
                    expected,
                }
            } else {
                StoreError::NotFound(project.id.clone())
            });
        }
        project.revision = next.revision;
        debug!(project_id = %project.id, revision = project.revision, "project record updated");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM projects WHERE project_id = ?1", [id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(project_id = %id, "project record deleted");
        Ok(())
    }
}
