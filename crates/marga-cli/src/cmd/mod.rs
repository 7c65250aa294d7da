pub mod boq;
pub mod completions;
pub mod curve;
pub mod dashboard;
pub mod init;
pub mod project;
pub mod report;
pub mod status;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use marga_core::Tracker;
use marga_core::config::{MARGA_DIR, ProjectConfig};
use marga_core::error::ErrorCode;
use marga_core::schedule::SystemClock;
use marga_core::store::SqliteStore;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::output::CliError;

/// Tracker type every data command works through.
pub type WorkspaceTracker = Tracker<SqliteStore, SystemClock>;

/// An initialized marga workspace: its root and loaded config.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Workspace {
    /// Open the SQLite store named by the config and wrap it in a tracker.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or migrated.
    pub fn tracker(&self) -> Result<WorkspaceTracker> {
        let path = self.config.store.resolve(&self.root);
        debug!(path = %path.display(), "opening project store");
        let store = SqliteStore::open(&path)
            .with_context(|| format!("Failed to open project store: {}", path.display()))?;
        Ok(Tracker::new(store, SystemClock).with_config(&self.config))
    }
}

/// Walk up from `start` to the nearest directory holding `.marga/`.
///
/// # Errors
///
/// Returns a [`CliError`] with [`ErrorCode::NotInitialized`] when no
/// ancestor is a workspace.
pub fn find_workspace_root(start: &Path) -> Result<PathBuf, CliError> {
    start
        .ancestors()
        .find(|dir| dir.join(MARGA_DIR).is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            CliError::from_code(
                ErrorCode::NotInitialized,
                format!("no {MARGA_DIR}/ found in {} or any parent", start.display()),
            )
        })
}

/// Parse a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns a message naming the expected format.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{raw}': expected YYYY-MM-DD"))
}
