use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{ProjectStore, StoreError, by_name_then_id};
use crate::model::Project;

/// In-process store. Used by tests and by callers that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RwLock<BTreeMap<String, Project>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing projects. Later duplicates win.
    #[must_use]
    pub fn with_projects(projects: impl IntoIterator<Item = Project>) -> Self {
        let map = projects.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            projects: RwLock::new(map),
        }
    }
}

impl ProjectStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Project, StoreError> {
        let projects = self.projects.read().map_err(|_| StoreError::Poisoned)?;
        projects
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<Project>, StoreError> {
        let projects = self.projects.read().map_err(|_| StoreError::Poisoned)?;
        let mut all: Vec<Project> = projects.values().cloned().collect();
        all.sort_by(by_name_then_id);
        Ok(all)
    }

    fn create(&self, project: &Project) -> Result<(), StoreError> {
        let mut projects = self.projects.write().map_err(|_| StoreError::Poisoned)?;
        if projects.contains_key(&project.id) {
            return Err(StoreError::AlreadyExists(project.id.clone()));
        }
        projects.insert(project.id.clone(), project.clone());
        Ok(())
    }

    fn update(&self, project: &mut Project) -> Result<(), StoreError> {
        let mut projects = self.projects.write().map_err(|_| StoreError::Poisoned)?;
        let slot = projects
            .get_mut(&project.id)
            .ok_or_else(|| StoreError::NotFound(project.id.clone()))?;
        if slot.revision != project.revision {
            return Err(StoreError::Conflict {
                id: project.id.clone(),
                expected: project.revision,
            });
        }
        project.revision += 1;
        *slot = project.clone();
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut projects = self.projects.write().map_err(|_| StoreError::Poisoned)?;
        projects
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
