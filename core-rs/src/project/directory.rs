/**
 * directory.rs
 * Resolves project IRIs to shortcodes
 *
 * Ontology IRIs embed the owning project's shortcode, so creating an
 * ontology needs a lookup from the project IRI in the request. Projects are
 * seeded from the engine configuration and can be registered at runtime.
 */

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{OntoError, Result};
use crate::iri::SmartIri;
use crate::project::config::EngineConfig;

/// A project as seen by the ontology engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub iri: SmartIri,
    /// Upper-case 4-digit hex code
    pub shortcode: String,
    pub shortname: String,
}

impl ProjectInfo {
    pub fn new(iri: SmartIri, shortcode: &str, shortname: &str) -> Self {
        Self {
            iri,
            shortcode: shortcode.to_uppercase(),
            shortname: shortname.to_string(),
        }
    }
}

#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// `None` if the project does not exist
    async fn get_project(&self, iri: &SmartIri) -> Result<Option<ProjectInfo>>;
}

#[derive(Debug, Default)]
pub struct InMemoryProjectDirectory {
    projects: RwLock<HashMap<SmartIri, ProjectInfo>>,
}

impl InMemoryProjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory seeded with the projects listed in `config`
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let directory = Self::new();
        for entry in &config.spec.projects {
            let iri = SmartIri::parse(&entry.iri)
                .map_err(|e| OntoError::Config(format!("Project {}: {}", entry.iri, e)))?;
            directory.register(ProjectInfo::new(iri, &entry.shortcode, &entry.shortname))?;
        }
        Ok(directory)
    }

    pub fn register(&self, project: ProjectInfo) -> Result<()> {
        let mut projects = self
            .projects
            .write()
            .map_err(|_| OntoError::Inconsistency("Project directory lock poisoned".to_string()))?;

        if projects
            .values()
            .any(|p| p.shortcode == project.shortcode && p.iri != project.iri)
        {
            return Err(OntoError::Config(format!(
                "Shortcode {} already registered",
                project.shortcode
            )));
        }

        debug!(project = %project.iri, shortcode = %project.shortcode, "Registered project");
        projects.insert(project.iri.clone(), project);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.projects.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryProjectDirectory {
    async fn get_project(&self, iri: &SmartIri) -> Result<Option<ProjectInfo>> {
        let projects = self
            .projects
            .read()
            .map_err(|_| OntoError::Inconsistency("Project directory lock poisoned".to_string()))?;
        Ok(projects.get(iri).cloned())
    }
}
