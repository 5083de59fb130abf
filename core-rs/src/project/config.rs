/**
 * config.rs
 * Parser for the engine configuration file (YAML format)
 *
 * Format:
 * ```yaml
 * apiVersion: onto-cache/v1
 * kind: EngineConfig
 * metadata:
 *   name: local
 * spec:
 *   sharedOntologiesProject: http://www.knora.org/ontology/knora-admin#DefaultSharedOntologiesProject
 *   reusableVocabularies:
 *     - http://xmlns.com/foaf/0.1/
 *   projects:
 *     - iri: http://rdfh.ch/projects/0001
 *       shortcode: "0001"
 *       shortname: anything
 *   store:
 *     path: ./data/store
 * ```
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{OntoError, Result};
use crate::iri::vocabulary::{foaf, DEFAULT_SHARED_ONTOLOGIES_PROJECT, SHARED_ONTOLOGIES_SHORTCODE};

pub const API_VERSION: &str = "onto-cache/v1";
pub const KIND: &str = "EngineConfig";

/// Engine configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: Spec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub name: String,
}

/// A project known to the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectEntry {
    pub iri: String,
    pub shortcode: String,
    pub shortname: String,
}

/// Persistent triplestore location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    /// The only project allowed to own shared ontologies
    pub shared_ontologies_project: String,
    /// Namespaces whose entities any project may reuse
    #[serde(default)]
    pub reusable_vocabularies: Vec<String>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    /// In-memory store when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,
}

impl EngineConfig {
    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(OntoError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate structure
    ///
    /// Ensures:
    /// - apiVersion is "onto-cache/v1"
    /// - kind is "EngineConfig"
    /// - every project has an IRI, a 4-digit hex shortcode and a shortname
    /// - no two projects share an IRI or a shortcode
    pub fn validate(&self) -> Result<()> {
        if self.api_version != API_VERSION {
            return Err(OntoError::Config(format!(
                "Invalid apiVersion: expected '{}', got '{}'",
                API_VERSION, self.api_version
            )));
        }

        if self.kind != KIND {
            return Err(OntoError::Config(format!(
                "Invalid kind: expected '{}', got '{}'",
                KIND, self.kind
            )));
        }

        if self.metadata.name.is_empty() {
            return Err(OntoError::Config("metadata.name cannot be empty".to_string()));
        }

        if self.spec.shared_ontologies_project.is_empty() {
            return Err(OntoError::Config(
                "spec.sharedOntologiesProject cannot be empty".to_string(),
            ));
        }

        let mut seen_iris = std::collections::HashSet::new();
        let mut seen_codes = std::collections::HashSet::new();
        for project in &self.spec.projects {
            if project.iri.is_empty() || project.shortname.is_empty() {
                return Err(OntoError::Config(format!(
                    "Project entry '{}' needs an iri and a shortname",
                    project.shortcode
                )));
            }
            let valid_code = project.shortcode.len() == 4
                && project.shortcode.chars().all(|c| c.is_ascii_hexdigit());
            if !valid_code {
                return Err(OntoError::Config(format!(
                    "Invalid shortcode for project {}: '{}'",
                    project.iri, project.shortcode
                )));
            }
            if !seen_iris.insert(project.iri.as_str()) {
                return Err(OntoError::Config(format!("Duplicate project: {}", project.iri)));
            }
            if !seen_codes.insert(project.shortcode.to_uppercase()) {
                return Err(OntoError::Config(format!(
                    "Duplicate shortcode: {}",
                    project.shortcode
                )));
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), yaml)?;
        Ok(())
    }

    /// Create a configuration with the standard shared-ontologies project
    /// and FOAF as reusable vocabulary
    pub fn new(name: String) -> Self {
        EngineConfig {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: Metadata { name },
            spec: Spec {
                shared_ontologies_project: DEFAULT_SHARED_ONTOLOGIES_PROJECT.to_string(),
                reusable_vocabularies: vec![foaf::NAMESPACE.to_string()],
                projects: vec![ProjectEntry {
                    iri: DEFAULT_SHARED_ONTOLOGIES_PROJECT.to_string(),
                    shortcode: SHARED_ONTOLOGIES_SHORTCODE.to_string(),
                    shortname: "DefaultSharedOntologiesProject".to_string(),
                }],
                store: None,
            },
        }
    }

    pub fn with_project(mut self, iri: &str, shortcode: &str, shortname: &str) -> Self {
        self.spec.projects.push(ProjectEntry {
            iri: iri.to_string(),
            shortcode: shortcode.to_string(),
            shortname: shortname.to_string(),
        });
        self
    }

    /// True if `iri` lies in a whitelisted reusable vocabulary
    pub fn is_reusable(&self, iri: &str) -> bool {
        self.spec
            .reusable_vocabularies
            .iter()
            .any(|namespace| iri.starts_with(namespace.as_str()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("default".to_string())
    }
}
