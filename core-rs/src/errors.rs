//! Error types for the ontology cache

use std::fmt;

use thiserror::Error;

/// Structural rule violated by a rejected mutation.
///
/// Carried by [`OntoError::BadRequest`] so callers (and tests) can tell
/// which invariant a request broke without parsing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationRule {
    /// Malformed request payload or IRI
    Syntax,
    /// Ontology short name rules
    Naming,
    /// Entity IRI already in use (any kind)
    Uniqueness,
    /// Shared-ontology and cross-project boundaries
    SharingBoundary,
    /// Language-tagged rdfs:label / rdfs:comment required
    RequiredMetadata,
    /// rdf:type of a class or property payload
    RdfType,
    /// Value/link base-property exclusivity
    PropertyTaxonomy,
    /// subject/object type constraints
    TypeConstraint,
    /// Narrowing of superproperty constraints, cardinality subject checks
    Compatibility,
    /// Cardinality overrides, boolean cardinalities, existing data
    CardinalityLegality,
    /// Entity or ontology still referenced
    DeletionGuard,
    /// Removing a cardinality
    CardinalityRemoval,
    /// Built-in ontologies are read-only
    BuiltInOntology,
}

impl ValidationRule {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Naming => "naming",
            Self::Uniqueness => "uniqueness",
            Self::SharingBoundary => "sharing-boundary",
            Self::RequiredMetadata => "required-metadata",
            Self::RdfType => "rdf-type",
            Self::PropertyTaxonomy => "property-taxonomy",
            Self::TypeConstraint => "type-constraint",
            Self::Compatibility => "compatibility",
            Self::CardinalityLegality => "cardinality-legality",
            Self::DeletionGuard => "deletion-guard",
            Self::CardinalityRemoval => "cardinality-removal",
            Self::BuiltInOntology => "built-in-ontology",
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum OntoError {
    #[error("Bad request [{rule}]: {message}")]
    BadRequest { rule: ValidationRule, message: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Edit conflict: {0}")]
    EditConflict(String),

    #[error("Cache inconsistency: {0}")]
    Inconsistency(String),

    #[error("Triplestore error: {0}")]
    Triplestore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OntoError {
    pub fn bad_request(rule: ValidationRule, message: impl Into<String>) -> Self {
        OntoError::BadRequest {
            rule,
            message: message.into(),
        }
    }

    /// Rule named by a `BadRequest`, if this is one
    pub fn rule(&self) -> Option<ValidationRule> {
        match self {
            OntoError::BadRequest { rule, .. } => Some(*rule),
            _ => None,
        }
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, OntoError::BadRequest { .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, OntoError::Forbidden(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OntoError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, OntoError::EditConflict(_))
    }
}

impl From<oxigraph::store::StorageError> for OntoError {
    fn from(err: oxigraph::store::StorageError) -> Self {
        OntoError::Triplestore(err.to_string())
    }
}

impl From<oxigraph::sparql::EvaluationError> for OntoError {
    fn from(err: oxigraph::sparql::EvaluationError) -> Self {
        OntoError::Triplestore(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OntoError>;
