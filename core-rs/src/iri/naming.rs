//! Ontology and entity name rules

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{OntoError, Result, ValidationRule};

static ONTOLOGY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_-]*$").expect("static regex"));

static VERSION_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v[0-9]+$").expect("static regex"));

static ENTITY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_.-]*$").expect("static regex"));

/// Names that collide with vocabularies or IRI path segments
pub const RESERVED_ONTOLOGY_NAMES: &[&str] = &[
    "rdf",
    "rdfs",
    "owl",
    "xsd",
    "xml",
    "knora",
    "ontology",
    "simple",
    "shared",
    "salsah-gui",
    "standoff",
    "knora-base",
    "knora-admin",
    "knora-api",
];

/// Validate the short name of a new ontology
///
/// # Examples
///
/// ```
/// use onto_cache::iri::validate_ontology_name;
///
/// assert!(validate_ontology_name("anything").is_ok());
/// assert!(validate_ontology_name("rdfs").is_err());
/// assert!(validate_ontology_name("-foo").is_err());
/// ```
pub fn validate_ontology_name(name: &str) -> Result<()> {
    if !ONTOLOGY_NAME.is_match(name) {
        return Err(OntoError::bad_request(
            ValidationRule::Naming,
            format!(
                "Invalid ontology name '{}': must start with a letter or underscore and contain only letters, digits, '_' and '-'",
                name
            ),
        ));
    }

    let lower = name.to_lowercase();
    if RESERVED_ONTOLOGY_NAMES.contains(&lower.as_str()) {
        return Err(OntoError::bad_request(
            ValidationRule::Naming,
            format!("Ontology name '{}' is reserved", name),
        ));
    }

    if VERSION_SEGMENT.is_match(&lower) {
        return Err(OntoError::bad_request(
            ValidationRule::Naming,
            format!("Ontology name '{}' looks like an API version segment", name),
        ));
    }

    if lower.contains("knora") {
        return Err(OntoError::bad_request(
            ValidationRule::Naming,
            format!("Ontology name '{}' may not contain 'knora'", name),
        ));
    }

    Ok(())
}

/// Validate the local name of a class or property
pub fn validate_entity_name(name: &str) -> Result<()> {
    if ENTITY_NAME.is_match(name) {
        Ok(())
    } else {
        Err(OntoError::bad_request(
            ValidationRule::Syntax,
            format!("Invalid entity name '{}'", name),
        ))
    }
}
