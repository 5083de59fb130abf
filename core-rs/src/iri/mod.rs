//! IRI handling
//!
//! - [`SmartIri`]: schema-normalized IRIs
//! - [`vocabulary`]: RDF, OWL, XSD and Knora constants
//! - [`validate_ontology_name`]: naming rules for new ontologies

pub mod naming;
pub mod smart_iri;
pub mod vocabulary;

pub use naming::{validate_entity_name, validate_ontology_name, RESERVED_ONTOLOGY_NAMES};
pub use smart_iri::{ApiSchema, SmartIri};
