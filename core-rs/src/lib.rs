//! # onto-cache - Ontology Cache and Consistency Engine
//!
//! An in-memory, versioned model of a multi-tenant RDF ontology graph in
//! the Knora style. Projects own ontologies; ontologies hold classes and
//! properties; classes restrict properties through cardinalities.
//!
//! ## Core Principle
//!
//! **Readers never see a half-applied change**: every mutation is checked
//! against a candidate snapshot, written to the triplestore, and only then
//! published by swapping one pointer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │          OntologyResponder               │
//! │  payload → authorize → rules → commit    │
//! └──────────────────────────────────────────┘
//!        │ candidate            │ publish
//!        ▼                      ▼
//! ┌──────────────┐      ┌──────────────────┐
//! │ validation   │      │  OntologyCache   │──► TriplestoreService
//! │ rules/guards │      │ (Arc snapshot)   │    (oxigraph)
//! └──────────────┘      └──────────────────┘
//! ```

pub mod cache;
pub mod entity;
pub mod errors;
pub mod iri;
pub mod project;
pub mod rbac;
pub mod responder;
pub mod triplestore;
pub mod validation;

pub use cache::{OntologyCache, OntologyCacheData};
pub use entity::{
    Cardinality, CardinalityInfo, ClassDefinition, ClassInfo, Literal, Ontology, OntologyMetadata,
    Predicates, PropertyDefinition, PropertyInfo, PropertyKind,
};
pub use errors::{OntoError, Result, ValidationRule};
pub use iri::{ApiSchema, SmartIri};
pub use project::{EngineConfig, InMemoryProjectDirectory, ProjectDirectory, ProjectInfo};
pub use rbac::{Authorizer, PermissionChecker, UserProfile};
pub use responder::{
    CanDoResponse, MutationResponse, OntologyMutation, OntologyResponder, ReadEntities, ReadOntology,
    ReadOntologyMetadata, SuccessResponse,
};
pub use triplestore::{GraphUpdate, OxigraphTriplestore, TriplestoreService};
pub use validation::{MutationPhase, MutationPipeline};

/// Version of the engine
pub const VERSION: &str = "0.4.2";

/// Default location of the engine configuration file
pub const DEFAULT_CONFIG_FILE: &str = "onto-cache.yaml";
