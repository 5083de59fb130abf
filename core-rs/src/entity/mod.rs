//! Entity model
//!
//! Immutable value types for ontologies and their classes, properties and
//! cardinalities. Derived closures live in [`ClassInfo`] and [`PropertyInfo`]
//! and are computed by the cache, never stored.

pub mod cardinality;
pub mod class;
pub mod literal;
pub mod ontology;
pub mod property;

pub use cardinality::{Cardinality, CardinalityInfo};
pub use class::{ClassDefinition, ClassInfo};
pub use literal::{Literal, Predicates};
pub use ontology::{Ontology, OntologyMetadata};
pub use property::{PropertyDefinition, PropertyInfo, PropertyKind};
