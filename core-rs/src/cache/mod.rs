//! Ontology graph store
//!
//! - [`OntologyCache`]: the published snapshot (get / replace / refresh)
//! - [`OntologyCacheData`]: one immutable snapshot with derived closures
//! - [`builtin`]: knora-base and salsah-gui, always present

pub mod builtin;
mod closure;
pub mod loader;
pub mod snapshot;
pub mod store;

pub use snapshot::OntologyCacheData;
pub use store::OntologyCache;
