/**
 * project module
 * Engine configuration and the project directory collaborator
 */

pub mod config;
pub mod directory;

pub use config::{EngineConfig, Metadata, ProjectEntry, Spec, StoreConfig};
pub use directory::{InMemoryProjectDirectory, ProjectDirectory, ProjectInfo};
