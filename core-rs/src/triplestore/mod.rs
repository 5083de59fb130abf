//! Persistence collaborator
//!
//! The cache never talks to a SPARQL endpoint directly; everything goes
//! through [`TriplestoreService`]. [`OxigraphTriplestore`] is the embedded
//! implementation used by the CLI and the tests.

pub mod oxigraph_store;
pub mod rdf;
pub mod serialize;
pub mod sparql;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::Result;

pub use oxigraph_store::OxigraphTriplestore;
pub use rdf::{RdfNode, RdfTriple};
pub use sparql::SparqlQuery;

/// One solution of a SELECT query
pub type QueryResult = HashMap<String, RdfNode>;

/// A write against one named graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphUpdate {
    /// Delete then insert, atomically
    Modify {
        graph: String,
        delete: Vec<RdfTriple>,
        insert: Vec<RdfTriple>,
    },
    /// Remove the whole graph
    DropGraph { graph: String },
}

impl GraphUpdate {
    pub fn graph(&self) -> &str {
        match self {
            GraphUpdate::Modify { graph, .. } | GraphUpdate::DropGraph { graph } => graph,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GraphUpdate::Modify { delete, insert, .. } if delete.is_empty() && insert.is_empty())
    }
}

#[async_trait]
pub trait TriplestoreService: Send + Sync {
    async fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryResult>>;

    async fn ask(&self, query: &SparqlQuery) -> Result<bool>;

    /// All triples of one named graph
    async fn graph_triples(&self, graph: &str) -> Result<Vec<RdfTriple>>;

    async fn update(&self, update: GraphUpdate) -> Result<()>;
}
