//! Loading ontologies from the persistence service

use tracing::{debug, info};

use crate::entity::Ontology;
use crate::errors::{OntoError, Result};
use crate::iri::SmartIri;
use crate::triplestore::serialize::ontology_from_triples;
use crate::triplestore::{SparqlQuery, TriplestoreService};

/// Read every project and shared ontology graph
///
/// Built-in ontology graphs, if present in the store, are skipped: the
/// in-code definitions are authoritative.
pub async fn load_ontologies(triplestore: &dyn TriplestoreService) -> Result<Vec<Ontology>> {
    let rows = triplestore.select(&SparqlQuery::ontology_graphs()).await?;

    let mut ontologies = Vec::with_capacity(rows.len());
    for row in rows {
        let graph = row
            .get("graph")
            .and_then(|node| node.as_iri())
            .ok_or_else(|| OntoError::Triplestore("Ontology graph query returned no IRI".to_string()))?;

        let iri = SmartIri::from_trusted(graph);
        if iri.is_built_in() || !iri.is_knora_ontology_iri() {
            debug!(graph = %graph, "Skipping graph");
            continue;
        }

        let triples = triplestore.graph_triples(graph).await?;
        let ontology = ontology_from_triples(graph, &triples)?;
        debug!(
            ontology = %graph,
            classes = ontology.classes.len(),
            properties = ontology.properties.len(),
            "Loaded ontology"
        );
        ontologies.push(ontology);
    }

    info!(count = ontologies.len(), "Loaded ontologies from triplestore");
    Ok(ontologies)
}
