//! Embedded Oxigraph triplestore

use std::path::Path;

use async_trait::async_trait;
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{
    BlankNode, GraphNameRef, Literal as OxLiteral, NamedNode, Quad, Subject, Term,
};
use oxigraph::sparql::{Query, QueryResults};
use oxigraph::store::{StorageError, Store};
use tracing::debug;

use crate::errors::{OntoError, Result};
use crate::triplestore::rdf::{RdfNode, RdfTriple};
use crate::triplestore::{GraphUpdate, QueryResult, SparqlQuery, TriplestoreService};

pub struct OxigraphTriplestore {
    store: Store,
}

fn named_node(iri: &str) -> Result<NamedNode> {
    NamedNode::new(iri).map_err(|e| OntoError::Triplestore(format!("Invalid IRI <{}>: {}", iri, e)))
}

fn to_subject(node: &RdfNode) -> Result<Subject> {
    match node {
        RdfNode::Iri(iri) => Ok(named_node(iri)?.into()),
        RdfNode::Blank(id) => Ok(BlankNode::new(id)
            .map_err(|e| OntoError::Triplestore(format!("Invalid blank node {}: {}", id, e)))?
            .into()),
        RdfNode::Literal { .. } => Err(OntoError::Triplestore(format!(
            "Literal {} cannot be a subject",
            node
        ))),
    }
}

fn to_term(node: &RdfNode) -> Result<Term> {
    match node {
        RdfNode::Literal {
            value,
            lang: Some(lang),
            ..
        } => OxLiteral::new_language_tagged_literal(value.clone(), lang.clone())
            .map(Term::from)
            .map_err(|e| OntoError::Triplestore(format!("Invalid language tag '{}': {}", lang, e))),
        RdfNode::Literal {
            value, datatype, ..
        } => Ok(OxLiteral::new_typed_literal(value.clone(), named_node(datatype)?).into()),
        _ => Ok(match to_subject(node)? {
            Subject::NamedNode(n) => n.into(),
            Subject::BlankNode(b) => b.into(),
            #[allow(unreachable_patterns)]
            _ => {
                return Err(OntoError::Triplestore(format!(
                    "Unsupported term {}",
                    node
                )))
            }
        }),
    }
}

fn from_term(term: &Term) -> RdfNode {
    match term {
        Term::NamedNode(n) => RdfNode::iri(n.as_str()),
        Term::BlankNode(b) => RdfNode::blank(b.as_str()),
        Term::Literal(l) => match l.language() {
            Some(lang) => RdfNode::lang_string(l.value(), lang),
            None => RdfNode::typed(l.value(), l.datatype().as_str()),
        },
        #[allow(unreachable_patterns)]
        _ => RdfNode::iri(term.to_string()),
    }
}

fn from_subject(subject: &Subject) -> RdfNode {
    match subject {
        Subject::NamedNode(n) => RdfNode::iri(n.as_str()),
        Subject::BlankNode(b) => RdfNode::blank(b.as_str()),
        #[allow(unreachable_patterns)]
        _ => RdfNode::iri(subject.to_string()),
    }
}

impl OxigraphTriplestore {
    /// In-memory store, for tests and dry runs
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            store: Store::new()?,
        })
    }

    /// Persistent store at `path`, created if missing
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            store: Store::open(path)?,
        })
    }

    /// Load Turtle into a named graph (fixtures, instance data)
    pub fn load_turtle(&self, graph: &str, turtle: &str) -> Result<()> {
        let parser = RdfParser::from_format(RdfFormat::Turtle).with_default_graph(named_node(graph)?);
        self.store
            .load_from_reader(parser, turtle.as_bytes())
            .map_err(|e| OntoError::Triplestore(e.to_string()))
    }

    fn to_quads(graph: &NamedNode, triples: &[RdfTriple]) -> Result<Vec<Quad>> {
        triples
            .iter()
            .map(|t| {
                Ok(Quad::new(
                    to_subject(&t.subject)?,
                    named_node(&t.predicate)?,
                    to_term(&t.object)?,
                    graph.clone(),
                ))
            })
            .collect()
    }

    fn prepare(query: &SparqlQuery) -> Result<Query> {
        let mut parsed = Query::parse(query.as_str(), None)
            .map_err(|e| OntoError::Triplestore(format!("Invalid SPARQL: {}", e)))?;
        parsed.dataset_mut().set_default_graph_as_union();
        Ok(parsed)
    }
}

#[async_trait]
impl TriplestoreService for OxigraphTriplestore {
    async fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryResult>> {
        let results = self.store.query(Self::prepare(query)?)?;

        match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution?;
                    let mut row = QueryResult::new();
                    for (var, term) in solution.iter() {
                        row.insert(var.as_str().to_string(), from_term(term));
                    }
                    rows.push(row);
                }
                Ok(rows)
            }
            _ => Err(OntoError::Triplestore(
                "Expected a SELECT query".to_string(),
            )),
        }
    }

    async fn ask(&self, query: &SparqlQuery) -> Result<bool> {
        match self.store.query(Self::prepare(query)?)? {
            QueryResults::Boolean(b) => Ok(b),
            _ => Err(OntoError::Triplestore("Expected an ASK query".to_string())),
        }
    }

    async fn graph_triples(&self, graph: &str) -> Result<Vec<RdfTriple>> {
        let graph_node = named_node(graph)?;
        let mut triples = Vec::new();
        for quad in self.store.quads_for_pattern(
            None,
            None,
            None,
            Some(GraphNameRef::NamedNode(graph_node.as_ref())),
        ) {
            let quad = quad?;
            triples.push(RdfTriple {
                subject: from_subject(&quad.subject),
                predicate: quad.predicate.as_str().to_string(),
                object: from_term(&quad.object),
            });
        }
        Ok(triples)
    }

    async fn update(&self, update: GraphUpdate) -> Result<()> {
        match update {
            GraphUpdate::Modify {
                graph,
                delete,
                insert,
            } => {
                let graph_node = named_node(&graph)?;
                let delete = Self::to_quads(&graph_node, &delete)?;
                let insert = Self::to_quads(&graph_node, &insert)?;
                debug!(
                    graph = %graph,
                    deleted = delete.len(),
                    inserted = insert.len(),
                    "Applying graph update"
                );

                self.store.transaction(|mut transaction| {
                    for quad in &delete {
                        transaction.remove(quad)?;
                    }
                    for quad in &insert {
                        transaction.insert(quad)?;
                    }
                    Ok::<_, StorageError>(())
                })?;
                Ok(())
            }
            GraphUpdate::DropGraph { graph } => {
                let graph_node = named_node(&graph)?;
                debug!(graph = %graph, "Dropping graph");
                self.store.remove_named_graph(graph_node.as_ref())?;
                Ok(())
            }
        }
    }
}

impl OxigraphTriplestore {
    /// True if `graph` holds at least one triple
    pub fn has_graph(&self, graph: &str) -> Result<bool> {
        let graph_node = named_node(graph)?;
        let mut quads = self.store.quads_for_pattern(
            None,
            None,
            None,
            Some(GraphNameRef::NamedNode(graph_node.as_ref())),
        );
        Ok(quads.next().transpose()?.is_some())
    }
}
