/**
 * sparql.rs
 * SPARQL builders for ontology discovery and existing-data checks
 *
 * All queries run against the union of named graphs.
 */

use crate::iri::vocabulary::{owl, rdf, rdfs};
use crate::iri::SmartIri;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlQuery {
    query: String,
}

fn values(iris: &[SmartIri]) -> String {
    iris.iter()
        .map(|iri| format!("<{}>", iri.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

impl SparqlQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }

    /// Every named graph holding an owl:Ontology of the same name
    pub fn ontology_graphs() -> Self {
        Self::new(format!(
            r#"
            SELECT DISTINCT ?graph
            WHERE {{
                GRAPH ?graph {{ ?graph <{}> <{}> . }}
            }}
            ORDER BY ?graph
            "#,
            rdf::TYPE,
            owl::ONTOLOGY
        ))
    }

    /// Subjects outside `graph` that mention any of `entities`
    ///
    /// Covers object references, use as a predicate in instance data, and
    /// cardinality restrictions (reported as the restricted class).
    pub fn subjects_referencing(entities: &[SmartIri], graph: &SmartIri) -> Self {
        let entity_values = values(entities);
        Self::new(format!(
            r#"
            SELECT DISTINCT ?s
            WHERE {{
                GRAPH ?g {{
                    {{
                        VALUES ?o {{ {values} }}
                        ?s ?p ?o .
                        FILTER(isIRI(?s))
                    }}
                    UNION
                    {{
                        VALUES ?p {{ {values} }}
                        ?s ?p ?o .
                        FILTER(isIRI(?s))
                    }}
                    UNION
                    {{
                        VALUES ?o {{ {values} }}
                        ?s <{sub_class_of}> ?r .
                        ?r <{on_property}> ?o .
                    }}
                }}
                FILTER(?g != <{graph}>)
            }}
            ORDER BY ?s
            "#,
            values = entity_values,
            sub_class_of = rdfs::SUB_CLASS_OF,
            on_property = owl::ON_PROPERTY,
            graph = graph.as_str()
        ))
    }

    /// Any instance of one of `classes`
    pub fn has_instances(classes: &[SmartIri]) -> Self {
        Self::new(format!(
            r#"
            ASK {{
                VALUES ?class {{ {} }}
                ?s <{}> ?class .
            }}
            "#,
            values(classes),
            rdf::TYPE
        ))
    }

    /// Any instance of one of `classes` with a value for `property`
    pub fn instances_using_property(classes: &[SmartIri], property: &SmartIri) -> Self {
        Self::new(format!(
            r#"
            ASK {{
                VALUES ?class {{ {} }}
                ?s <{}> ?class .
                ?s <{}> ?o .
            }}
            "#,
            values(classes),
            rdf::TYPE,
            property.as_str()
        ))
    }

    /// Any instance of one of `classes` without a value for `property`
    pub fn instances_lacking_property(classes: &[SmartIri], property: &SmartIri) -> Self {
        Self::new(format!(
            r#"
            ASK {{
                VALUES ?class {{ {} }}
                ?s <{}> ?class .
                FILTER NOT EXISTS {{ ?s <{}> ?o . }}
            }}
            "#,
            values(classes),
            rdf::TYPE,
            property.as_str()
        ))
    }

    /// Any triple anywhere using `property` as predicate
    pub fn property_used(property: &SmartIri) -> Self {
        Self::new(format!(
            r#"
            ASK {{
                ?s <{}> ?o .
            }}
            "#,
            property.as_str()
        ))
    }
}
