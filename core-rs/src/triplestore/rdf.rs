//! Minimal RDF term model exchanged with the persistence service

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::iri::vocabulary::{rdf, xsd};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RdfNode {
    Iri(String),
    Blank(String),
    Literal {
        value: String,
        datatype: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
    },
}

impl RdfNode {
    pub fn iri(iri: impl Into<String>) -> Self {
        RdfNode::Iri(iri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        RdfNode::Blank(id.into())
    }

    pub fn typed(value: impl Into<String>, datatype: &str) -> Self {
        RdfNode::Literal {
            value: value.into(),
            datatype: datatype.to_string(),
            lang: None,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(value, xsd::STRING)
    }

    pub fn lang_string(value: impl Into<String>, lang: impl Into<String>) -> Self {
        RdfNode::Literal {
            value: value.into(),
            datatype: rdf::LANG_STRING.to_string(),
            lang: Some(lang.into()),
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            RdfNode::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_blank(&self) -> Option<&str> {
        match self {
            RdfNode::Blank(id) => Some(id),
            _ => None,
        }
    }

    /// Lexical value of a literal
    pub fn literal_value(&self) -> Option<&str> {
        match self {
            RdfNode::Literal { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for RdfNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfNode::Iri(iri) => write!(f, "<{}>", iri),
            RdfNode::Blank(id) => write!(f, "_:{}", id),
            RdfNode::Literal { value, lang: Some(lang), .. } => {
                write!(f, "\"{}\"@{}", escape_literal(value), lang)
            }
            RdfNode::Literal { value, datatype, .. } => {
                write!(f, "\"{}\"^^<{}>", escape_literal(value), datatype)
            }
        }
    }
}

/// Escape a lexical form for a SPARQL or N-Triples string
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RdfTriple {
    pub subject: RdfNode,
    pub predicate: String,
    pub object: RdfNode,
}

impl RdfTriple {
    pub fn new(subject: RdfNode, predicate: &str, object: RdfNode) -> Self {
        Self {
            subject,
            predicate: predicate.to_string(),
            object,
        }
    }
}

impl fmt::Display for RdfTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}
