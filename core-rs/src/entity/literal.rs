//! Predicate objects of ontology entities

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::iri::SmartIri;

/// Object of a predicate on a class, property or ontology
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Literal {
    Iri(SmartIri),
    LangString { value: String, lang: String },
    String(String),
    Boolean(bool),
    Integer(i64),
    /// xsd:dateTime lexical form
    DateTime(String),
}

impl Literal {
    pub fn lang_string(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Literal::LangString {
            value: value.into(),
            lang: lang.into(),
        }
    }

    pub fn iri(iri: &str) -> Self {
        Literal::Iri(SmartIri::from_trusted(iri))
    }

    pub fn as_iri(&self) -> Option<&SmartIri> {
        match self {
            Literal::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_lang_string(&self) -> Option<(&str, &str)> {
        match self {
            Literal::LangString { value, lang } => Some((value, lang)),
            _ => None,
        }
    }

    /// Lexical value, ignoring type and language
    pub fn lexical(&self) -> String {
        match self {
            Literal::Iri(iri) => iri.as_str().to_string(),
            Literal::LangString { value, .. } | Literal::String(value) | Literal::DateTime(value) => {
                value.clone()
            }
            Literal::Boolean(b) => b.to_string(),
            Literal::Integer(i) => i.to_string(),
        }
    }
}

/// Predicate map of an entity: predicate IRI to its set of objects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicates(BTreeMap<SmartIri, BTreeSet<Literal>>);

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a single object
    pub fn with(mut self, predicate: &str, object: Literal) -> Self {
        self.insert(SmartIri::from_trusted(predicate), object);
        self
    }

    pub fn insert(&mut self, predicate: SmartIri, object: Literal) {
        self.0.entry(predicate).or_default().insert(object);
    }

    /// Replace all objects of a predicate
    pub fn set(&mut self, predicate: SmartIri, objects: BTreeSet<Literal>) {
        if objects.is_empty() {
            self.0.remove(&predicate);
        } else {
            self.0.insert(predicate, objects);
        }
    }

    pub fn remove(&mut self, predicate: &str) -> Option<BTreeSet<Literal>> {
        self.0.remove(&SmartIri::from_trusted(predicate))
    }

    pub fn get(&self, predicate: &str) -> Option<&BTreeSet<Literal>> {
        self.0.get(&SmartIri::from_trusted(predicate))
    }

    pub fn contains(&self, predicate: &str) -> bool {
        self.get(predicate).map(|objects| !objects.is_empty()).unwrap_or(false)
    }

    /// First IRI object of a predicate
    pub fn iri_object(&self, predicate: &str) -> Option<&SmartIri> {
        self.get(predicate)?.iter().find_map(Literal::as_iri)
    }

    /// All IRI objects of a predicate
    pub fn iri_objects(&self, predicate: &str) -> Vec<&SmartIri> {
        self.get(predicate)
            .map(|objects| objects.iter().filter_map(Literal::as_iri).collect())
            .unwrap_or_default()
    }

    /// `(value, lang)` pairs of a predicate
    pub fn lang_strings(&self, predicate: &str) -> Vec<(&str, &str)> {
        self.get(predicate)
            .map(|objects| objects.iter().filter_map(Literal::as_lang_string).collect())
            .unwrap_or_default()
    }

    /// Value of a predicate in one language, if present
    pub fn lang_value(&self, predicate: &str, lang: &str) -> Option<&str> {
        self.lang_strings(predicate)
            .into_iter()
            .find(|(_, l)| *l == lang)
            .map(|(value, _)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmartIri, &BTreeSet<Literal>)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SmartIri, Literal)> for Predicates {
    fn from_iter<T: IntoIterator<Item = (SmartIri, Literal)>>(iter: T) -> Self {
        let mut predicates = Predicates::new();
        for (predicate, object) in iter {
            predicates.insert(predicate, object);
        }
        predicates
    }
}
