//! Ontology records

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::class::ClassDefinition;
use crate::entity::property::PropertyDefinition;
use crate::iri::SmartIri;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyMetadata {
    pub ontology_iri: SmartIri,
    /// Owning project; the shared-ontologies project for shared ontologies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_iri: Option<SmartIri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Absent only for built-in ontologies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modification_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_shared: bool,
}

impl OntologyMetadata {
    pub fn new(ontology_iri: SmartIri) -> Self {
        Self {
            ontology_iri,
            project_iri: None,
            label: None,
            comment: None,
            last_modification_date: None,
            is_shared: false,
        }
    }
}

/// One ontology: metadata plus its classes and properties.
///
/// Published copies are immutable; a mutation clones, edits and replaces
/// the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ontology {
    pub metadata: OntologyMetadata,
    #[serde(default)]
    pub classes: BTreeMap<SmartIri, ClassDefinition>,
    #[serde(default)]
    pub properties: BTreeMap<SmartIri, PropertyDefinition>,
}

impl Ontology {
    pub fn empty(metadata: OntologyMetadata) -> Self {
        Self {
            metadata,
            classes: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn iri(&self) -> &SmartIri {
        &self.metadata.ontology_iri
    }

    pub fn contains_entity(&self, iri: &SmartIri) -> bool {
        self.classes.contains_key(iri) || self.properties.contains_key(iri)
    }

    /// Every class and property IRI defined here
    pub fn entity_iris(&self) -> impl Iterator<Item = &SmartIri> {
        self.classes.keys().chain(self.properties.keys())
    }

    pub fn last_modification_date(&self) -> Option<DateTime<Utc>> {
        self.metadata.last_modification_date
    }

    /// Other project ontologies whose entities this one refers to
    pub fn referenced_ontologies(&self) -> BTreeSet<SmartIri> {
        let from_classes = self
            .classes
            .values()
            .flat_map(|c| c.subclass_of.iter().chain(c.direct_cardinalities.keys()));
        let from_properties = self.properties.values().flat_map(|p| {
            p.subproperty_of
                .iter()
                .chain(p.subject_type.iter())
                .chain(p.object_type.iter())
        });
        from_classes
            .chain(from_properties)
            .filter_map(|iri| iri.ontology_iri())
            .filter(|ontology| ontology != self.iri() && !ontology.is_built_in())
            .collect()
    }
}
