//! Class definitions and their derived closures

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entity::cardinality::CardinalityInfo;
use crate::entity::literal::{Literal, Predicates};
use crate::iri::vocabulary::{owl, rdf, rdfs};
use crate::iri::SmartIri;

/// A class as stored: only what was asserted directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDefinition {
    pub iri: SmartIri,
    pub predicates: Predicates,
    pub subclass_of: BTreeSet<SmartIri>,
    #[serde(default)]
    pub direct_cardinalities: BTreeMap<SmartIri, CardinalityInfo>,
}

impl ClassDefinition {
    /// New owl:Class with no predicates besides rdf:type
    pub fn new(iri: SmartIri) -> Self {
        let mut predicates = Predicates::new();
        predicates.insert(SmartIri::from_trusted(rdf::TYPE), Literal::iri(owl::CLASS));
        Self {
            iri,
            predicates,
            subclass_of: BTreeSet::new(),
            direct_cardinalities: BTreeMap::new(),
        }
    }

    pub fn rdf_type(&self) -> Option<&SmartIri> {
        self.predicates.iri_object(rdf::TYPE)
    }

    pub fn label(&self, lang: &str) -> Option<&str> {
        self.predicates.lang_value(rdfs::LABEL, lang)
    }

    pub fn has_comment(&self) -> bool {
        self.predicates.contains(rdfs::COMMENT)
    }
}

/// A class together with everything it inherits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub definition: ClassDefinition,
    /// The class itself first, then ancestors, most specific first
    pub all_base_classes: Vec<SmartIri>,
    pub all_cardinalities: BTreeMap<SmartIri, CardinalityInfo>,
    /// `all_cardinalities` without administrative properties
    pub all_resource_property_cardinalities: BTreeMap<SmartIri, CardinalityInfo>,
    /// Properties whose cardinality comes from an ancestor
    pub inherited_cardinalities: BTreeSet<SmartIri>,
    pub is_resource_class: bool,
    pub is_value_class: bool,
}

impl ClassInfo {
    pub fn iri(&self) -> &SmartIri {
        &self.definition.iri
    }

    pub fn is_subclass_of(&self, other: &SmartIri) -> bool {
        self.all_base_classes.iter().any(|base| base == other)
    }

    pub fn is_inherited(&self, property: &SmartIri) -> bool {
        self.inherited_cardinalities.contains(property)
    }
}
