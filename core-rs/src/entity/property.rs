//! Property definitions and the value/link taxonomy

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::literal::Predicates;
use crate::iri::vocabulary::{knora_base, rdf, salsah_gui};
use crate::iri::SmartIri;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub iri: SmartIri,
    pub predicates: Predicates,
    pub subproperty_of: BTreeSet<SmartIri>,
    /// knora-base:subjectClassConstraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<SmartIri>,
    /// knora-base:objectClassConstraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<SmartIri>,
}

impl PropertyDefinition {
    pub fn rdf_type(&self) -> Option<&SmartIri> {
        self.predicates.iri_object(rdf::TYPE)
    }

    pub fn gui_element(&self) -> Option<&SmartIri> {
        self.predicates.iri_object(salsah_gui::GUI_ELEMENT)
    }

    /// True if any directly declared superproperty is `base`
    pub fn directly_extends(&self, base: &str) -> bool {
        self.subproperty_of.iter().any(|p| p.as_str() == base)
    }
}

/// What a property points at, derived from its superproperty closure
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PropertyKind {
    /// Subproperty of knora-base:hasValue
    Value,
    /// Subproperty of knora-base:hasLinkTo, with its LinkValue shadow
    #[serde(rename_all = "camelCase")]
    Link { link_value_property: SmartIri },
    /// Subproperty of knora-base:hasLinkToValue, shadow of a link property
    #[serde(rename_all = "camelCase")]
    LinkValue { link_property: SmartIri },
    /// Anything else: attachedToProject, creationDate, salsah-gui annotations
    Administrative,
}

impl PropertyKind {
    /// Classify a property from its closure (self included)
    pub fn classify(iri: &SmartIri, all_super_properties: &[SmartIri]) -> Self {
        let has = |base: &str| all_super_properties.iter().any(|p| p.as_str() == base);

        if has(knora_base::HAS_LINK_TO_VALUE) {
            let link_property = iri
                .as_str()
                .strip_suffix("Value")
                .map(SmartIri::from_trusted)
                .unwrap_or_else(|| iri.clone());
            PropertyKind::LinkValue { link_property }
        } else if has(knora_base::HAS_LINK_TO) {
            PropertyKind::Link {
                link_value_property: iri.link_value_property(),
            }
        } else if has(knora_base::HAS_VALUE) {
            PropertyKind::Value
        } else {
            PropertyKind::Administrative
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, PropertyKind::Link { .. })
    }

    pub fn is_link_value(&self) -> bool {
        matches!(self, PropertyKind::LinkValue { .. })
    }

    /// Value, link or link-value: what resource instances actually carry
    pub fn is_resource_property(&self) -> bool {
        !matches!(self, PropertyKind::Administrative)
    }
}

/// A property together with its superproperty closure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfo {
    pub definition: PropertyDefinition,
    /// The property itself first, then ancestors, most specific first
    pub all_super_properties: Vec<SmartIri>,
    pub kind: PropertyKind,
    /// Subject constraint, declared or inherited
    pub effective_subject_type: Option<SmartIri>,
    /// Object constraint, declared or inherited
    pub effective_object_type: Option<SmartIri>,
}

impl PropertyInfo {
    pub fn iri(&self) -> &SmartIri {
        &self.definition.iri
    }

    pub fn is_subproperty_of(&self, other: &SmartIri) -> bool {
        self.all_super_properties.iter().any(|p| p == other)
    }

    pub fn is_boolean(&self) -> bool {
        self.effective_object_type
            .as_ref()
            .map(|o| o.as_str() == knora_base::BOOLEAN_VALUE)
            .unwrap_or(false)
    }
}
