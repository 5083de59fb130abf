//! Built-in ontologies
//!
//! knora-base and salsah-gui are defined in code and are always present in
//! every snapshot. Mutations may reference them but never change them.

use crate::entity::{
    Cardinality, CardinalityInfo, ClassDefinition, Literal, Ontology, OntologyMetadata,
    Predicates, PropertyDefinition,
};
use crate::iri::vocabulary::{knora_base as kb, owl, rdf, rdfs, salsah_gui, SYSTEM_PROJECT};
use crate::iri::SmartIri;

fn iri(s: &str) -> SmartIri {
    SmartIri::from_trusted(s)
}

fn labelled(rdf_type: &str, label: &str) -> Predicates {
    Predicates::new()
        .with(rdf::TYPE, Literal::iri(rdf_type))
        .with(rdfs::LABEL, Literal::lang_string(label, "en"))
}

fn class(class_iri: &str, label: &str, supers: &[&str], cardinalities: &[(&str, Cardinality)]) -> ClassDefinition {
    ClassDefinition {
        iri: iri(class_iri),
        predicates: labelled(owl::CLASS, label),
        subclass_of: supers.iter().map(|s| iri(s)).collect(),
        direct_cardinalities: cardinalities
            .iter()
            .map(|(p, c)| (iri(p), CardinalityInfo::new(*c)))
            .collect(),
    }
}

fn property(
    property_iri: &str,
    rdf_type: &str,
    label: &str,
    supers: &[&str],
    subject_type: Option<&str>,
    object_type: Option<&str>,
) -> PropertyDefinition {
    PropertyDefinition {
        iri: iri(property_iri),
        predicates: labelled(rdf_type, label),
        subproperty_of: supers.iter().map(|s| iri(s)).collect(),
        subject_type: subject_type.map(iri),
        object_type: object_type.map(iri),
    }
}

fn metadata(ontology_iri: &str, label: &str) -> OntologyMetadata {
    let mut metadata = OntologyMetadata::new(iri(ontology_iri));
    metadata.label = Some(label.to_string());
    metadata.project_iri = Some(iri(SYSTEM_PROJECT));
    metadata
}

/// Concrete value classes a user value property may point at
pub const VALUE_TYPES: &[&str] = &[
    kb::TEXT_VALUE,
    kb::INT_VALUE,
    kb::BOOLEAN_VALUE,
    kb::DECIMAL_VALUE,
    kb::DATE_VALUE,
    kb::TIME_VALUE,
    kb::URI_VALUE,
    kb::COLOR_VALUE,
    kb::GEOM_VALUE,
    kb::GEONAME_VALUE,
    kb::INTERVAL_VALUE,
    kb::LIST_VALUE,
];

pub fn knora_base() -> Ontology {
    use Cardinality::*;

    let mut ontology = Ontology::empty(metadata(kb::ONTOLOGY, "The knora-base ontology"));

    let mut classes = vec![
        class(
            kb::RESOURCE,
            "Resource",
            &[],
            &[
                (kb::ATTACHED_TO_USER, ExactlyOne),
                (kb::ATTACHED_TO_PROJECT, ExactlyOne),
                (kb::HAS_PERMISSIONS, ExactlyOne),
                (kb::CREATION_DATE, ExactlyOne),
                (kb::LAST_MODIFICATION_DATE, ZeroOrOne),
                (kb::IS_DELETED, ZeroOrOne),
                (kb::HAS_STANDOFF_LINK_TO, ZeroOrMore),
                (kb::HAS_STANDOFF_LINK_TO_VALUE, ZeroOrMore),
            ],
        ),
        class(
            kb::VALUE,
            "Value",
            &[],
            &[
                (kb::ATTACHED_TO_USER, ExactlyOne),
                (kb::HAS_PERMISSIONS, ExactlyOne),
                (kb::IS_DELETED, ZeroOrOne),
            ],
        ),
        class(kb::LINK_VALUE, "Link value", &[kb::VALUE], &[]),
        class(kb::FILE_VALUE, "File value", &[kb::VALUE], &[]),
        class(kb::STILL_IMAGE_FILE_VALUE, "Still image file value", &[kb::FILE_VALUE], &[]),
    ];
    for value_type in VALUE_TYPES {
        let label = SmartIri::from_trusted(value_type)
            .entity_name()
            .unwrap_or("Value")
            .to_string();
        classes.push(class(value_type, &label, &[kb::VALUE], &[]));
    }

    let object_property = owl::OBJECT_PROPERTY;
    let properties = vec![
        property(kb::RESOURCE_PROPERTY, object_property, "resource property", &[], Some(kb::RESOURCE), None),
        property(kb::HAS_VALUE, object_property, "has value", &[kb::RESOURCE_PROPERTY], Some(kb::RESOURCE), Some(kb::VALUE)),
        property(kb::HAS_LINK_TO, object_property, "has link to", &[kb::RESOURCE_PROPERTY], Some(kb::RESOURCE), Some(kb::RESOURCE)),
        property(kb::HAS_LINK_TO_VALUE, object_property, "has link to value", &[kb::HAS_VALUE], Some(kb::RESOURCE), Some(kb::LINK_VALUE)),
        property(kb::HAS_FILE_VALUE, object_property, "has file value", &[kb::HAS_VALUE], Some(kb::RESOURCE), Some(kb::FILE_VALUE)),
        property(kb::HAS_STILL_IMAGE_FILE_VALUE, object_property, "has still image file value", &[kb::HAS_FILE_VALUE], Some(kb::RESOURCE), Some(kb::STILL_IMAGE_FILE_VALUE)),
        property(kb::HAS_STANDOFF_LINK_TO, object_property, "has standoff link to", &[kb::HAS_LINK_TO], Some(kb::RESOURCE), Some(kb::RESOURCE)),
        property(kb::HAS_STANDOFF_LINK_TO_VALUE, object_property, "has standoff link to value", &[kb::HAS_LINK_TO_VALUE], Some(kb::RESOURCE), Some(kb::LINK_VALUE)),
        property(kb::ATTACHED_TO_USER, object_property, "attached to user", &[], None, None),
        property(kb::ATTACHED_TO_PROJECT, object_property, "attached to project", &[], None, None),
        property(kb::HAS_PERMISSIONS, owl::DATATYPE_PROPERTY, "has permissions", &[], None, None),
        property(kb::CREATION_DATE, owl::DATATYPE_PROPERTY, "creation date", &[], None, None),
        property(kb::LAST_MODIFICATION_DATE, owl::DATATYPE_PROPERTY, "last modification date", &[], None, None),
        property(kb::IS_DELETED, owl::DATATYPE_PROPERTY, "is deleted", &[], None, None),
    ];

    ontology.classes = classes.into_iter().map(|c| (c.iri.clone(), c)).collect();
    ontology.properties = properties.into_iter().map(|p| (p.iri.clone(), p)).collect();
    ontology
}

pub fn salsah_gui() -> Ontology {
    let mut ontology = Ontology::empty(metadata(salsah_gui::ONTOLOGY, "The salsah-gui ontology"));
    let properties = [
        property(salsah_gui::GUI_ORDER, owl::ANNOTATION_PROPERTY, "GUI order", &[], None, None),
        property(salsah_gui::GUI_ELEMENT, owl::ANNOTATION_PROPERTY, "GUI element", &[], None, None),
        property(salsah_gui::GUI_ATTRIBUTE, owl::ANNOTATION_PROPERTY, "GUI attribute", &[], None, None),
    ];
    ontology.properties = properties.into_iter().map(|p| (p.iri.clone(), p)).collect();
    ontology
}

/// All built-in ontologies
pub fn builtin_ontologies() -> Vec<Ontology> {
    vec![knora_base(), salsah_gui()]
}
