//! Checks that need only the request itself

use std::collections::BTreeSet;

use crate::entity::{ClassDefinition, Literal, Predicates, PropertyDefinition};
use crate::errors::{OntoError, Result, ValidationRule};
use crate::iri::vocabulary::{owl, rdf, rdfs};
use crate::iri::{validate_entity_name, SmartIri};

/// An entity IRI a client may create: in a project or shared ontology,
/// with a valid local name. Returns the owning ontology.
pub fn check_entity_iri(iri: &SmartIri) -> Result<SmartIri> {
    let name = iri.entity_name().filter(|_| iri.is_knora_entity_iri()).ok_or_else(|| {
        OntoError::bad_request(
            ValidationRule::Syntax,
            format!("{} is not a valid ontology entity IRI", iri),
        )
    })?;
    validate_entity_name(name)?;

    let ontology = iri.ontology_iri().ok_or_else(|| {
        OntoError::bad_request(ValidationRule::Syntax, format!("{} has no ontology", iri))
    })?;
    if ontology.is_built_in() {
        return Err(OntoError::bad_request(
            ValidationRule::BuiltInOntology,
            format!("{} belongs to a built-in ontology", iri),
        ));
    }
    Ok(ontology)
}

pub fn check_ontology_label(label: &str) -> Result<()> {
    if label.trim().is_empty() {
        return Err(OntoError::bad_request(
            ValidationRule::RequiredMetadata,
            "Ontology label may not be empty",
        ));
    }
    Ok(())
}

fn check_rdf_type(entity: &SmartIri, types: Vec<&SmartIri>, expected: &str) -> Result<()> {
    match types.as_slice() {
        [] => Err(OntoError::bad_request(
            ValidationRule::RdfType,
            format!("{} has no rdf:type", entity),
        )),
        [only] if only.as_str() == expected => Ok(()),
        _ => Err(OntoError::bad_request(
            ValidationRule::RdfType,
            format!(
                "rdf:type of {} must be exactly <{}>, got {}",
                entity,
                expected,
                types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
            ),
        )),
    }
}

pub fn check_class_rdf_type(class: &ClassDefinition) -> Result<()> {
    check_rdf_type(
        &class.iri,
        class.predicates.iri_objects(rdf::TYPE),
        owl::CLASS,
    )
}

pub fn check_property_rdf_type(property: &PropertyDefinition) -> Result<()> {
    check_rdf_type(
        &property.iri,
        property.predicates.iri_objects(rdf::TYPE),
        owl::OBJECT_PROPERTY,
    )
}

/// Every object must be a non-empty, language-tagged string
pub fn check_lang_strings(entity: &SmartIri, predicate: &str, objects: &BTreeSet<Literal>) -> Result<()> {
    if objects.is_empty() {
        return Err(OntoError::bad_request(
            ValidationRule::RequiredMetadata,
            format!("{} requires at least one <{}>", entity, predicate),
        ));
    }
    for object in objects {
        match object.as_lang_string() {
            Some((value, lang)) if !value.trim().is_empty() && !lang.is_empty() => {}
            _ => {
                return Err(OntoError::bad_request(
                    ValidationRule::RequiredMetadata,
                    format!(
                        "Every <{}> of {} must be a language-tagged string, got '{}'",
                        predicate,
                        entity,
                        object.lexical()
                    ),
                ))
            }
        }
    }
    Ok(())
}

/// New classes and properties need tagged rdfs:label and rdfs:comment
pub fn check_localized_metadata(entity: &SmartIri, predicates: &Predicates) -> Result<()> {
    for predicate in [rdfs::LABEL, rdfs::COMMENT] {
        let objects = predicates.get(predicate).cloned().unwrap_or_default();
        check_lang_strings(entity, predicate, &objects)?;
    }
    Ok(())
}

pub fn check_has_superclass(class: &ClassDefinition) -> Result<()> {
    if class.subclass_of.is_empty() {
        return Err(OntoError::bad_request(
            ValidationRule::Syntax,
            format!("{} must have at least one base class", class.iri),
        ));
    }
    if class.subclass_of.contains(&class.iri) {
        return Err(OntoError::bad_request(
            ValidationRule::Compatibility,
            format!("{} cannot be its own base class", class.iri),
        ));
    }
    Ok(())
}

pub fn check_has_superproperty(property: &PropertyDefinition) -> Result<()> {
    if property.subproperty_of.is_empty() {
        return Err(OntoError::bad_request(
            ValidationRule::PropertyTaxonomy,
            format!("{} must have at least one base property", property.iri),
        ));
    }
    if property.subproperty_of.contains(&property.iri) {
        return Err(OntoError::bad_request(
            ValidationRule::Compatibility,
            format!("{} cannot be its own base property", property.iri),
        ));
    }
    Ok(())
}
