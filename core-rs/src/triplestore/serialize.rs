//! Ontology <-> triples
//!
//! Each ontology lives in its own named graph, named by the ontology IRI.
//! Cardinalities are OWL restrictions on blank nodes whose labels are
//! derived from the class and property IRIs, so re-serializing an
//! unchanged class yields identical triples.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::entity::{
    Cardinality, CardinalityInfo, ClassDefinition, Literal, Ontology, OntologyMetadata,
    Predicates, PropertyDefinition,
};
use crate::errors::{OntoError, Result};
use crate::iri::vocabulary::{knora_base, owl, rdf, rdfs, salsah_gui, xsd};
use crate::iri::SmartIri;
use crate::triplestore::rdf::{RdfNode, RdfTriple};

const PROPERTY_TYPES: &[&str] = &[
    owl::OBJECT_PROPERTY,
    owl::DATATYPE_PROPERTY,
    owl::ANNOTATION_PROPERTY,
];

/// Stable blank node label for the restriction of `class` on `property`
pub fn restriction_id(class: &SmartIri, property: &SmartIri) -> String {
    let name = format!("{}|{}", class.as_str(), property.as_str());
    format!("r{}", Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).simple())
}

/// xsd:dateTime lexical form with microsecond precision
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| OntoError::Inconsistency(format!("Invalid timestamp '{}': {}", value, e)))
}

pub fn literal_to_node(literal: &Literal) -> RdfNode {
    match literal {
        Literal::Iri(iri) => RdfNode::iri(iri.as_str()),
        Literal::LangString { value, lang } => RdfNode::lang_string(value.clone(), lang.clone()),
        Literal::String(value) => RdfNode::string(value.clone()),
        Literal::Boolean(b) => RdfNode::typed(b.to_string(), xsd::BOOLEAN),
        Literal::Integer(i) => RdfNode::typed(i.to_string(), xsd::INTEGER),
        Literal::DateTime(value) => RdfNode::typed(value.clone(), xsd::DATE_TIME),
    }
}

/// Blank nodes have no literal form
pub fn node_to_literal(node: &RdfNode) -> Option<Literal> {
    match node {
        RdfNode::Iri(iri) => Some(Literal::Iri(SmartIri::from_trusted(iri))),
        RdfNode::Blank(_) => None,
        RdfNode::Literal {
            value,
            lang: Some(lang),
            ..
        } => Some(Literal::lang_string(value.clone(), lang.clone())),
        RdfNode::Literal {
            value, datatype, ..
        } => Some(match datatype.as_str() {
            xsd::BOOLEAN => Literal::Boolean(value == "true" || value == "1"),
            xsd::INTEGER | xsd::NON_NEGATIVE_INTEGER => match value.parse() {
                Ok(i) => Literal::Integer(i),
                Err(_) => Literal::String(value.clone()),
            },
            xsd::DATE_TIME | xsd::DATE_TIME_STAMP => Literal::DateTime(value.clone()),
            _ => Literal::String(value.clone()),
        }),
    }
}

fn push_predicates(triples: &mut Vec<RdfTriple>, subject: &SmartIri, predicates: &Predicates) {
    for (predicate, objects) in predicates.iter() {
        for object in objects {
            triples.push(RdfTriple::new(
                RdfNode::iri(subject.as_str()),
                predicate.as_str(),
                literal_to_node(object),
            ));
        }
    }
}

fn metadata_triples(metadata: &OntologyMetadata) -> Vec<RdfTriple> {
    let subject = || RdfNode::iri(metadata.ontology_iri.as_str());
    let mut triples = vec![RdfTriple::new(subject(), rdf::TYPE, RdfNode::iri(owl::ONTOLOGY))];

    if let Some(label) = &metadata.label {
        triples.push(RdfTriple::new(subject(), rdfs::LABEL, RdfNode::string(label.clone())));
    }
    if let Some(comment) = &metadata.comment {
        triples.push(RdfTriple::new(subject(), rdfs::COMMENT, RdfNode::string(comment.clone())));
    }
    if let Some(project) = &metadata.project_iri {
        triples.push(RdfTriple::new(
            subject(),
            knora_base::ATTACHED_TO_PROJECT,
            RdfNode::iri(project.as_str()),
        ));
    }
    if metadata.is_shared {
        triples.push(RdfTriple::new(
            subject(),
            knora_base::IS_SHARED,
            RdfNode::typed("true", xsd::BOOLEAN),
        ));
    }
    if let Some(lmd) = &metadata.last_modification_date {
        triples.push(RdfTriple::new(
            subject(),
            knora_base::LAST_MODIFICATION_DATE,
            RdfNode::typed(format_timestamp(lmd), xsd::DATE_TIME),
        ));
    }
    triples
}

fn class_triples(triples: &mut Vec<RdfTriple>, class: &ClassDefinition) {
    let subject = || RdfNode::iri(class.iri.as_str());
    push_predicates(triples, &class.iri, &class.predicates);

    for superclass in &class.subclass_of {
        triples.push(RdfTriple::new(
            subject(),
            rdfs::SUB_CLASS_OF,
            RdfNode::iri(superclass.as_str()),
        ));
    }

    for (property, info) in &class.direct_cardinalities {
        let restriction = || RdfNode::blank(restriction_id(&class.iri, property));
        let (owl_predicate, value) = info.cardinality.to_owl();

        triples.push(RdfTriple::new(subject(), rdfs::SUB_CLASS_OF, restriction()));
        triples.push(RdfTriple::new(restriction(), rdf::TYPE, RdfNode::iri(owl::RESTRICTION)));
        triples.push(RdfTriple::new(
            restriction(),
            owl::ON_PROPERTY,
            RdfNode::iri(property.as_str()),
        ));
        triples.push(RdfTriple::new(
            restriction(),
            owl_predicate,
            RdfNode::typed(value.to_string(), xsd::NON_NEGATIVE_INTEGER),
        ));
        if let Some(order) = info.gui_order {
            triples.push(RdfTriple::new(
                restriction(),
                salsah_gui::GUI_ORDER,
                RdfNode::typed(order.to_string(), xsd::NON_NEGATIVE_INTEGER),
            ));
        }
    }
}

fn property_triples(triples: &mut Vec<RdfTriple>, property: &PropertyDefinition) {
    let subject = || RdfNode::iri(property.iri.as_str());
    push_predicates(triples, &property.iri, &property.predicates);

    for superproperty in &property.subproperty_of {
        triples.push(RdfTriple::new(
            subject(),
            rdfs::SUB_PROPERTY_OF,
            RdfNode::iri(superproperty.as_str()),
        ));
    }
    if let Some(subject_type) = &property.subject_type {
        triples.push(RdfTriple::new(
            subject(),
            knora_base::SUBJECT_CLASS_CONSTRAINT,
            RdfNode::iri(subject_type.as_str()),
        ));
    }
    if let Some(object_type) = &property.object_type {
        triples.push(RdfTriple::new(
            subject(),
            knora_base::OBJECT_CLASS_CONSTRAINT,
            RdfNode::iri(object_type.as_str()),
        ));
    }
}

/// Full canonical serialization of an ontology graph
pub fn ontology_to_triples(ontology: &Ontology) -> Vec<RdfTriple> {
    let mut triples = metadata_triples(&ontology.metadata);
    for class in ontology.classes.values() {
        class_triples(&mut triples, class);
    }
    for property in ontology.properties.values() {
        property_triples(&mut triples, property);
    }
    triples
}

/// `(delete, insert)` turning `current` into `target`
pub fn diff_triples(current: &[RdfTriple], target: &[RdfTriple]) -> (Vec<RdfTriple>, Vec<RdfTriple>) {
    let current: BTreeSet<&RdfTriple> = current.iter().collect();
    let target: BTreeSet<&RdfTriple> = target.iter().collect();

    let delete = current.difference(&target).map(|t| (*t).clone()).collect();
    let insert = target.difference(&current).map(|t| (*t).clone()).collect();
    (delete, insert)
}

#[derive(Default)]
struct SubjectTriples<'a> {
    by_predicate: BTreeMap<&'a str, Vec<&'a RdfNode>>,
}

impl<'a> SubjectTriples<'a> {
    fn objects(&self, predicate: &str) -> &[&'a RdfNode] {
        self.by_predicate
            .get(predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn first_iri(&self, predicate: &str) -> Option<&'a str> {
        self.objects(predicate).iter().find_map(|node| node.as_iri())
    }

    fn first_value(&self, predicate: &str) -> Option<&'a str> {
        self.objects(predicate).iter().find_map(|node| node.literal_value())
    }

    fn has_type(&self, types: &[&str]) -> bool {
        self.objects(rdf::TYPE)
            .iter()
            .filter_map(|node| node.as_iri())
            .any(|t| types.contains(&t))
    }

    fn predicates_except(&self, excluded: &[&str]) -> Predicates {
        let mut predicates = Predicates::new();
        for (predicate, objects) in &self.by_predicate {
            if excluded.contains(predicate) {
                continue;
            }
            for object in objects {
                if let Some(literal) = node_to_literal(object) {
                    predicates.insert(SmartIri::from_trusted(predicate), literal);
                }
            }
        }
        predicates
    }
}

fn parse_restriction(class: &str, restriction: &SubjectTriples<'_>) -> Result<(SmartIri, CardinalityInfo)> {
    let property = restriction.first_iri(owl::ON_PROPERTY).ok_or_else(|| {
        OntoError::Inconsistency(format!("Restriction on <{}> has no owl:onProperty", class))
    })?;

    let (owl_predicate, raw) = [owl::CARDINALITY, owl::MIN_CARDINALITY, owl::MAX_CARDINALITY]
        .iter()
        .find_map(|p| restriction.first_value(p).map(|v| (*p, v)))
        .ok_or_else(|| {
            OntoError::Inconsistency(format!(
                "Restriction on <{}> for <{}> has no cardinality",
                class, property
            ))
        })?;
    let value: u32 = raw.parse().map_err(|_| {
        OntoError::Inconsistency(format!("Invalid cardinality '{}' on <{}>", raw, class))
    })?;
    let cardinality = Cardinality::from_owl(owl_predicate, value)
        .map_err(|e| OntoError::Inconsistency(format!("Class <{}>: {}", class, e)))?;
    let gui_order = restriction
        .first_value(salsah_gui::GUI_ORDER)
        .and_then(|v| v.parse().ok());

    Ok((
        SmartIri::from_trusted(property),
        CardinalityInfo {
            cardinality,
            gui_order,
        },
    ))
}

/// Rebuild an ontology from the triples of its named graph
pub fn ontology_from_triples(graph: &str, triples: &[RdfTriple]) -> Result<Ontology> {
    let mut subjects: HashMap<&RdfNode, SubjectTriples<'_>> = HashMap::new();
    for triple in triples {
        subjects
            .entry(&triple.subject)
            .or_default()
            .by_predicate
            .entry(triple.predicate.as_str())
            .or_default()
            .push(&triple.object);
    }

    let ontology_node = RdfNode::iri(graph);
    let ontology_subject = subjects
        .get(&ontology_node)
        .filter(|s| s.has_type(&[owl::ONTOLOGY]))
        .ok_or_else(|| {
            OntoError::Inconsistency(format!("Graph <{}> has no owl:Ontology resource", graph))
        })?;

    let ontology_iri = SmartIri::from_trusted(graph);
    let mut metadata = OntologyMetadata::new(ontology_iri.clone());
    metadata.label = ontology_subject.first_value(rdfs::LABEL).map(str::to_string);
    metadata.comment = ontology_subject.first_value(rdfs::COMMENT).map(str::to_string);
    metadata.project_iri = ontology_subject
        .first_iri(knora_base::ATTACHED_TO_PROJECT)
        .map(SmartIri::from_trusted);
    metadata.is_shared = ontology_iri.is_shared()
        || ontology_subject.first_value(knora_base::IS_SHARED) == Some("true");
    metadata.last_modification_date = ontology_subject
        .first_value(knora_base::LAST_MODIFICATION_DATE)
        .map(parse_timestamp)
        .transpose()?;

    let mut ontology = Ontology::empty(metadata);

    for (node, subject) in &subjects {
        let Some(iri) = node.as_iri() else {
            continue;
        };
        if iri == graph {
            continue;
        }

        if subject.has_type(&[owl::CLASS]) {
            let mut class = ClassDefinition {
                iri: SmartIri::from_trusted(iri),
                predicates: subject.predicates_except(&[rdfs::SUB_CLASS_OF]),
                subclass_of: BTreeSet::new(),
                direct_cardinalities: BTreeMap::new(),
            };
            for object in subject.objects(rdfs::SUB_CLASS_OF) {
                match object {
                    RdfNode::Iri(superclass) => {
                        class.subclass_of.insert(SmartIri::from_trusted(superclass));
                    }
                    RdfNode::Blank(_) => {
                        let restriction = subjects.get(*object).ok_or_else(|| {
                            OntoError::Inconsistency(format!(
                                "Dangling restriction {} on <{}>",
                                object, iri
                            ))
                        })?;
                        let (property, info) = parse_restriction(iri, restriction)?;
                        class.direct_cardinalities.insert(property, info);
                    }
                    _ => {}
                }
            }
            ontology.classes.insert(class.iri.clone(), class);
        } else if subject.has_type(PROPERTY_TYPES) {
            let property = PropertyDefinition {
                iri: SmartIri::from_trusted(iri),
                predicates: subject.predicates_except(&[
                    rdfs::SUB_PROPERTY_OF,
                    knora_base::SUBJECT_CLASS_CONSTRAINT,
                    knora_base::OBJECT_CLASS_CONSTRAINT,
                ]),
                subproperty_of: subject
                    .objects(rdfs::SUB_PROPERTY_OF)
                    .iter()
                    .filter_map(|node| node.as_iri())
                    .map(SmartIri::from_trusted)
                    .collect(),
                subject_type: subject
                    .first_iri(knora_base::SUBJECT_CLASS_CONSTRAINT)
                    .map(SmartIri::from_trusted),
                object_type: subject
                    .first_iri(knora_base::OBJECT_CLASS_CONSTRAINT)
                    .map(SmartIri::from_trusted),
            };
            ontology.properties.insert(property.iri.clone(), property);
        }
    }

    Ok(ontology)
}
