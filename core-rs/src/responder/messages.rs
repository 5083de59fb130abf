//! Request and response shapes of the ontology responder

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::OntologyCacheData;
use crate::entity::{
    CardinalityInfo, ClassDefinition, ClassInfo, Literal, OntologyMetadata, PropertyDefinition,
    PropertyInfo,
};
use crate::errors::{OntoError, Result};
use crate::iri::vocabulary::rdfs;
use crate::iri::SmartIri;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOntologyRequest {
    pub ontology_name: String,
    pub project_iri: SmartIri,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_shared: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeOntologyMetadataRequest {
    pub ontology_iri: SmartIri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub last_modification_date: DateTime<Utc>,
}

/// Delete an ontology or its comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyTargetRequest {
    pub ontology_iri: SmartIri,
    pub last_modification_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    pub class: ClassDefinition,
    pub last_modification_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub property: PropertyDefinition,
    pub last_modification_date: DateTime<Utc>,
}

/// Add, replace, delete or dry-run delete of class cardinalities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCardinalitiesRequest {
    pub class_iri: SmartIri,
    #[serde(default)]
    pub cardinalities: BTreeMap<SmartIri, CardinalityInfo>,
    pub last_modification_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextPredicate {
    Label,
    Comment,
}

impl TextPredicate {
    pub const fn iri(&self) -> &'static str {
        match self {
            Self::Label => rdfs::LABEL,
            Self::Comment => rdfs::COMMENT,
        }
    }
}

/// Replace all labels or all comments of a class or property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntityTextRequest {
    pub entity_iri: SmartIri,
    pub predicate: TextPredicate,
    pub objects: BTreeSet<Literal>,
    pub last_modification_date: DateTime<Utc>,
}

/// Delete a class, a property, or the comment of either
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTargetRequest {
    pub entity_iri: SmartIri,
    pub last_modification_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeGuiOrderRequest {
    pub class_iri: SmartIri,
    pub gui_orders: BTreeMap<SmartIri, i32>,
    pub last_modification_date: DateTime<Utc>,
}

/// Set or clear salsah-gui:guiElement and salsah-gui:guiAttribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeGuiElementRequest {
    pub property_iri: SmartIri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gui_element: Option<SmartIri>,
    #[serde(default)]
    pub gui_attributes: BTreeSet<String>,
    pub last_modification_date: DateTime<Utc>,
}

/// Every mutation the responder accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "request", rename_all = "kebab-case")]
pub enum OntologyMutation {
    CreateOntology(CreateOntologyRequest),
    ChangeOntologyMetadata(ChangeOntologyMetadataRequest),
    DeleteOntologyComment(OntologyTargetRequest),
    DeleteOntology(OntologyTargetRequest),
    CreateClass(CreateClassRequest),
    CreateProperty(CreatePropertyRequest),
    AddCardinalities(ClassCardinalitiesRequest),
    ReplaceCardinalities(ClassCardinalitiesRequest),
    DeleteCardinalities(ClassCardinalitiesRequest),
    ChangeClassLabelsOrComments(ChangeEntityTextRequest),
    ChangePropertyLabelsOrComments(ChangeEntityTextRequest),
    DeleteClassComment(EntityTargetRequest),
    DeletePropertyComment(EntityTargetRequest),
    DeleteClass(EntityTargetRequest),
    DeleteProperty(EntityTargetRequest),
    ChangeGuiOrder(ChangeGuiOrderRequest),
    ChangePropertyGuiElement(ChangeGuiElementRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOntologyMetadata {
    pub ontologies: Vec<OntologyMetadata>,
}

impl ReadOntologyMetadata {
    pub(crate) fn single(snapshot: &OntologyCacheData, ontology_iri: &SmartIri) -> Result<Self> {
        let ontology = snapshot
            .ontology(ontology_iri)
            .ok_or_else(|| OntoError::NotFound(format!("Ontology {} not found", ontology_iri)))?;
        Ok(Self {
            ontologies: vec![ontology.metadata.clone()],
        })
    }

    /// The single record of a one-ontology response
    pub fn only(&self) -> Option<&OntologyMetadata> {
        match self.ontologies.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// An ontology's metadata with some or all of its entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOntology {
    pub metadata: OntologyMetadata,
    pub classes: BTreeMap<SmartIri, ClassInfo>,
    pub properties: BTreeMap<SmartIri, PropertyInfo>,
}

impl ReadOntology {
    pub(crate) fn from_snapshot(
        snapshot: &OntologyCacheData,
        ontology_iri: &SmartIri,
        classes: &[SmartIri],
        properties: &[SmartIri],
    ) -> Result<Self> {
        let ontology = snapshot
            .ontology(ontology_iri)
            .ok_or_else(|| OntoError::NotFound(format!("Ontology {} not found", ontology_iri)))?;
        let entities = ReadEntities::from_snapshot(snapshot, classes, properties)?;
        Ok(Self {
            metadata: ontology.metadata.clone(),
            classes: entities.classes,
            properties: entities.properties,
        })
    }

    pub(crate) fn full(snapshot: &OntologyCacheData, ontology_iri: &SmartIri) -> Result<Self> {
        let ontology = snapshot
            .ontology(ontology_iri)
            .ok_or_else(|| OntoError::NotFound(format!("Ontology {} not found", ontology_iri)))?;
        let classes: Vec<SmartIri> = ontology.classes.keys().cloned().collect();
        let properties: Vec<SmartIri> = ontology.properties.keys().cloned().collect();
        Self::from_snapshot(snapshot, ontology_iri, &classes, &properties)
    }

    pub fn last_modification_date(&self) -> Option<DateTime<Utc>> {
        self.metadata.last_modification_date
    }
}

/// Classes and properties looked up by IRI, possibly from several ontologies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadEntities {
    pub classes: BTreeMap<SmartIri, ClassInfo>,
    pub properties: BTreeMap<SmartIri, PropertyInfo>,
}

impl ReadEntities {
    pub(crate) fn from_snapshot(
        snapshot: &OntologyCacheData,
        classes: &[SmartIri],
        properties: &[SmartIri],
    ) -> Result<Self> {
        let mut entities = Self::default();
        for iri in classes {
            let info = snapshot
                .class(iri)
                .ok_or_else(|| OntoError::NotFound(format!("Class {} not found", iri)))?;
            entities.classes.insert(iri.clone(), (**info).clone());
        }
        for iri in properties {
            let info = snapshot
                .property(iri)
                .ok_or_else(|| OntoError::NotFound(format!("Property {} not found", iri)))?;
            entities.properties.insert(iri.clone(), (**info).clone());
        }
        Ok(entities)
    }
}

/// Outcome of a dry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanDoResponse {
    pub can_do: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CanDoResponse {
    /// A structural rejection becomes `can_do: false`; other errors propagate
    pub(crate) fn from_check(result: Result<()>) -> Result<Self> {
        match result {
            Ok(()) => Ok(Self {
                can_do: true,
                reason: None,
            }),
            Err(e @ OntoError::BadRequest { .. }) => Ok(Self {
                can_do: false,
                reason: Some(e.to_string()),
            }),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MutationResponse {
    Metadata(ReadOntologyMetadata),
    Ontology(ReadOntology),
    Success(SuccessResponse),
}
