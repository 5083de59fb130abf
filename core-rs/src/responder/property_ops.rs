//! Property mutations
//!
//! A link property never exists alone: creating one also creates its
//! link value property, and text changes and deletion carry over to it.

use std::collections::BTreeSet;

use tracing::{debug, Instrument};

use super::messages::{
    CanDoResponse, ChangeEntityTextRequest, ChangeGuiElementRequest, CreatePropertyRequest,
    EntityTargetRequest, ReadOntology, ReadOntologyMetadata,
};
use super::{log_dry_run, EditSession, OntologyResponder};
use crate::cache::OntologyCacheData;
use crate::entity::{Literal, Predicates, PropertyDefinition, PropertyKind};
use crate::errors::{OntoError, Result, ValidationRule};
use crate::iri::vocabulary::{knora_base, owl, rdf, rdfs, salsah_gui};
use crate::iri::SmartIri;
use crate::rbac::UserProfile;
use crate::validation::{guards, payload, rules, MutationPhase, MutationPipeline, RuleContext};

fn property_not_found(property: &SmartIri) -> OntoError {
    OntoError::NotFound(format!("Property {} not found", property))
}

/// Definition of the link value property that shadows `link`
fn link_value_definition(snapshot: &OntologyCacheData, link: &PropertyDefinition, iri: SmartIri) -> PropertyDefinition {
    let mut predicates = Predicates::new().with(rdf::TYPE, Literal::iri(owl::OBJECT_PROPERTY));
    for predicate in [rdfs::LABEL, rdfs::COMMENT] {
        if let Some(objects) = link.predicates.get(predicate) {
            predicates.set(SmartIri::from_trusted(predicate), objects.clone());
        }
    }
    let subproperty_of = link
        .subproperty_of
        .iter()
        .filter_map(|base| match snapshot.property(base).map(|p| &p.kind) {
            Some(PropertyKind::Link { link_value_property }) => Some(link_value_property.clone()),
            _ => None,
        })
        .collect();

    PropertyDefinition {
        iri,
        predicates,
        subproperty_of,
        subject_type: link.subject_type.clone(),
        object_type: Some(SmartIri::from_trusted(knora_base::LINK_VALUE)),
    }
}

/// The property and, for a link, its link value; link values themselves
/// are only changed through their link property
fn editable_targets(snapshot: &OntologyCacheData, property: &SmartIri) -> Result<Vec<SmartIri>> {
    let info = snapshot.property(property).ok_or_else(|| property_not_found(property))?;
    match &info.kind {
        PropertyKind::LinkValue { link_property } => Err(OntoError::bad_request(
            ValidationRule::PropertyTaxonomy,
            format!("{} can only be changed through its link property {}", property, link_property),
        )),
        PropertyKind::Link { link_value_property } => Ok(vec![property.clone(), link_value_property.clone()]),
        _ => Ok(vec![property.clone()]),
    }
}

fn working_property<'s>(session: &'s mut EditSession, property: &SmartIri) -> Result<&'s mut PropertyDefinition> {
    session
        .working
        .properties
        .get_mut(property)
        .ok_or_else(|| property_not_found(property))
}

impl OntologyResponder {
    pub async fn create_property(&self, request: CreatePropertyRequest, user: &UserProfile) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("create-property");
        let span = pipeline.span();
        let result = self.create_property_inner(&mut pipeline, request, user).instrument(span).await;
        pipeline.finish(result)
    }

    async fn create_property_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: CreatePropertyRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let property = request.property;
        let ontology_iri = payload::check_entity_iri(&property.iri)?;
        payload::check_property_rdf_type(&property)?;
        payload::check_localized_metadata(&property.iri, &property.predicates)?;
        payload::check_has_superproperty(&property)?;
        if let Some(element) = property.gui_element() {
            check_gui_element(element)?;
        }
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        let property_iri = property.iri.clone();
        rules::check_entity_iri_unused(&session.current, &session.working, &property_iri)?;
        session.working.properties.insert(property_iri.clone(), property.clone());

        let candidate = rules::candidate_snapshot(&session.current, session.working.clone())?;
        RuleContext::new(&candidate, &self.config).check_property(&property_iri)?;

        let mut created = vec![property_iri.clone()];
        if let Some(PropertyKind::Link { link_value_property }) = candidate.property(&property_iri).map(|p| &p.kind) {
            rules::check_entity_iri_unused(&session.current, &session.working, link_value_property)?;
            let shadow = link_value_definition(&candidate, &property, link_value_property.clone());
            debug!(link = %property_iri, link_value = %shadow.iri, "Adding link value property");
            created.push(shadow.iri.clone());
            session.working.properties.insert(shadow.iri.clone(), shadow);
            rules::candidate_snapshot(&session.current, session.working.clone())?;
        }
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[], &created)
    }

    pub async fn change_property_labels_or_comments(
        &self,
        request: ChangeEntityTextRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("change-property-labels-or-comments");
        let span = pipeline.span();
        let result = self
            .change_property_labels_or_comments_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn change_property_labels_or_comments_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: ChangeEntityTextRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let predicate = request.predicate.iri();
        payload::check_lang_strings(&request.entity_iri, predicate, &request.objects)?;
        let ontology_iri = payload::check_entity_iri(&request.entity_iri)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        let targets = editable_targets(&session.current, &request.entity_iri)?;
        for target in &targets {
            working_property(&mut session, target)?
                .predicates
                .set(SmartIri::from_trusted(predicate), request.objects.clone());
        }
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[], &[request.entity_iri])
    }

    pub async fn delete_property_comment(&self, request: EntityTargetRequest, user: &UserProfile) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("delete-property-comment");
        let span = pipeline.span();
        let result = self
            .delete_property_comment_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn delete_property_comment_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: EntityTargetRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let ontology_iri = payload::check_entity_iri(&request.entity_iri)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        let targets = editable_targets(&session.current, &request.entity_iri)?;
        let mut removed = false;
        for target in &targets {
            removed |= working_property(&mut session, target)?
                .predicates
                .remove(rdfs::COMMENT)
                .is_some();
        }
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = if removed {
            self.finish_edit(pipeline, session).await?
        } else {
            session.current
        };
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[], &[request.entity_iri])
    }

    pub async fn delete_property(&self, request: EntityTargetRequest, user: &UserProfile) -> Result<ReadOntologyMetadata> {
        let mut pipeline = MutationPipeline::new("delete-property");
        let span = pipeline.span();
        let result = self.delete_property_inner(&mut pipeline, request, user).instrument(span).await;
        pipeline.finish(result)
    }

    async fn delete_property_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: EntityTargetRequest,
        user: &UserProfile,
    ) -> Result<ReadOntologyMetadata> {
        let property_iri = &request.entity_iri;
        let ontology_iri = payload::check_entity_iri(property_iri)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        if !session.working.properties.contains_key(property_iri) {
            return Err(property_not_found(property_iri));
        }
        let targets = self.check_property_deletable(&session.current, &ontology_iri, property_iri).await?;
        for target in &targets {
            session.working.properties.remove(target);
        }
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntologyMetadata::single(&snapshot, &ontology_iri)
    }

    /// Dry run of `delete_property`; needs no modification date
    pub async fn can_delete_property(&self, property_iri: &SmartIri, user: &UserProfile) -> Result<CanDoResponse> {
        let ontology_iri = match payload::check_entity_iri(property_iri) {
            Ok(iri) => iri,
            Err(e) => return CanDoResponse::from_check(Err(e)),
        };
        let current = self.begin_inspection(user, &ontology_iri).await?;
        if current.ontology_of(property_iri) != Some(&ontology_iri) {
            return Err(property_not_found(property_iri));
        }
        let outcome = self
            .check_property_deletable(&current, &ontology_iri, property_iri)
            .await
            .map(|_| ());
        let response = CanDoResponse::from_check(outcome)?;
        log_dry_run("can-delete-property", property_iri, &response);
        Ok(response)
    }

    /// Returns the properties to remove: the property and its link value
    async fn check_property_deletable(
        &self,
        snapshot: &OntologyCacheData,
        ontology_iri: &SmartIri,
        property_iri: &SmartIri,
    ) -> Result<Vec<SmartIri>> {
        let info = snapshot.property(property_iri).ok_or_else(|| property_not_found(property_iri))?;
        rules::check_property_deletable(snapshot, info)?;

        let mut targets = vec![property_iri.clone()];
        if let PropertyKind::Link { link_value_property } = &info.kind {
            targets.push(link_value_property.clone());
        }
        guards::check_not_referenced(
            self.cache.triplestore().as_ref(),
            &targets,
            ontology_iri,
            &property_iri.to_string(),
        )
        .await?;
        Ok(targets)
    }

    pub async fn change_property_gui_element(
        &self,
        request: ChangeGuiElementRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("change-property-gui-element");
        let span = pipeline.span();
        let result = self
            .change_property_gui_element_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn change_property_gui_element_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: ChangeGuiElementRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let ontology_iri = payload::check_entity_iri(&request.property_iri)?;
        match &request.gui_element {
            Some(element) => check_gui_element(element)?,
            None if !request.gui_attributes.is_empty() => {
                return Err(OntoError::bad_request(
                    ValidationRule::Syntax,
                    "GUI attributes need a GUI element",
                ))
            }
            None => {}
        }
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        if let Some(PropertyKind::LinkValue { link_property }) =
            session.current.property(&request.property_iri).map(|p| &p.kind)
        {
            return Err(OntoError::bad_request(
                ValidationRule::PropertyTaxonomy,
                format!("{} has no GUI element of its own, change {}", request.property_iri, link_property),
            ));
        }

        let element: BTreeSet<Literal> = request
            .gui_element
            .iter()
            .map(|e| Literal::Iri(e.clone()))
            .collect();
        let attributes: BTreeSet<Literal> = request
            .gui_attributes
            .iter()
            .map(|a| Literal::String(a.clone()))
            .collect();
        let property = working_property(&mut session, &request.property_iri)?;
        property.predicates.set(SmartIri::from_trusted(salsah_gui::GUI_ELEMENT), element);
        property.predicates.set(SmartIri::from_trusted(salsah_gui::GUI_ATTRIBUTE), attributes);
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[], &[request.property_iri])
    }
}

fn check_gui_element(element: &SmartIri) -> Result<()> {
    if element.ontology_iri().map(|o| o.as_str() == salsah_gui::ONTOLOGY).unwrap_or(false) {
        return Ok(());
    }
    Err(OntoError::bad_request(
        ValidationRule::Syntax,
        format!("{} is not a salsah-gui GUI element", element),
    ))
}
