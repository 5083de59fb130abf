//! Ontology-level mutations

use std::collections::BTreeSet;

use tracing::Instrument;

use super::messages::{
    CanDoResponse, ChangeOntologyMetadataRequest, CreateOntologyRequest, OntologyTargetRequest,
    ReadOntologyMetadata, SuccessResponse,
};
use super::transaction::Commit;
use super::{log_dry_run, next_modification_date, OntologyResponder};
use crate::cache::OntologyCacheData;
use crate::entity::{Ontology, OntologyMetadata};
use crate::errors::{OntoError, Result, ValidationRule};
use crate::iri::{validate_ontology_name, SmartIri};
use crate::rbac::UserProfile;
use crate::validation::{guards, payload, rules, MutationPhase, MutationPipeline};

/// Entities outside `ontology` that name one of its entities
fn referenced_from_other_ontologies(snapshot: &OntologyCacheData, ontology: &Ontology) -> BTreeSet<SmartIri> {
    let own = |iri: &SmartIri| ontology.contains_entity(iri);
    let mut referencing = BTreeSet::new();
    for other in snapshot.ontologies().filter(|o| o.iri() != ontology.iri()) {
        for class in other.classes.values() {
            if class.subclass_of.iter().any(own) || class.direct_cardinalities.keys().any(own) {
                referencing.insert(class.iri.clone());
            }
        }
        for property in other.properties.values() {
            let uses = property.subproperty_of.iter().any(own)
                || property.subject_type.as_ref().map(own).unwrap_or(false)
                || property.object_type.as_ref().map(own).unwrap_or(false);
            if uses {
                referencing.insert(property.iri.clone());
            }
        }
    }
    referencing
}

impl OntologyResponder {
    pub async fn create_ontology(&self, request: CreateOntologyRequest, user: &UserProfile) -> Result<ReadOntologyMetadata> {
        let mut pipeline = MutationPipeline::new("create-ontology");
        let span = pipeline.span();
        let result = self.create_ontology_inner(&mut pipeline, request, user).instrument(span).await;
        pipeline.finish(result)
    }

    async fn create_ontology_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: CreateOntologyRequest,
        user: &UserProfile,
    ) -> Result<ReadOntologyMetadata> {
        validate_ontology_name(&request.ontology_name)?;
        payload::check_ontology_label(&request.label)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        self.authorize(pipeline, user, Some(&request.project_iri)).await?;

        rules::check_ontology_project(&self.config, &request.project_iri, request.is_shared)?;
        let project = self
            .projects
            .get_project(&request.project_iri)
            .await?
            .ok_or_else(|| OntoError::NotFound(format!("Project {} not found", request.project_iri)))?;
        let ontology_iri = if request.is_shared {
            SmartIri::shared_ontology(&request.ontology_name)
        } else {
            SmartIri::project_ontology(&project.shortcode, &request.ontology_name)?
        };

        let guard = self.lock_ontology(&ontology_iri).await?;
        let current = self.cache.snapshot().await;
        if current.ontology(&ontology_iri).is_some() {
            return Err(OntoError::bad_request(
                ValidationRule::Uniqueness,
                format!("Ontology {} already exists", ontology_iri),
            ));
        }
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let mut metadata = OntologyMetadata::new(ontology_iri.clone());
        metadata.project_iri = Some(request.project_iri);
        metadata.label = Some(request.label);
        metadata.comment = request.comment.filter(|c| !c.trim().is_empty());
        metadata.is_shared = request.is_shared;
        metadata.last_modification_date = Some(next_modification_date(None));

        let snapshot = self
            .commit(pipeline, guard, current, Commit::Replace(Ontology::empty(metadata)))
            .await?;
        ReadOntologyMetadata::single(&snapshot, &ontology_iri)
    }

    pub async fn change_ontology_metadata(
        &self,
        request: ChangeOntologyMetadataRequest,
        user: &UserProfile,
    ) -> Result<ReadOntologyMetadata> {
        let mut pipeline = MutationPipeline::new("change-ontology-metadata");
        let span = pipeline.span();
        let result = self
            .change_ontology_metadata_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn change_ontology_metadata_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: ChangeOntologyMetadataRequest,
        user: &UserProfile,
    ) -> Result<ReadOntologyMetadata> {
        if request.label.is_none() && request.comment.is_none() {
            return Err(OntoError::bad_request(
                ValidationRule::Syntax,
                "Nothing to change: give a label, a comment or both",
            ));
        }
        if let Some(label) = &request.label {
            payload::check_ontology_label(label)?;
        }
        if matches!(&request.comment, Some(c) if c.trim().is_empty()) {
            return Err(OntoError::bad_request(
                ValidationRule::RequiredMetadata,
                "Ontology comment may not be empty; delete it instead",
            ));
        }
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &request.ontology_iri, &request.last_modification_date)
            .await?;
        if let Some(label) = request.label {
            session.working.metadata.label = Some(label);
        }
        if let Some(comment) = request.comment {
            session.working.metadata.comment = Some(comment);
        }
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntologyMetadata::single(&snapshot, &request.ontology_iri)
    }

    /// Removing an absent comment changes nothing and keeps the date
    pub async fn delete_ontology_comment(
        &self,
        request: OntologyTargetRequest,
        user: &UserProfile,
    ) -> Result<ReadOntologyMetadata> {
        let mut pipeline = MutationPipeline::new("delete-ontology-comment");
        let span = pipeline.span();
        let result = self
            .delete_ontology_comment_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn delete_ontology_comment_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: OntologyTargetRequest,
        user: &UserProfile,
    ) -> Result<ReadOntologyMetadata> {
        pipeline.advance(MutationPhase::SyntaxChecked)?;
        let mut session = self
            .begin_edit(pipeline, user, &request.ontology_iri, &request.last_modification_date)
            .await?;
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        if session.working.metadata.comment.take().is_none() {
            return ReadOntologyMetadata::single(&session.current, &request.ontology_iri);
        }
        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntologyMetadata::single(&snapshot, &request.ontology_iri)
    }

    pub async fn delete_ontology(&self, request: OntologyTargetRequest, user: &UserProfile) -> Result<SuccessResponse> {
        let mut pipeline = MutationPipeline::new("delete-ontology");
        let span = pipeline.span();
        let result = self.delete_ontology_inner(&mut pipeline, request, user).instrument(span).await;
        pipeline.finish(result)
    }

    async fn delete_ontology_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: OntologyTargetRequest,
        user: &UserProfile,
    ) -> Result<SuccessResponse> {
        pipeline.advance(MutationPhase::SyntaxChecked)?;
        let session = self
            .begin_edit(pipeline, user, &request.ontology_iri, &request.last_modification_date)
            .await?;
        self.check_ontology_deletable(&session.current, &session.working).await?;
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let iri = session.ontology_iri().clone();
        self.commit(pipeline, session.guard, session.current, Commit::Drop(iri.clone()))
            .await?;
        Ok(SuccessResponse::new(format!("Ontology {} has been deleted", iri)))
    }

    /// Dry run of `delete_ontology`; needs no modification date
    pub async fn can_delete_ontology(&self, ontology_iri: &SmartIri, user: &UserProfile) -> Result<CanDoResponse> {
        if let Err(e) = rules::check_not_built_in(ontology_iri) {
            return CanDoResponse::from_check(Err(e));
        }
        let current = self.begin_inspection(user, ontology_iri).await?;
        let ontology = current
            .ontology(ontology_iri)
            .ok_or_else(|| OntoError::NotFound(format!("Ontology {} not found", ontology_iri)))?;
        let response = CanDoResponse::from_check(self.check_ontology_deletable(&current, ontology).await)?;
        log_dry_run("can-delete-ontology", ontology_iri, &response);
        Ok(response)
    }

    /// Nothing in another ontology or in data may use its entities
    async fn check_ontology_deletable(&self, snapshot: &OntologyCacheData, ontology: &Ontology) -> Result<()> {
        let entities: Vec<SmartIri> = ontology.entity_iris().cloned().collect();
        let mut users = referenced_from_other_ontologies(snapshot, ontology);
        users.extend(
            guards::referencing_subjects(self.cache.triplestore().as_ref(), &entities, ontology.iri()).await?,
        );
        if users.is_empty() {
            return Ok(());
        }
        Err(OntoError::bad_request(
            ValidationRule::DeletionGuard,
            format!(
                "Ontology {} cannot be deleted, its entities are used by: {}",
                ontology.iri(),
                users.iter().map(|u| u.to_string()).collect::<Vec<_>>().join(", ")
            ),
        ))
    }
}
