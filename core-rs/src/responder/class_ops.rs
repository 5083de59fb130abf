//! Class mutations and the cardinality family

use std::collections::BTreeMap;

use tracing::{debug, Instrument};

use super::messages::{
    CanDoResponse, ChangeEntityTextRequest, ChangeGuiOrderRequest, ClassCardinalitiesRequest,
    CreateClassRequest, EntityTargetRequest, ReadOntology, ReadOntologyMetadata,
};
use super::{log_dry_run, with_link_value_cardinalities, EditSession, OntologyResponder};
use crate::entity::{CardinalityInfo, ClassDefinition, PropertyKind};
use crate::errors::{OntoError, Result, ValidationRule};
use crate::iri::vocabulary::rdfs;
use crate::iri::SmartIri;
use crate::rbac::UserProfile;
use crate::validation::{guards, payload, rules, MutationPhase, MutationPipeline, RuleContext};

fn class_not_found(class: &SmartIri) -> OntoError {
    OntoError::NotFound(format!("Class {} not found", class))
}

fn require_cardinalities(request: &ClassCardinalitiesRequest) -> Result<()> {
    if request.cardinalities.is_empty() {
        return Err(OntoError::bad_request(
            ValidationRule::Syntax,
            format!("No cardinalities given for {}", request.class_iri),
        ));
    }
    Ok(())
}

fn working_class<'s>(session: &'s mut EditSession, class: &SmartIri) -> Result<&'s mut ClassDefinition> {
    session
        .working
        .classes
        .get_mut(class)
        .ok_or_else(|| class_not_found(class))
}

impl OntologyResponder {
    pub async fn create_class(&self, request: CreateClassRequest, user: &UserProfile) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("create-class");
        let span = pipeline.span();
        let result = self.create_class_inner(&mut pipeline, request, user).instrument(span).await;
        pipeline.finish(result)
    }

    async fn create_class_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: CreateClassRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let mut class = request.class;
        let ontology_iri = payload::check_entity_iri(&class.iri)?;
        payload::check_class_rdf_type(&class)?;
        payload::check_localized_metadata(&class.iri, &class.predicates)?;
        payload::check_has_superclass(&class)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        rules::check_entity_iri_unused(&session.current, &session.working, &class.iri)?;

        let class_iri = class.iri.clone();
        let submitted = std::mem::take(&mut class.direct_cardinalities);
        class.direct_cardinalities = with_link_value_cardinalities(&session.current, &submitted);
        session.working.classes.insert(class_iri.clone(), class);

        let candidate = rules::candidate_snapshot(&session.current, session.working.clone())?;
        let context = RuleContext::new(&candidate, &self.config);
        context.check_superclasses(&class_iri)?;
        context.check_cardinality_targets(&class_iri, &submitted)?;
        context.check_cardinality_overrides(&class_iri)?;
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[class_iri], &[])
    }

    pub async fn add_cardinalities(&self, request: ClassCardinalitiesRequest, user: &UserProfile) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("add-cardinalities");
        let span = pipeline.span();
        let result = self.add_cardinalities_inner(&mut pipeline, request, user).instrument(span).await;
        pipeline.finish(result)
    }

    async fn add_cardinalities_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: ClassCardinalitiesRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        require_cardinalities(&request)?;
        let ontology_iri = payload::check_entity_iri(&request.class_iri)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        let class_iri = &request.class_iri;
        let additions = with_link_value_cardinalities(&session.current, &request.cardinalities);
        let class = working_class(&mut session, class_iri)?;
        if let Some(existing) = request
            .cardinalities
            .keys()
            .find(|p| class.direct_cardinalities.contains_key(*p))
        {
            return Err(OntoError::bad_request(
                ValidationRule::CardinalityLegality,
                format!("{} already has a cardinality on {}", class_iri, existing),
            ));
        }
        class.direct_cardinalities.extend(additions);

        let candidate = rules::candidate_snapshot(&session.current, session.working.clone())?;
        let context = RuleContext::new(&candidate, &self.config);
        context.check_cardinality_targets(class_iri, &request.cardinalities)?;
        context.check_cardinality_overrides(class_iri)?;

        let triplestore = self.cache.triplestore();
        for (property, info) in &request.cardinalities {
            let inherited = session
                .current
                .class(class_iri)
                .and_then(|c| c.all_cardinalities.get(property))
                .map(|c| c.cardinality);
            guards::check_cardinality_change(
                triplestore.as_ref(),
                &candidate,
                class_iri,
                property,
                inherited,
                info.cardinality,
            )
            .await?;
        }
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[request.class_iri], &[])
    }

    /// Replace all of a class's own cardinalities with the given set
    pub async fn replace_cardinalities(
        &self,
        request: ClassCardinalitiesRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("replace-cardinalities");
        let span = pipeline.span();
        let result = self
            .replace_cardinalities_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn replace_cardinalities_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: ClassCardinalitiesRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let ontology_iri = payload::check_entity_iri(&request.class_iri)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        let class_iri = &request.class_iri;
        let triplestore = self.cache.triplestore();

        // Link values follow their link property and are not listed by clients
        let current = session.current.clone();
        let existing: BTreeMap<SmartIri, CardinalityInfo> = working_class(&mut session, class_iri)?
            .direct_cardinalities
            .iter()
            .filter(|(p, _)| !current.property(p).map(|info| info.kind.is_link_value()).unwrap_or(false))
            .map(|(p, info)| (p.clone(), *info))
            .collect();

        for property in existing.keys().filter(|p| !request.cardinalities.contains_key(*p)) {
            guards::check_cardinality_removable(triplestore.as_ref(), &session.current, class_iri, property).await?;
        }

        let replacement = with_link_value_cardinalities(&session.current, &request.cardinalities);
        working_class(&mut session, class_iri)?.direct_cardinalities = replacement;

        let candidate = rules::candidate_snapshot(&session.current, session.working.clone())?;
        let context = RuleContext::new(&candidate, &self.config);
        context.check_cardinality_targets(class_iri, &request.cardinalities)?;
        context.check_cardinality_overrides(class_iri)?;

        for (property, info) in &request.cardinalities {
            let previous = existing.get(property).map(|c| c.cardinality).or_else(|| {
                session
                    .current
                    .class(class_iri)
                    .and_then(|c| c.all_cardinalities.get(property))
                    .map(|c| c.cardinality)
            });
            guards::check_cardinality_change(
                triplestore.as_ref(),
                &candidate,
                class_iri,
                property,
                previous,
                info.cardinality,
            )
            .await?;
        }
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[request.class_iri], &[])
    }

    pub async fn delete_cardinalities(
        &self,
        request: ClassCardinalitiesRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("delete-cardinalities");
        let span = pipeline.span();
        let result = self
            .delete_cardinalities_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn delete_cardinalities_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: ClassCardinalitiesRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        require_cardinalities(&request)?;
        let ontology_iri = payload::check_entity_iri(&request.class_iri)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        self.plan_cardinality_removal(&mut session, &request.class_iri, &request.cardinalities)
            .await?;
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[request.class_iri], &[])
    }

    /// Dry run of `delete_cardinalities`, with the same date check
    pub async fn can_delete_cardinalities(
        &self,
        request: ClassCardinalitiesRequest,
        user: &UserProfile,
    ) -> Result<CanDoResponse> {
        let mut pipeline = MutationPipeline::new("can-delete-cardinalities");
        let span = pipeline.span();
        let result = self
            .can_delete_cardinalities_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn can_delete_cardinalities_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: ClassCardinalitiesRequest,
        user: &UserProfile,
    ) -> Result<CanDoResponse> {
        require_cardinalities(&request)?;
        let ontology_iri = payload::check_entity_iri(&request.class_iri)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        let outcome = self
            .plan_cardinality_removal(&mut session, &request.class_iri, &request.cardinalities)
            .await;
        let response = CanDoResponse::from_check(outcome)?;
        log_dry_run("can-delete-cardinalities", &request.class_iri, &response);
        Ok(response)
    }

    /// Apply the removal to the working copy if it is allowed
    async fn plan_cardinality_removal(
        &self,
        session: &mut EditSession,
        class_iri: &SmartIri,
        cardinalities: &BTreeMap<SmartIri, CardinalityInfo>,
    ) -> Result<()> {
        if !session.working.classes.contains_key(class_iri) {
            return Err(class_not_found(class_iri));
        }
        let declared = session
            .current
            .class(class_iri)
            .ok_or_else(|| class_not_found(class_iri))?
            .clone();
        let triplestore = self.cache.triplestore();

        let mut removed = Vec::new();
        for (property, info) in cardinalities {
            let kind = session.current.property(property).map(|p| p.kind.clone());
            if let Some(PropertyKind::LinkValue { link_property }) = &kind {
                return Err(OntoError::bad_request(
                    ValidationRule::CardinalityRemoval,
                    format!("{} is removed together with its link property {}", property, link_property),
                ));
            }
            guards::check_cardinality_removable(triplestore.as_ref(), &session.current, class_iri, property).await?;

            let current = declared.definition.direct_cardinalities.get(property).map(|c| c.cardinality);
            if current != Some(info.cardinality) {
                return Err(OntoError::bad_request(
                    ValidationRule::CardinalityRemoval,
                    format!(
                        "{} has no cardinality {} on {}",
                        class_iri, info.cardinality, property
                    ),
                ));
            }
            removed.push(property.clone());
            if let Some(PropertyKind::Link { link_value_property }) = kind {
                removed.push(link_value_property);
            }
        }

        let class = working_class(session, class_iri)?;
        for property in &removed {
            class.direct_cardinalities.remove(property);
        }
        debug!(class = %class_iri, removed = removed.len(), "Cardinalities removable");

        let candidate = rules::candidate_snapshot(&session.current, session.working.clone())?;
        RuleContext::new(&candidate, &self.config).check_cardinality_overrides(class_iri)
    }

    pub async fn change_class_labels_or_comments(
        &self,
        request: ChangeEntityTextRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("change-class-labels-or-comments");
        let span = pipeline.span();
        let result = self
            .change_class_labels_or_comments_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn change_class_labels_or_comments_inner(
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
        working_class(&mut session, &request.entity_iri)?
            .predicates
            .set(SmartIri::from_trusted(predicate), request.objects);
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[request.entity_iri], &[])
    }

    pub async fn delete_class_comment(&self, request: EntityTargetRequest, user: &UserProfile) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("delete-class-comment");
        let span = pipeline.span();
        let result = self
            .delete_class_comment_inner(&mut pipeline, request, user)
            .instrument(span)
            .await;
        pipeline.finish(result)
    }

    async fn delete_class_comment_inner(
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
        let removed = working_class(&mut session, &request.entity_iri)?
            .predicates
            .remove(rdfs::COMMENT)
            .is_some();
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = if removed {
            self.finish_edit(pipeline, session).await?
        } else {
            session.current
        };
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[request.entity_iri], &[])
    }

    pub async fn delete_class(&self, request: EntityTargetRequest, user: &UserProfile) -> Result<ReadOntologyMetadata> {
        let mut pipeline = MutationPipeline::new("delete-class");
        let span = pipeline.span();
        let result = self.delete_class_inner(&mut pipeline, request, user).instrument(span).await;
        pipeline.finish(result)
    }

    async fn delete_class_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: EntityTargetRequest,
        user: &UserProfile,
    ) -> Result<ReadOntologyMetadata> {
        let class_iri = &request.entity_iri;
        let ontology_iri = payload::check_entity_iri(class_iri)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        if session.working.classes.remove(class_iri).is_none() {
            return Err(class_not_found(class_iri));
        }
        self.check_class_deletable(&session, class_iri).await?;
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntologyMetadata::single(&snapshot, &ontology_iri)
    }

    /// Dry run of `delete_class`; needs no modification date
    pub async fn can_delete_class(&self, class_iri: &SmartIri, user: &UserProfile) -> Result<CanDoResponse> {
        let ontology_iri = match payload::check_entity_iri(class_iri) {
            Ok(iri) => iri,
            Err(e) => return CanDoResponse::from_check(Err(e)),
        };
        let current = self.begin_inspection(user, &ontology_iri).await?;
        if current.ontology_of(class_iri) != Some(&ontology_iri) || !current.is_class(class_iri) {
            return Err(class_not_found(class_iri));
        }
        let outcome = match rules::check_class_deletable(&current, class_iri) {
            Ok(()) => {
                guards::check_not_referenced(
                    self.cache.triplestore().as_ref(),
                    std::slice::from_ref(class_iri),
                    &ontology_iri,
                    &class_iri.to_string(),
                )
                .await
            }
            Err(e) => Err(e),
        };
        let response = CanDoResponse::from_check(outcome)?;
        log_dry_run("can-delete-class", class_iri, &response);
        Ok(response)
    }

    async fn check_class_deletable(&self, session: &EditSession, class_iri: &SmartIri) -> Result<()> {
        rules::check_class_deletable(&session.current, class_iri)?;
        guards::check_not_referenced(
            self.cache.triplestore().as_ref(),
            std::slice::from_ref(class_iri),
            session.ontology_iri(),
            &class_iri.to_string(),
        )
        .await
    }

    pub async fn change_gui_order(&self, request: ChangeGuiOrderRequest, user: &UserProfile) -> Result<ReadOntology> {
        let mut pipeline = MutationPipeline::new("change-gui-order");
        let span = pipeline.span();
        let result = self.change_gui_order_inner(&mut pipeline, request, user).instrument(span).await;
        pipeline.finish(result)
    }

    async fn change_gui_order_inner(
        &self,
        pipeline: &mut MutationPipeline,
        request: ChangeGuiOrderRequest,
        user: &UserProfile,
    ) -> Result<ReadOntology> {
        if request.gui_orders.is_empty() {
            return Err(OntoError::bad_request(
                ValidationRule::Syntax,
                format!("No GUI orders given for {}", request.class_iri),
            ));
        }
        let ontology_iri = payload::check_entity_iri(&request.class_iri)?;
        pipeline.advance(MutationPhase::SyntaxChecked)?;

        let mut session = self
            .begin_edit(pipeline, user, &ontology_iri, &request.last_modification_date)
            .await?;
        let link_values: BTreeMap<SmartIri, SmartIri> = request
            .gui_orders
            .keys()
            .filter_map(|p| match session.current.property(p).map(|info| &info.kind) {
                Some(PropertyKind::Link { link_value_property }) => Some((p.clone(), link_value_property.clone())),
                _ => None,
            })
            .collect();

        let class = working_class(&mut session, &request.class_iri)?;
        for (property, order) in &request.gui_orders {
            let info = class.direct_cardinalities.get_mut(property).ok_or_else(|| {
                OntoError::bad_request(
                    ValidationRule::CardinalityLegality,
                    format!("{} has no cardinality on {}", request.class_iri, property),
                )
            })?;
            info.gui_order = Some(*order);
            if let Some(shadow) = link_values
                .get(property)
                .and_then(|lv| class.direct_cardinalities.get_mut(lv))
            {
                shadow.gui_order = Some(*order);
            }
        }
        pipeline.advance(MutationPhase::StructurallyValidated)?;

        let snapshot = self.finish_edit(pipeline, session).await?;
        ReadOntology::from_snapshot(&snapshot, &ontology_iri, &[request.class_iri], &[])
    }
}
