//! Ontology responder
//!
//! Entry point for every read and mutation. Mutations run through a
//! [`MutationPipeline`]: payload checks, authorization, structural rules on
//! a candidate snapshot, then one persist-and-publish step. Mutations on
//! the same ontology are serialized; different ontologies are validated in
//! parallel and refused at commit if a related ontology was published in
//! the meantime. Readers only ever see published snapshots.

mod class_ops;
pub mod messages;
mod ontology_ops;
mod property_ops;
mod transaction;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, Instrument, Span};

use crate::cache::{OntologyCache, OntologyCacheData};
use crate::entity::{CardinalityInfo, Ontology, PropertyKind};
use crate::errors::{OntoError, Result};
use crate::iri::SmartIri;
use crate::project::{EngineConfig, ProjectDirectory};
use crate::rbac::{Authorizer, UserProfile};
use crate::validation::{rules, MutationPhase, MutationPipeline};

pub use messages::{
    CanDoResponse, ChangeEntityTextRequest, ChangeGuiElementRequest, ChangeGuiOrderRequest,
    ChangeOntologyMetadataRequest, ClassCardinalitiesRequest, CreateClassRequest,
    CreateOntologyRequest, CreatePropertyRequest, EntityTargetRequest, MutationResponse,
    OntologyMutation, OntologyTargetRequest, ReadEntities, ReadOntology, ReadOntologyMetadata,
    SuccessResponse, TextPredicate,
};

use transaction::Commit;

/// A locked ontology being edited
///
/// `working` starts as a copy of the published ontology. The lock is held
/// until the commit has been published or the request is abandoned.
pub(crate) struct EditSession {
    guard: OwnedMutexGuard<()>,
    current: Arc<OntologyCacheData>,
    working: Ontology,
}

impl EditSession {
    fn ontology_iri(&self) -> &SmartIri {
        self.working.iri()
    }
}

pub struct OntologyResponder {
    cache: Arc<OntologyCache>,
    authorizer: Arc<dyn Authorizer>,
    projects: Arc<dyn ProjectDirectory>,
    config: Arc<EngineConfig>,
    locks: Mutex<HashMap<SmartIri, Arc<AsyncMutex<()>>>>,
}

impl OntologyResponder {
    pub fn new(
        cache: Arc<OntologyCache>,
        authorizer: Arc<dyn Authorizer>,
        projects: Arc<dyn ProjectDirectory>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            cache,
            authorizer,
            projects,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<OntologyCache> {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- reads ----

    /// Metadata of every ontology, or of those belonging to `projects`
    pub async fn get_ontology_metadata_by_project(&self, projects: &[SmartIri]) -> ReadOntologyMetadata {
        let snapshot = self.cache.snapshot().await;
        let ontologies = snapshot
            .ontologies()
            .filter(|o| {
                projects.is_empty()
                    || o.metadata
                        .project_iri
                        .as_ref()
                        .map(|p| projects.contains(p))
                        .unwrap_or(false)
            })
            .map(|o| o.metadata.clone())
            .collect();
        ReadOntologyMetadata { ontologies }
    }

    pub async fn get_ontology_entities(&self, ontology_iri: &SmartIri) -> Result<ReadOntology> {
        let snapshot = self.cache.snapshot().await;
        ReadOntology::full(&snapshot, ontology_iri)
    }

    pub async fn get_classes(&self, class_iris: &[SmartIri]) -> Result<ReadEntities> {
        let snapshot = self.cache.snapshot().await;
        ReadEntities::from_snapshot(&snapshot, class_iris, &[])
    }

    pub async fn get_properties(&self, property_iris: &[SmartIri]) -> Result<ReadEntities> {
        let snapshot = self.cache.snapshot().await;
        ReadEntities::from_snapshot(&snapshot, &[], property_iris)
    }

    /// Reload all ontologies from the triplestore
    pub async fn refresh_cache(&self, user: &UserProfile) -> Result<SuccessResponse> {
        if !user.is_system_admin {
            return Err(OntoError::Forbidden(format!(
                "{} is not a system administrator and cannot reload ontologies",
                user.user_iri
            )));
        }
        let snapshot = self.cache.refresh_from_persistence().await?;
        Ok(SuccessResponse::new(format!(
            "Ontologies reloaded: {}",
            snapshot.ontologies().count()
        )))
    }

    /// Dispatch one mutation
    pub async fn apply(&self, mutation: OntologyMutation, user: &UserProfile) -> Result<MutationResponse> {
        use MutationResponse::{Metadata, Ontology as Entities, Success};
        match mutation {
            OntologyMutation::CreateOntology(r) => self.create_ontology(r, user).await.map(Metadata),
            OntologyMutation::ChangeOntologyMetadata(r) => {
                self.change_ontology_metadata(r, user).await.map(Metadata)
            }
            OntologyMutation::DeleteOntologyComment(r) => {
                self.delete_ontology_comment(r, user).await.map(Metadata)
            }
            OntologyMutation::DeleteOntology(r) => self.delete_ontology(r, user).await.map(Success),
            OntologyMutation::CreateClass(r) => self.create_class(r, user).await.map(Entities),
            OntologyMutation::CreateProperty(r) => self.create_property(r, user).await.map(Entities),
            OntologyMutation::AddCardinalities(r) => {
                self.add_cardinalities(r, user).await.map(Entities)
            }
            OntologyMutation::ReplaceCardinalities(r) => {
                self.replace_cardinalities(r, user).await.map(Entities)
            }
            OntologyMutation::DeleteCardinalities(r) => {
                self.delete_cardinalities(r, user).await.map(Entities)
            }
            OntologyMutation::ChangeClassLabelsOrComments(r) => {
                self.change_class_labels_or_comments(r, user).await.map(Entities)
            }
            OntologyMutation::ChangePropertyLabelsOrComments(r) => {
                self.change_property_labels_or_comments(r, user).await.map(Entities)
            }
            OntologyMutation::DeleteClassComment(r) => {
                self.delete_class_comment(r, user).await.map(Entities)
            }
            OntologyMutation::DeletePropertyComment(r) => {
                self.delete_property_comment(r, user).await.map(Entities)
            }
            OntologyMutation::DeleteClass(r) => self.delete_class(r, user).await.map(Metadata),
            OntologyMutation::DeleteProperty(r) => self.delete_property(r, user).await.map(Metadata),
            OntologyMutation::ChangeGuiOrder(r) => self.change_gui_order(r, user).await.map(Entities),
            OntologyMutation::ChangePropertyGuiElement(r) => {
                self.change_property_gui_element(r, user).await.map(Entities)
            }
        }
    }

    // ---- shared mutation steps ----

    async fn lock_ontology(&self, ontology_iri: &SmartIri) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| OntoError::Inconsistency(format!("Ontology lock table poisoned: {}", e)))?;
            locks.entry(ontology_iri.clone()).or_default().clone()
        };
        Ok(lock.lock_owned().await)
    }

    /// Built-in ontologies have no project; only system administrators pass
    async fn ensure_admin(&self, user: &UserProfile, project: Option<&SmartIri>) -> Result<()> {
        let allowed = match project {
            Some(project) => self.authorizer.is_project_or_system_admin(user, project).await?,
            None => user.is_system_admin,
        };
        if !allowed {
            return Err(OntoError::Forbidden(format!(
                "{} may not modify ontologies of {}",
                user.user_iri,
                project.map(|p| p.to_string()).unwrap_or_else(|| "the system".to_string())
            )));
        }
        Ok(())
    }

    async fn authorize(
        &self,
        pipeline: &mut MutationPipeline,
        user: &UserProfile,
        project: Option<&SmartIri>,
    ) -> Result<()> {
        self.ensure_admin(user, project).await?;
        pipeline.advance(MutationPhase::AuthorizationChecked)
    }

    /// Lock, look up and authorize an existing ontology, and check the
    /// client's last modification date
    async fn begin_edit(
        &self,
        pipeline: &mut MutationPipeline,
        user: &UserProfile,
        ontology_iri: &SmartIri,
        supplied: &DateTime<Utc>,
    ) -> Result<EditSession> {
        rules::check_not_built_in(ontology_iri)?;
        let guard = self.lock_ontology(ontology_iri).await?;
        let current = self.cache.snapshot().await;
        let ontology = current
            .ontology(ontology_iri)
            .cloned()
            .ok_or_else(|| OntoError::NotFound(format!("Ontology {} not found", ontology_iri)))?;

        self.authorize(pipeline, user, ontology.metadata.project_iri.as_ref()).await?;
        check_last_modification_date(&ontology, supplied)?;

        debug!(ontology = %ontology_iri, "Ontology locked for editing");
        Ok(EditSession {
            guard,
            current,
            working: (*ontology).clone(),
        })
    }

    /// Like `begin_edit` but without a pipeline or date check, for dry runs
    async fn begin_inspection(&self, user: &UserProfile, ontology_iri: &SmartIri) -> Result<Arc<OntologyCacheData>> {
        let current = self.cache.snapshot().await;
        let ontology = current
            .ontology(ontology_iri)
            .ok_or_else(|| OntoError::NotFound(format!("Ontology {} not found", ontology_iri)))?;
        self.ensure_admin(user, ontology.metadata.project_iri.as_ref()).await?;
        Ok(current)
    }

    /// Stamp, persist and publish the session's working copy
    async fn finish_edit(&self, pipeline: &mut MutationPipeline, session: EditSession) -> Result<Arc<OntologyCacheData>> {
        let EditSession { guard, current, mut working } = session;
        working.metadata.last_modification_date =
            Some(next_modification_date(working.metadata.last_modification_date));
        self.commit(pipeline, guard, current, Commit::Replace(working)).await
    }

    /// Run the commit on its own task
    ///
    /// `base` is the snapshot the mutation was validated against. The
    /// ontology lock moves into the task, so an abandoned request cannot
    /// release it while the write is still in flight.
    async fn commit(
        &self,
        pipeline: &mut MutationPipeline,
        guard: OwnedMutexGuard<()>,
        base: Arc<OntologyCacheData>,
        commit: Commit,
    ) -> Result<Arc<OntologyCacheData>> {
        let cache = self.cache.clone();
        let task = tokio::spawn(
            async move {
                let _guard = guard;
                transaction::apply(cache, base, commit).await
            }
            .instrument(Span::current()),
        );
        let snapshot = task
            .await
            .map_err(|e| OntoError::Inconsistency(format!("Commit task failed: {}", e)))??;
        pipeline.advance(MutationPhase::Committed)?;
        Ok(snapshot)
    }
}

fn check_last_modification_date(ontology: &Ontology, supplied: &DateTime<Utc>) -> Result<()> {
    match ontology.last_modification_date() {
        Some(current) if current == *supplied => Ok(()),
        Some(current) => Err(OntoError::EditConflict(format!(
            "Ontology {} was last modified at {}, but the request expected {}",
            ontology.iri(),
            current.to_rfc3339(),
            supplied.to_rfc3339()
        ))),
        None => Err(OntoError::EditConflict(format!(
            "Ontology {} has no last modification date",
            ontology.iri()
        ))),
    }
}

/// Now, at microsecond precision, strictly after `previous`
pub(crate) fn next_modification_date(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match previous {
        Some(previous) if now <= previous => previous + Duration::microseconds(1),
        _ => now,
    }
}

/// Link cardinalities bring the matching cardinality on their link value
pub(crate) fn with_link_value_cardinalities(
    snapshot: &OntologyCacheData,
    cardinalities: &BTreeMap<SmartIri, CardinalityInfo>,
) -> BTreeMap<SmartIri, CardinalityInfo> {
    let mut all = cardinalities.clone();
    for (property, info) in cardinalities {
        if let Some(PropertyKind::Link { link_value_property }) = snapshot.property(property).map(|p| &p.kind) {
            all.insert(link_value_property.clone(), *info);
        }
    }
    all
}

/// Log line shared by all dry runs
fn log_dry_run(operation: &str, target: &SmartIri, response: &CanDoResponse) {
    info!(
        operation,
        target = %target,
        can_do = response.can_do,
        "Dry run evaluated"
    );
}
