//! The ontology graph store
//!
//! Holds the current [`OntologyCacheData`] snapshot. Readers clone the
//! `Arc` and never wait for a rebuild; writers build the next snapshot
//! off to the side and swap the pointer.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{info, warn};

use crate::cache::loader::load_ontologies;
use crate::cache::snapshot::OntologyCacheData;
use crate::entity::{ClassInfo, Ontology, PropertyInfo};
use crate::errors::{OntoError, Result};
use crate::iri::SmartIri;
use crate::triplestore::TriplestoreService;

pub struct OntologyCache {
    data: RwLock<Arc<OntologyCacheData>>,
    /// Serializes snapshot producers so no swap is lost
    swap_lock: Mutex<()>,
    triplestore: Arc<dyn TriplestoreService>,
}

impl OntologyCache {
    /// Cache holding only the built-in ontologies
    pub fn new(triplestore: Arc<dyn TriplestoreService>) -> Result<Self> {
        Ok(Self {
            data: RwLock::new(Arc::new(OntologyCacheData::build(Vec::new())?)),
            swap_lock: Mutex::new(()),
            triplestore,
        })
    }

    /// Cache loaded from the triplestore
    pub async fn load(triplestore: Arc<dyn TriplestoreService>) -> Result<Self> {
        let cache = Self::new(triplestore)?;
        cache.refresh_from_persistence().await?;
        Ok(cache)
    }

    pub fn triplestore(&self) -> &Arc<dyn TriplestoreService> {
        &self.triplestore
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Arc<OntologyCacheData> {
        self.data.read().await.clone()
    }

    pub async fn get_ontology(&self, iri: &SmartIri) -> Result<Arc<Ontology>> {
        self.snapshot()
            .await
            .ontology(iri)
            .cloned()
            .ok_or_else(|| OntoError::NotFound(format!("Ontology {} not found", iri)))
    }

    pub async fn get_class_with_closure(&self, iri: &SmartIri) -> Result<Arc<ClassInfo>> {
        self.snapshot()
            .await
            .class(iri)
            .cloned()
            .ok_or_else(|| OntoError::NotFound(format!("Class {} not found", iri)))
    }

    pub async fn get_property(&self, iri: &SmartIri) -> Result<Arc<PropertyInfo>> {
        self.snapshot()
            .await
            .property(iri)
            .cloned()
            .ok_or_else(|| OntoError::NotFound(format!("Property {} not found", iri)))
    }

    /// Atomically publish `ontology`, recomputing dependent closures
    pub async fn replace_ontology(&self, ontology: Ontology) -> Result<Arc<OntologyCacheData>> {
        let iri = ontology.iri().clone();
        self.swap(&iri, Some(ontology)).await
    }

    /// Atomically drop an ontology and its entities
    pub async fn remove_ontology(&self, iri: &SmartIri) -> Result<Arc<OntologyCacheData>> {
        self.swap(iri, None).await
    }

    async fn swap(&self, iri: &SmartIri, replacement: Option<Ontology>) -> Result<Arc<OntologyCacheData>> {
        let producer = self.lock_producer().await;
        let current = self.snapshot().await;
        let next = Arc::new(current.rebuild(iri, replacement)?);
        self.publish(&producer, next.clone()).await;
        Ok(next)
    }

    /// Exclusive right to publish snapshots until the guard is dropped
    pub(crate) async fn lock_producer(&self) -> MutexGuard<'_, ()> {
        self.swap_lock.lock().await
    }

    pub(crate) async fn publish(&self, _producer: &MutexGuard<'_, ()>, next: Arc<OntologyCacheData>) {
        *self.data.write().await = next;
    }

    /// Reload everything from the triplestore and publish a fresh snapshot
    ///
    /// On failure the current snapshot stays in place.
    pub async fn refresh_from_persistence(&self) -> Result<Arc<OntologyCacheData>> {
        let producer = self.lock_producer().await;
        self.reload(&producer).await
    }

    pub(crate) async fn reload(&self, producer: &MutexGuard<'_, ()>) -> Result<Arc<OntologyCacheData>> {
        let ontologies = load_ontologies(self.triplestore.as_ref()).await?;
        let next = match OntologyCacheData::build(ontologies) {
            Ok(data) => Arc::new(data),
            Err(e) => {
                warn!(error = %e, "Refusing to publish inconsistent snapshot");
                return Err(e);
            }
        };
        self.publish(producer, next.clone()).await;
        info!(ontologies = next.ontologies().count(), "Ontology cache refreshed");
        Ok(next)
    }
}
