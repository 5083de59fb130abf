//! Check, persist and publish one approved mutation
//!
//! Everything happens while holding the cache's producer lock. The
//! mutation was validated against the snapshot its edit started from; if
//! an ontology it depends on, or one that depends on it, has been published
//! since, the commit is refused as an edit conflict. The next snapshot is
//! built before anything is written, so a closure failure writes nothing.
//! If the triplestore reports a failed write that nonetheless changed the
//! graph, the cache reloads from the triplestore and the caller gets an
//! inconsistency error.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::MutexGuard;
use tracing::{debug, error, info, warn};

use crate::cache::{OntologyCache, OntologyCacheData};
use crate::entity::Ontology;
use crate::errors::{OntoError, Result};
use crate::iri::SmartIri;
use crate::triplestore::rdf::RdfTriple;
use crate::triplestore::serialize::{diff_triples, ontology_to_triples};
use crate::triplestore::{GraphUpdate, TriplestoreService};
use crate::validation::rules;

/// What an approved mutation publishes
#[derive(Debug, Clone)]
pub(crate) enum Commit {
    Replace(Ontology),
    Drop(SmartIri),
}

impl Commit {
    pub(crate) fn ontology_iri(&self) -> &SmartIri {
        match self {
            Commit::Replace(ontology) => ontology.iri(),
            Commit::Drop(iri) => iri,
        }
    }

    fn update(&self, stored: &[RdfTriple]) -> GraphUpdate {
        let graph = self.ontology_iri().as_str().to_string();
        match self {
            Commit::Replace(ontology) => {
                let (delete, insert) = diff_triples(stored, &ontology_to_triples(ontology));
                GraphUpdate::Modify { graph, delete, insert }
            }
            Commit::Drop(_) => GraphUpdate::DropGraph { graph },
        }
    }
}

/// Refuse the commit if a related ontology changed after `base` was taken
fn check_related_unchanged(base: &OntologyCacheData, latest: &OntologyCacheData, commit: &Commit) -> Result<()> {
    let iri = commit.ontology_iri();
    let mut related = BTreeSet::new();
    for snapshot in [base, latest] {
        if let Some(published) = snapshot.ontology(iri) {
            related.extend(snapshot.related_ontologies(published));
        }
        if let Commit::Replace(working) = commit {
            related.extend(snapshot.related_ontologies(working));
        }
    }

    for other in &related {
        let unchanged = match (base.ontology(other), latest.ontology(other)) {
            (Some(before), Some(after)) => Arc::ptr_eq(before, after) || before == after,
            (None, None) => true,
            _ => false,
        };
        if !unchanged {
            return Err(OntoError::EditConflict(format!(
                "Ontology {} changed while {} was being edited",
                other, iri
            )));
        }
    }
    Ok(())
}

/// Snapshot publishing `commit` on top of `latest`
fn next_snapshot(latest: &OntologyCacheData, commit: &Commit) -> Result<OntologyCacheData> {
    match commit {
        Commit::Replace(ontology) => rules::candidate_snapshot(latest, ontology.clone()),
        Commit::Drop(iri) => latest.rebuild(iri, None),
    }
}

/// Check `commit` against what was published since `base`, write it to the
/// triplestore, then publish it
pub(crate) async fn apply(
    cache: Arc<OntologyCache>,
    base: Arc<OntologyCacheData>,
    commit: Commit,
) -> Result<Arc<OntologyCacheData>> {
    let iri = commit.ontology_iri().clone();
    let producer = cache.lock_producer().await;
    let latest = cache.snapshot().await;
    if !Arc::ptr_eq(&base, &latest) {
        check_related_unchanged(&base, &latest, &commit)?;
    }
    let next = Arc::new(next_snapshot(&latest, &commit)?);

    let triplestore = cache.triplestore().as_ref();
    let stored = triplestore.graph_triples(iri.as_str()).await?;
    let update = commit.update(&stored);
    if update.is_empty() {
        debug!(graph = update.graph(), "Nothing to persist");
    } else {
        debug!(graph = update.graph(), "Persisting ontology graph");
        if let Err(e) = triplestore.update(update).await {
            return Err(reconcile(&cache, &producer, &iri, &stored, e).await);
        }
    }

    cache.publish(&producer, next.clone()).await;
    info!(ontology = %iri, "Ontology published");
    Ok(next)
}

/// Error for a failed write, reloading the cache if the graph changed anyway
async fn reconcile(
    cache: &OntologyCache,
    producer: &MutexGuard<'_, ()>,
    iri: &SmartIri,
    stored: &[RdfTriple],
    cause: OntoError,
) -> OntoError {
    let untouched = match cache.triplestore().graph_triples(iri.as_str()).await {
        Ok(now) => now.iter().collect::<BTreeSet<_>>() == stored.iter().collect::<BTreeSet<_>>(),
        Err(e) => {
            warn!(ontology = %iri, error = %e, "Cannot read back graph after failed write");
            false
        }
    };
    if untouched {
        warn!(ontology = %iri, error = %cause, "Write failed, nothing published");
        return cause;
    }

    error!(ontology = %iri, error = %cause, "Write reported failure but the graph changed, reloading");
    if let Err(reload) = cache.reload(producer).await {
        error!(error = %reload, "Reload after failed write also failed");
    }
    OntoError::Inconsistency(format!(
        "Writing {} failed but may have been applied: {}",
        iri, cause
    ))
}
