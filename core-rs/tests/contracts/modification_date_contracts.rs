// Modification Date Contract Tests
//
// The last modification date is the optimistic lock of an ontology.
// It moves strictly forward on every published change, never moves for a
// no-op or a rejection, and survives a round trip through the store
// unchanged.

use std::sync::Arc;

use chrono::Timelike;

use crate::common::*;
use onto_cache::responder::{ChangeOntologyMetadataRequest, EntityTargetRequest, OntologyTargetRequest};
use onto_cache::{OntologyCache, TriplestoreService};

/// WHY: Clients compare dates for equality after a store round trip
/// BREAKS: Every edit after a reload, if sub-microsecond digits get lost
#[tokio::test]
async fn dates_have_microsecond_precision() {
    let fx = fixture();
    let (ontology, date) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;
    assert_eq!(date.nanosecond() % 1_000, 0);

    let store: Arc<dyn TriplestoreService> = fx.store.clone();
    let reloaded = OntologyCache::load(store).await.unwrap();
    assert_eq!(
        reloaded.get_ontology(&ontology).await.unwrap().last_modification_date(),
        Some(date)
    );
}

/// WHY: Two edits with the same date would both pass the conflict check
/// BREAKS: Lost updates under fast successive writes
#[tokio::test]
async fn every_published_change_moves_the_date_forward() {
    let fx = fixture();
    let (ontology, thing, _, mut date) = anything_with_thing(&fx.responder).await;

    let metadata = fx
        .responder
        .change_ontology_metadata(
            ChangeOntologyMetadataRequest {
                ontology_iri: ontology.clone(),
                label: Some("Changed".to_string()),
                comment: None,
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    let next = metadata.only().unwrap().last_modification_date.unwrap();
    assert!(next > date);
    date = next;

    let read = fx
        .responder
        .delete_class_comment(
            EntityTargetRequest {
                entity_iri: thing,
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    assert!(lmd(&read) > date);
}

/// WHY: A no-op must not invalidate dates other clients hold
/// BREAKS: Spurious edit conflicts for everyone after an idempotent retry
#[tokio::test]
async fn no_op_keeps_the_date() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;

    let read = fx
        .responder
        .delete_class_comment(
            EntityTargetRequest {
                entity_iri: thing.clone(),
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    let after_delete = lmd(&read);

    let repeat = fx
        .responder
        .delete_class_comment(
            EntityTargetRequest {
                entity_iri: thing,
                last_modification_date: after_delete,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    assert_eq!(lmd(&repeat), after_delete);

    let graph_before = fx.store.graph_triples(ontology.as_str()).await.unwrap().len();
    let first = fx
        .responder
        .delete_ontology_comment(
            OntologyTargetRequest {
                ontology_iri: ontology.clone(),
                last_modification_date: after_delete,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    let after_ontology_comment = first.only().unwrap().last_modification_date.unwrap();
    assert!(after_ontology_comment > after_delete);
    assert!(fx.store.graph_triples(ontology.as_str()).await.unwrap().len() < graph_before);

    let second = fx
        .responder
        .delete_ontology_comment(
            OntologyTargetRequest {
                ontology_iri: ontology,
                last_modification_date: after_ontology_comment,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    assert_eq!(
        second.only().unwrap().last_modification_date,
        Some(after_ontology_comment)
    );
}

/// WHY: The date is the only thing a client uses to detect concurrent edits
/// BREAKS: Silent overwrites, if an old date is ever accepted again
#[tokio::test]
async fn superseded_dates_are_refused() {
    let fx = fixture();
    let (ontology, first) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    let change = |label: &str, date| ChangeOntologyMetadataRequest {
        ontology_iri: ontology.clone(),
        label: Some(label.to_string()),
        comment: None,
        last_modification_date: date,
    };
    let second = fx
        .responder
        .change_ontology_metadata(change("Second", first), &system_admin())
        .await
        .unwrap()
        .only()
        .unwrap()
        .last_modification_date
        .unwrap();

    for stale in [first, second - chrono::Duration::microseconds(1), second + chrono::Duration::microseconds(1)] {
        let err = fx
            .responder
            .change_ontology_metadata(change("Stale", stale), &system_admin())
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }
    assert_eq!(current_date(&fx.responder, &ontology).await, second);
}
