//! Cache Concurrency Integration Tests
//!
//! Many mutations at once on a multi-threaded runtime. Edits of one
//! ontology are serialized and guarded by its modification date; edits of
//! different ontologies run side by side, and are refused at commit when
//! one was validated against an ontology the other just changed; readers
//! keep working on whole snapshots throughout.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use onto_cache::entity::{Cardinality, CardinalityInfo};
use onto_cache::iri::vocabulary::knora_base;
use onto_cache::responder::{ChangeOntologyMetadataRequest, ClassCardinalitiesRequest, EntityTargetRequest};
use onto_cache::{OntoError, OntologyResponder};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_date_edits_exactly_one_wins() {
    let fx = fixture();
    let responder = Arc::new(fx.responder);
    let (ontology, date) = create_ontology(&responder, "anything", ANYTHING_PROJECT).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let responder = responder.clone();
        let ontology = ontology.clone();
        handles.push(tokio::spawn(async move {
            responder
                .change_ontology_metadata(
                    ChangeOntologyMetadataRequest {
                        ontology_iri: ontology,
                        label: Some(format!("Writer {}", i)),
                        comment: None,
                        last_modification_date: date,
                    },
                    &system_admin(),
                )
                .await
        }));
    }

    let mut winners = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(response) => winners.push(response.only().unwrap().clone()),
            Err(OntoError::EditConflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(conflicts, 7);

    // The published state is the winner's
    let read = responder.get_ontology_entities(&ontology).await.unwrap();
    assert_eq!(read.metadata.label, winners[0].label);
    assert_eq!(read.last_modification_date(), winners[0].last_modification_date);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_edits_of_different_ontologies_all_succeed() {
    let fx = fixture();
    let responder = Arc::new(fx.responder);

    let mut ontologies = Vec::new();
    for name in ["alpha", "beta", "gamma", "delta"] {
        ontologies.push(create_ontology(&responder, name, ANYTHING_PROJECT).await);
    }

    let mut handles = Vec::new();
    for (ontology, date) in ontologies.clone() {
        let responder = responder.clone();
        handles.push(tokio::spawn(async move {
            let has_text = ontology.make_entity_iri("hasText");
            let read = create_property(
                &responder,
                value_property(&ontology, "hasText", knora_base::TEXT_VALUE),
                date,
            )
            .await?;
            let item = class_definition(
                &ontology,
                "Item",
                knora_base::RESOURCE,
                &[(&has_text, Cardinality::ZeroOrOne)],
            );
            create_class(&responder, item, lmd(&read)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Every ontology got both entities and no edit was lost
    let snapshot = responder.cache().snapshot().await;
    for (ontology, _) in &ontologies {
        let published = snapshot.ontology(ontology).unwrap();
        assert_eq!(published.classes.len(), 1);
        assert_eq!(published.properties.len(), 1);
        assert!(snapshot.is_class(&ontology.make_entity_iri("Item")));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_whole_snapshots() {
    let fx = fixture();
    let responder = Arc::new(fx.responder);
    let (ontology, thing, has_text, date) = anything_with_thing(&responder).await;

    // Writer: toggle Thing's cardinality on hasText between 0-n and 0-1
    let writer = {
        let responder = responder.clone();
        let thing = thing.clone();
        let has_text = has_text.clone();
        tokio::spawn(async move {
            let mut date = date;
            for i in 0..20 {
                let cardinality = if i % 2 == 0 {
                    Cardinality::ZeroOrOne
                } else {
                    Cardinality::ZeroOrMore
                };
                let read = responder
                    .replace_cardinalities(
                        ClassCardinalitiesRequest {
                            class_iri: thing.clone(),
                            cardinalities: [(has_text.clone(), onto_cache::CardinalityInfo::new(cardinality))]
                                .into_iter()
                                .collect(),
                            last_modification_date: date,
                        },
                        &system_admin(),
                    )
                    .await
                    .unwrap();
                date = lmd(&read);
            }
            date
        })
    };

    // Readers: the class closure always agrees with the class definition
    // in the same snapshot, and dates never go backwards
    let mut readers = Vec::new();
    for _ in 0..4 {
        let responder = responder.clone();
        let ontology = ontology.clone();
        let thing = thing.clone();
        let has_text = has_text.clone();
        readers.push(tokio::spawn(async move {
            let mut last_seen = None;
            for _ in 0..50 {
                let snapshot = responder.cache().snapshot().await;
                let published = snapshot.ontology(&ontology).unwrap();
                let declared = published.classes[&thing].direct_cardinalities[&has_text].cardinality;
                let closed = snapshot.class(&thing).unwrap().all_cardinalities[&has_text].cardinality;
                assert_eq!(declared, closed);

                let seen = published.last_modification_date();
                assert!(seen >= last_seen);
                last_seen = seen;
                tokio::task::yield_now().await;
            }
        }));
    }

    let final_date = writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(current_date(&responder, &ontology).await, final_date);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_abandoned_request_does_not_release_lock_early() {
    let fx = fixture();
    let responder = Arc::new(fx.responder);
    let (ontology, date) = create_ontology(&responder, "anything", ANYTHING_PROJECT).await;

    // Start an edit and drop it immediately
    let abandoned = {
        let responder = responder.clone();
        let ontology = ontology.clone();
        tokio::spawn(async move {
            responder
                .change_ontology_metadata(
                    ChangeOntologyMetadataRequest {
                        ontology_iri: ontology,
                        label: Some("Abandoned".to_string()),
                        comment: None,
                        last_modification_date: date,
                    },
                    &system_admin(),
                )
                .await
        })
    };
    abandoned.abort();
    let _ = abandoned.await;

    // Whatever happened to it, label and date agree within one snapshot
    let read = responder.get_ontology_entities(&ontology).await.unwrap();
    let published_abandoned = read.metadata.label.as_deref() == Some("Abandoned");
    assert_eq!(published_abandoned, lmd(&read) != date);

    // A commit still in flight holds the lock; the next edit waits for it
    // and at worst sees one conflict
    let mut attempts = 0;
    let changed = loop {
        attempts += 1;
        let current = current_date(&responder, &ontology).await;
        let result = responder
            .change_ontology_metadata(
                ChangeOntologyMetadataRequest {
                    ontology_iri: ontology.clone(),
                    label: Some("After".to_string()),
                    comment: None,
                    last_modification_date: current,
                },
                &system_admin(),
            )
            .await;
        match result {
            Err(OntoError::EditConflict(_)) if attempts < 3 => continue,
            other => break other.unwrap(),
        }
    };
    assert_eq!(changed.only().unwrap().label.as_deref(), Some("After"));

    // Store and cache agree
    let reloaded = onto_cache::OntologyCache::load(responder.cache().triplestore().clone())
        .await
        .unwrap();
    let persisted = reloaded.get_ontology(&ontology).await.unwrap();
    assert_eq!(persisted.metadata.label.as_deref(), Some("After"));
}

/// `anything` with `hasText` and classes `Left` and `Base`, and `beta` in
/// the same project with `Right` requiring `anything:hasText` 1-n.
/// Returns (anything, anything lmd, beta, beta lmd).
async fn two_related_ontologies(
    responder: &OntologyResponder,
) -> (onto_cache::SmartIri, chrono::DateTime<chrono::Utc>, onto_cache::SmartIri, chrono::DateTime<chrono::Utc>) {
    let (anything, date) = create_ontology(responder, "anything", ANYTHING_PROJECT).await;
    let has_text = anything.make_entity_iri("hasText");
    let read = create_property(responder, value_property(&anything, "hasText", knora_base::TEXT_VALUE), date)
        .await
        .unwrap();
    let read = create_class(responder, class_definition(&anything, "Left", knora_base::RESOURCE, &[]), lmd(&read))
        .await
        .unwrap();
    let read = create_class(responder, class_definition(&anything, "Base", knora_base::RESOURCE, &[]), lmd(&read))
        .await
        .unwrap();

    let (beta, beta_date) = create_ontology(responder, "beta", ANYTHING_PROJECT).await;
    let right = class_definition(&beta, "Right", knora_base::RESOURCE, &[(&has_text, Cardinality::OneOrMore)]);
    let beta_read = create_class(responder, right, beta_date).await.unwrap();
    (anything, lmd(&read), beta, lmd(&beta_read))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_commit_validated_against_superseded_dependency_conflicts() {
    let store = Arc::new(GatedTriplestore::new());
    let responder = Arc::new(responder_on(store.clone()));
    let (anything, date, beta, beta_date) = two_related_ontologies(&responder).await;
    let left = anything.make_entity_iri("Left");
    let has_text = anything.make_entity_iri("hasText");

    // Left gains hasText 0-1; its write is held inside the store
    store.hold_next_write();
    let narrowing = {
        let responder = responder.clone();
        let left = left.clone();
        tokio::spawn(async move {
            responder
                .add_cardinalities(
                    ClassCardinalitiesRequest {
                        class_iri: left,
                        cardinalities: [(has_text, CardinalityInfo::new(Cardinality::ZeroOrOne))]
                            .into_iter()
                            .collect(),
                        last_modification_date: date,
                    },
                    &system_admin(),
                )
                .await
        })
    };
    store.write_held().await;

    // Both inherits from Left and Right; valid only while Left has no
    // cardinality on hasText
    let combining = {
        let responder = responder.clone();
        let mut both = class_definition(&beta, "Both", left.as_str(), &[]);
        both.subclass_of.insert(beta.make_entity_iri("Right"));
        tokio::spawn(async move { create_class(&responder, both, beta_date).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    store.release();

    narrowing.await.unwrap().unwrap();
    let err = combining.await.unwrap().unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {}", err);

    assert!(!responder.cache().snapshot().await.is_class(&beta.make_entity_iri("Both")));
    assert_eq!(current_date(&responder, &beta).await, beta_date);
    assert_cache_matches_store(&responder).await;
    responder.refresh_cache(&system_admin()).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_subclass_of_concurrently_deleted_class_conflicts() {
    let store = Arc::new(GatedTriplestore::new());
    let responder = Arc::new(responder_on(store.clone()));
    let (anything, date, beta, beta_date) = two_related_ontologies(&responder).await;
    let base = anything.make_entity_iri("Base");

    store.hold_next_write();
    let deleting = {
        let responder = responder.clone();
        let base = base.clone();
        tokio::spawn(async move {
            responder
                .delete_class(
                    EntityTargetRequest {
                        entity_iri: base,
                        last_modification_date: date,
                    },
                    &system_admin(),
                )
                .await
        })
    };
    store.write_held().await;

    let subclassing = {
        let responder = responder.clone();
        let sub = class_definition(&beta, "Sub", base.as_str(), &[]);
        tokio::spawn(async move { create_class(&responder, sub, beta_date).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    store.release();

    deleting.await.unwrap().unwrap();
    let err = subclassing.await.unwrap().unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {}", err);

    let snapshot = responder.cache().snapshot().await;
    assert!(!snapshot.is_class(&base));
    assert!(!snapshot.is_class(&beta.make_entity_iri("Sub")));
    assert_cache_matches_store(&responder).await;
    responder.refresh_cache(&system_admin()).await.unwrap();
}
