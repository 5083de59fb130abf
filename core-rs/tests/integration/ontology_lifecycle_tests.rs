//! Ontology Lifecycle Integration Tests
//!
//! Create, read, change, delete and reload whole ontologies through the
//! responder, against a real (in-memory or on-disk) oxigraph store.
//!
//! Every test builds its own store, so tests are independent and can run
//! in parallel.

mod common;

use std::sync::Arc;

use chrono::Duration;
use tempfile::TempDir;

use common::*;
use onto_cache::entity::Cardinality;
use onto_cache::iri::vocabulary::{knora_base, DEFAULT_SHARED_ONTOLOGIES_PROJECT};
use onto_cache::responder::{ChangeOntologyMetadataRequest, CreateOntologyRequest, OntologyTargetRequest};
use onto_cache::{
    OntologyCache, OxigraphTriplestore, SmartIri, TriplestoreService, UserProfile, ValidationRule,
};

fn target(ontology: &SmartIri, date: chrono::DateTime<chrono::Utc>) -> OntologyTargetRequest {
    OntologyTargetRequest {
        ontology_iri: ontology.clone(),
        last_modification_date: date,
    }
}

#[tokio::test]
async fn test_create_ontology_and_read_back() {
    let fx = fixture();

    // 1. Create
    let response = fx
        .responder
        .create_ontology(ontology_request("anything", ANYTHING_PROJECT), &anything_admin())
        .await
        .unwrap();
    let metadata = response.only().unwrap();
    assert_eq!(
        metadata.ontology_iri.as_str(),
        "http://www.knora.org/ontology/0001/anything"
    );
    assert_eq!(metadata.project_iri, Some(iri(ANYTHING_PROJECT)));
    assert_eq!(metadata.label.as_deref(), Some("The anything ontology"));
    assert!(metadata.last_modification_date.is_some());
    assert!(!metadata.is_shared);

    // 2. Visible to readers
    let listing = fx
        .responder
        .get_ontology_metadata_by_project(&[iri(ANYTHING_PROJECT)])
        .await;
    assert_eq!(listing.ontologies.len(), 1);

    let read = fx
        .responder
        .get_ontology_entities(&metadata.ontology_iri)
        .await
        .unwrap();
    assert!(read.classes.is_empty());
    assert!(read.properties.is_empty());

    // 3. Persisted as a named graph
    assert!(fx.store.has_graph(metadata.ontology_iri.as_str()).unwrap());
}

#[tokio::test]
async fn test_listing_filters_by_project() {
    let fx = fixture();
    create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;
    create_ontology(&fx.responder, "incunabula", INCUNABULA_PROJECT).await;

    let all = fx.responder.get_ontology_metadata_by_project(&[]).await;
    let names: Vec<&str> = all
        .ontologies
        .iter()
        .filter_map(|m| m.ontology_iri.ontology_name())
        .collect();
    assert!(names.contains(&"anything"));
    assert!(names.contains(&"incunabula"));
    // Built-in ontologies are listed too
    assert!(names.contains(&"knora-base"));

    let incunabula = fx
        .responder
        .get_ontology_metadata_by_project(&[iri(INCUNABULA_PROJECT)])
        .await;
    assert_eq!(incunabula.ontologies.len(), 1);
    assert_eq!(
        incunabula.ontologies[0].ontology_iri.ontology_name(),
        Some("incunabula")
    );
}

#[tokio::test]
async fn test_duplicate_ontology_rejected() {
    let fx = fixture();
    create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    let err = fx
        .responder
        .create_ontology(ontology_request("anything", ANYTHING_PROJECT), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::Uniqueness));
}

#[tokio::test]
async fn test_invalid_ontology_names_rejected() {
    let fx = fixture();

    for name in ["knora-base", "v2", "myknoraonto", "1abc", ""] {
        let err = fx
            .responder
            .create_ontology(ontology_request(name, ANYTHING_PROJECT), &system_admin())
            .await
            .unwrap_err();
        assert_eq!(err.rule(), Some(ValidationRule::Naming), "name {:?}", name);
    }

    let mut no_label = ontology_request("anything", ANYTHING_PROJECT);
    no_label.label = "  ".to_string();
    let err = fx.responder.create_ontology(no_label, &system_admin()).await.unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::RequiredMetadata));
}

#[tokio::test]
async fn test_create_ontology_requires_project_admin() {
    let fx = fixture();
    let nobody = UserProfile::new(iri("http://rdfh.ch/users/nobody"));

    let err = fx
        .responder
        .create_ontology(ontology_request("anything", ANYTHING_PROJECT), &nobody)
        .await
        .unwrap_err();
    assert!(err.is_forbidden());

    // Admin of another project
    let err = fx
        .responder
        .create_ontology(ontology_request("anything", ANYTHING_PROJECT), &incunabula_admin())
        .await
        .unwrap_err();
    assert!(err.is_forbidden());

    // Nothing was created
    assert!(fx
        .responder
        .get_ontology_metadata_by_project(&[iri(ANYTHING_PROJECT)])
        .await
        .ontologies
        .is_empty());
}

#[tokio::test]
async fn test_unknown_project_not_found() {
    let fx = fixture();
    let err = fx
        .responder
        .create_ontology(ontology_request("anything", "http://rdfh.ch/projects/9999"), &system_admin())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_shared_ontology_boundaries() {
    let fx = fixture();

    // Shared ontologies only in the shared-ontologies project
    let mut shared_elsewhere = ontology_request("common", ANYTHING_PROJECT);
    shared_elsewhere.is_shared = true;
    let err = fx
        .responder
        .create_ontology(shared_elsewhere, &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::SharingBoundary));

    // ...and nothing else there
    let err = fx
        .responder
        .create_ontology(
            ontology_request("private", DEFAULT_SHARED_ONTOLOGIES_PROJECT),
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::SharingBoundary));

    let shared = CreateOntologyRequest {
        ontology_name: "common".to_string(),
        project_iri: iri(DEFAULT_SHARED_ONTOLOGIES_PROJECT),
        label: "Common vocabulary".to_string(),
        comment: None,
        is_shared: true,
    };
    let response = fx.responder.create_ontology(shared, &system_admin()).await.unwrap();
    let metadata = response.only().unwrap();
    assert_eq!(
        metadata.ontology_iri.as_str(),
        "http://www.knora.org/ontology/shared/common"
    );
    assert!(metadata.is_shared);
}

#[tokio::test]
async fn test_change_metadata_with_stale_date_conflicts() {
    let fx = fixture();
    let (ontology, date) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    // 1. Change the label
    let changed = fx
        .responder
        .change_ontology_metadata(
            ChangeOntologyMetadataRequest {
                ontology_iri: ontology.clone(),
                label: Some("Renamed".to_string()),
                comment: None,
                last_modification_date: date,
            },
            &anything_admin(),
        )
        .await
        .unwrap();
    let after = changed.only().unwrap();
    assert_eq!(after.label.as_deref(), Some("Renamed"));
    let new_date = after.last_modification_date.unwrap();
    assert!(new_date > date);

    // 2. Retrying with the old date is a conflict
    let err = fx
        .responder
        .change_ontology_metadata(
            ChangeOntologyMetadataRequest {
                ontology_iri: ontology.clone(),
                label: Some("Again".to_string()),
                comment: None,
                last_modification_date: date,
            },
            &anything_admin(),
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // 3. Published label is unchanged by the failed attempt
    let read = fx.responder.get_ontology_entities(&ontology).await.unwrap();
    assert_eq!(read.metadata.label.as_deref(), Some("Renamed"));
    assert_eq!(read.metadata.last_modification_date, Some(new_date));
}

#[tokio::test]
async fn test_change_metadata_requires_a_change() {
    let fx = fixture();
    let (ontology, date) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    let err = fx
        .responder
        .change_ontology_metadata(
            ChangeOntologyMetadataRequest {
                ontology_iri: ontology.clone(),
                label: None,
                comment: None,
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::Syntax));

    let err = fx
        .responder
        .change_ontology_metadata(
            ChangeOntologyMetadataRequest {
                ontology_iri: ontology,
                label: None,
                comment: Some(String::new()),
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::RequiredMetadata));
}

#[tokio::test]
async fn test_delete_comment_twice_keeps_date() {
    let fx = fixture();
    let (ontology, date) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    // 1. First delete removes the comment and bumps the date
    let first = fx
        .responder
        .delete_ontology_comment(target(&ontology, date), &anything_admin())
        .await
        .unwrap();
    let first = first.only().unwrap().clone();
    assert!(first.comment.is_none());
    let after_first = first.last_modification_date.unwrap();
    assert!(after_first > date);

    // 2. Second delete is a no-op
    let second = fx
        .responder
        .delete_ontology_comment(target(&ontology, after_first), &anything_admin())
        .await
        .unwrap();
    assert_eq!(second.only().unwrap().last_modification_date, Some(after_first));
}

#[tokio::test]
async fn test_delete_ontology() {
    let fx = fixture();
    let (ontology, date) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    // Dry run first
    let check = fx.responder.can_delete_ontology(&ontology, &anything_admin()).await.unwrap();
    assert!(check.can_do);

    let response = fx
        .responder
        .delete_ontology(target(&ontology, date), &anything_admin())
        .await
        .unwrap();
    assert!(response.message.contains("has been deleted"));

    assert!(fx.responder.get_ontology_entities(&ontology).await.unwrap_err().is_not_found());
    assert!(!fx.store.has_graph(ontology.as_str()).unwrap());

    // Deleting again: the ontology is gone
    let err = fx
        .responder
        .delete_ontology(target(&ontology, date), &anything_admin())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_ontology_used_by_another_ontology() {
    let fx = fixture();
    let (anything, _thing, has_text, _) = anything_with_thing(&fx.responder).await;
    let (other, other_date) = create_ontology(&fx.responder, "other", ANYTHING_PROJECT).await;

    // A class in `other` with a cardinality on anything:hasText
    let reuser = class_definition(
        &other,
        "Reuser",
        knora_base::RESOURCE,
        &[(&has_text, Cardinality::ZeroOrOne)],
    );
    create_class(&fx.responder, reuser, other_date).await.unwrap();

    let check = fx.responder.can_delete_ontology(&anything, &system_admin()).await.unwrap();
    assert!(!check.can_do);
    assert!(check.reason.unwrap().contains("Reuser"));

    let date = current_date(&fx.responder, &anything).await;
    let err = fx
        .responder
        .delete_ontology(target(&anything, date), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::DeletionGuard));
}

#[tokio::test]
async fn test_delete_ontology_used_in_data() {
    let fx = fixture();
    let (anything, _thing, _has_text, date) = anything_with_thing(&fx.responder).await;
    add_thing_instance(&fx.store, "thing-1", false);

    let err = fx
        .responder
        .delete_ontology(target(&anything, date), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::DeletionGuard));
    assert!(err.to_string().contains("http://rdfh.ch/0001/thing-1"));

    // Still there
    assert!(fx.responder.get_ontology_entities(&anything).await.is_ok());
}

#[tokio::test]
async fn test_built_in_ontologies_are_read_only() {
    let fx = fixture();
    let knora_base_iri = iri(knora_base::ONTOLOGY);

    let read = fx.responder.get_ontology_entities(&knora_base_iri).await.unwrap();
    assert!(read.classes.contains_key(&iri(knora_base::RESOURCE)));
    assert!(read.metadata.last_modification_date.is_none());

    let err = fx
        .responder
        .delete_ontology(target(&knora_base_iri, chrono::Utc::now()), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::BuiltInOntology));

    let check = fx
        .responder
        .can_delete_ontology(&knora_base_iri, &system_admin())
        .await
        .unwrap();
    assert!(!check.can_do);
}

#[tokio::test]
async fn test_cache_reloads_from_triplestore() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store");

    // 1. Build an ontology on a persistent store
    let (ontology, thing, has_text, date) = {
        let store = Arc::new(OxigraphTriplestore::open(&path).unwrap());
        let responder = responder_on(store);
        anything_with_thing(&responder).await
    };

    // 2. Fresh cache on the reopened store
    let store: Arc<dyn TriplestoreService> = Arc::new(OxigraphTriplestore::open(&path).unwrap());
    let cache = OntologyCache::load(store).await.unwrap();

    let reloaded = cache.get_ontology(&ontology).await.unwrap();
    assert_eq!(reloaded.last_modification_date(), Some(date));
    assert_eq!(reloaded.metadata.project_iri, Some(iri(ANYTHING_PROJECT)));
    assert!(reloaded.classes.contains_key(&thing));
    assert!(reloaded.properties.contains_key(&has_text));

    let class = cache.get_class_with_closure(&thing).await.unwrap();
    assert_eq!(
        class.all_cardinalities.get(&has_text).map(|c| c.cardinality),
        Some(Cardinality::ZeroOrMore)
    );
    assert!(class.is_subclass_of(&iri(knora_base::RESOURCE)));
}

#[tokio::test]
async fn test_failed_write_leaves_cache_unchanged() {
    let store = Arc::new(FailingTriplestore::new());
    let responder = responder_on(store.clone());
    let (ontology, date) = create_ontology(&responder, "anything", ANYTHING_PROJECT).await;

    store.set_failing(true);
    let err = responder
        .change_ontology_metadata(
            ChangeOntologyMetadataRequest {
                ontology_iri: ontology.clone(),
                label: Some("Never published".to_string()),
                comment: None,
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, onto_cache::OntoError::Triplestore(_)));

    let read = responder.get_ontology_entities(&ontology).await.unwrap();
    assert_eq!(read.metadata.label.as_deref(), Some("The anything ontology"));
    assert_eq!(read.last_modification_date(), Some(date));
    assert_cache_matches_store(&responder).await;

    // The store recovers and the original date is still the valid one
    store.set_failing(false);
    let changed = responder
        .change_ontology_metadata(
            ChangeOntologyMetadataRequest {
                ontology_iri: ontology,
                label: Some("Published".to_string()),
                comment: None,
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    assert_eq!(changed.only().unwrap().label.as_deref(), Some("Published"));
}

#[tokio::test]
async fn test_write_applied_but_reported_failed_reloads_cache() {
    let store = Arc::new(FailingTriplestore::new());
    let responder = responder_on(store.clone());
    let (ontology, date) = create_ontology(&responder, "anything", ANYTHING_PROJECT).await;

    store.set_losing_acks(true);
    let err = responder
        .change_ontology_metadata(
            ChangeOntologyMetadataRequest {
                ontology_iri: ontology.clone(),
                label: Some("Written without an answer".to_string()),
                comment: None,
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, onto_cache::OntoError::Inconsistency(_)), "unexpected error: {}", err);
    store.set_losing_acks(false);

    // The cache was reloaded and shows what the store holds
    let read = responder.get_ontology_entities(&ontology).await.unwrap();
    assert_eq!(read.metadata.label.as_deref(), Some("Written without an answer"));
    assert!(lmd(&read) > date);
    assert_cache_matches_store(&responder).await;

    // The reloaded date is the one the next edit must send
    let changed = responder
        .change_ontology_metadata(
            ChangeOntologyMetadataRequest {
                ontology_iri: ontology,
                label: Some("Next".to_string()),
                comment: None,
                last_modification_date: lmd(&read),
            },
            &system_admin(),
        )
        .await
        .unwrap();
    assert_eq!(changed.only().unwrap().label.as_deref(), Some("Next"));
}

#[tokio::test]
async fn test_refresh_requires_system_admin() {
    let fx = fixture();
    let (ontology, _) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    let err = fx.responder.refresh_cache(&anything_admin()).await.unwrap_err();
    assert!(err.is_forbidden());

    let response = fx.responder.refresh_cache(&system_admin()).await.unwrap();
    assert!(response.message.starts_with("Ontologies reloaded"));
    assert!(fx.responder.get_ontology_entities(&ontology).await.is_ok());
}

#[tokio::test]
async fn test_modification_date_strictly_increases() {
    let fx = fixture();
    let (ontology, mut date) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    for i in 0..5 {
        let changed = fx
            .responder
            .change_ontology_metadata(
                ChangeOntologyMetadataRequest {
                    ontology_iri: ontology.clone(),
                    label: Some(format!("Label {}", i)),
                    comment: None,
                    last_modification_date: date,
                },
                &system_admin(),
            )
            .await
            .unwrap();
        let next = changed.only().unwrap().last_modification_date.unwrap();
        assert!(next >= date + Duration::microseconds(1));
        date = next;
    }
}
