//! Class and Property Lifecycle Integration Tests
//!
//! Properties (value and link), classes with cardinalities, the
//! cardinality family of mutations and the deletion guards, all through
//! the responder against an in-memory oxigraph store with instance data
//! loaded where a test needs it.

mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::*;
use onto_cache::entity::{Cardinality, CardinalityInfo, Literal, PropertyKind};
use onto_cache::iri::vocabulary::{knora_base, rdfs, salsah_gui};
use onto_cache::responder::{
    ChangeEntityTextRequest, ChangeGuiElementRequest, ChangeGuiOrderRequest, ClassCardinalitiesRequest,
    EntityTargetRequest, TextPredicate,
};
use onto_cache::{OntologyResponder, SmartIri, ValidationRule};

fn cards(entries: &[(&SmartIri, Cardinality)]) -> BTreeMap<SmartIri, CardinalityInfo> {
    entries
        .iter()
        .map(|(p, c)| ((*p).clone(), CardinalityInfo::new(*c)))
        .collect()
}

fn cardinality_request(
    class: &SmartIri,
    entries: &[(&SmartIri, Cardinality)],
    date: chrono::DateTime<chrono::Utc>,
) -> ClassCardinalitiesRequest {
    ClassCardinalitiesRequest {
        class_iri: class.clone(),
        cardinalities: cards(entries),
        last_modification_date: date,
    }
}

fn entity_target(entity: &SmartIri, date: chrono::DateTime<chrono::Utc>) -> EntityTargetRequest {
    EntityTargetRequest {
        entity_iri: entity.clone(),
        last_modification_date: date,
    }
}

/// Adds `hasOtherThing` (link to Thing) and returns it with the new date
async fn add_link_to_thing(
    responder: &OntologyResponder,
    ontology: &SmartIri,
    thing: &SmartIri,
    date: chrono::DateTime<chrono::Utc>,
) -> (SmartIri, chrono::DateTime<chrono::Utc>) {
    let read = create_property(responder, link_property(ontology, "hasOtherThing", thing), date)
        .await
        .unwrap();
    (ontology.make_entity_iri("hasOtherThing"), lmd(&read))
}

// ---- properties ----

#[tokio::test]
async fn test_create_value_property() {
    let fx = fixture();
    let (ontology, date) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    let read = create_property(
        &fx.responder,
        value_property(&ontology, "hasInteger", knora_base::INT_VALUE),
        date,
    )
    .await
    .unwrap();
    assert!(lmd(&read) > date);

    let has_integer = ontology.make_entity_iri("hasInteger");
    let info = &read.properties[&has_integer];
    assert_eq!(info.kind, PropertyKind::Value);
    assert!(info.is_subproperty_of(&iri(knora_base::HAS_VALUE)));
    assert_eq!(
        info.effective_object_type.as_ref().map(|o| o.as_str()),
        Some(knora_base::INT_VALUE)
    );
}

#[tokio::test]
async fn test_create_link_property_adds_link_value() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;

    let read = create_property(
        &fx.responder,
        link_property(&ontology, "hasOtherThing", &thing),
        date,
    )
    .await
    .unwrap();

    let link = ontology.make_entity_iri("hasOtherThing");
    let link_value = ontology.make_entity_iri("hasOtherThingValue");
    assert_eq!(read.properties.len(), 2);
    assert!(read.properties[&link].kind.is_link());

    let shadow = &read.properties[&link_value];
    assert!(shadow.kind.is_link_value());
    assert!(shadow.is_subproperty_of(&iri(knora_base::HAS_LINK_TO_VALUE)));
    assert_eq!(
        shadow.effective_object_type.as_ref().map(|o| o.as_str()),
        Some(knora_base::LINK_VALUE)
    );
    assert_eq!(shadow.definition.predicates.lang_value(rdfs::LABEL, "en"), Some("hasOtherThing"));
}

#[tokio::test]
async fn test_created_property_survives_reload_unchanged() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;

    let mut submitted = value_property(&ontology, "hasPageCount", knora_base::INT_VALUE);
    submitted.subject_type = Some(thing);
    submitted.predicates.insert(iri(rdfs::LABEL), Literal::lang_string("Seitenzahl", "de"));
    create_property(&fx.responder, submitted.clone(), date).await.unwrap();

    fx.responder.refresh_cache(&system_admin()).await.unwrap();
    let read = fx.responder.get_properties(&[submitted.iri.clone()]).await.unwrap();
    let definition = &read.properties[&submitted.iri].definition;
    assert_eq!(definition, &submitted);
    assert_eq!(definition.predicates, submitted.predicates);
    assert_eq!(definition.subproperty_of, submitted.subproperty_of);
}

#[tokio::test]
async fn test_property_iri_must_be_unused() {
    let fx = fixture();
    let (ontology, thing, has_text, date) = anything_with_thing(&fx.responder).await;

    let err = create_property(&fx.responder, value_property(&ontology, "hasText", knora_base::TEXT_VALUE), date)
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::Uniqueness));
    assert!(has_text.entity_name().is_some());

    // A property may not reuse a class IRI either
    let err = create_property(&fx.responder, value_property(&ontology, "Thing", knora_base::TEXT_VALUE), date)
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::Uniqueness));
    assert!(fx.responder.get_classes(&[thing]).await.is_ok());
}

#[tokio::test]
async fn test_property_needs_labels_and_a_superproperty() {
    let fx = fixture();
    let (ontology, date) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;

    let mut unlabelled = value_property(&ontology, "hasName", knora_base::TEXT_VALUE);
    unlabelled.predicates.remove(rdfs::LABEL);
    let err = create_property(&fx.responder, unlabelled, date).await.unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::RequiredMetadata));

    let mut orphan = value_property(&ontology, "hasName", knora_base::TEXT_VALUE);
    orphan.subproperty_of.clear();
    let err = create_property(&fx.responder, orphan, date).await.unwrap_err();
    assert!(err.is_bad_request());

    // Nothing was published
    assert_eq!(current_date(&fx.responder, &ontology).await, date);
}

#[tokio::test]
async fn test_change_link_property_label_updates_link_value() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;
    let (link, date) = add_link_to_thing(&fx.responder, &ontology, &thing, date).await;

    let labels: BTreeSet<Literal> = [
        Literal::lang_string("other thing", "en"),
        Literal::lang_string("anderes Ding", "de"),
    ]
    .into_iter()
    .collect();
    fx.responder
        .change_property_labels_or_comments(
            ChangeEntityTextRequest {
                entity_iri: link.clone(),
                predicate: TextPredicate::Label,
                objects: labels,
                last_modification_date: date,
            },
            &anything_admin(),
        )
        .await
        .unwrap();

    let read = fx
        .responder
        .get_properties(&[link.clone(), link.link_value_property()])
        .await
        .unwrap();
    for info in read.properties.values() {
        assert_eq!(info.definition.predicates.lang_value(rdfs::LABEL, "de"), Some("anderes Ding"));
        assert_eq!(info.definition.predicates.lang_value(rdfs::LABEL, "en"), Some("other thing"));
    }
}

#[tokio::test]
async fn test_link_value_is_changed_only_through_its_link() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;
    let (link, date) = add_link_to_thing(&fx.responder, &ontology, &thing, date).await;

    let err = fx
        .responder
        .change_property_labels_or_comments(
            ChangeEntityTextRequest {
                entity_iri: link.link_value_property(),
                predicate: TextPredicate::Comment,
                objects: [Literal::lang_string("nope", "en")].into_iter().collect(),
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::PropertyTaxonomy));

    let err = fx
        .responder
        .delete_property(entity_target(&link.link_value_property(), date), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::DeletionGuard));
}

#[tokio::test]
async fn test_delete_property_comment_is_idempotent() {
    let fx = fixture();
    let (ontology, _, has_text, date) = anything_with_thing(&fx.responder).await;

    let read = fx
        .responder
        .delete_property_comment(entity_target(&has_text, date), &system_admin())
        .await
        .unwrap();
    let after = lmd(&read);
    assert!(after > date);
    assert!(!read.properties[&has_text].definition.predicates.contains(rdfs::COMMENT));

    let again = fx
        .responder
        .delete_property_comment(entity_target(&has_text, after), &system_admin())
        .await
        .unwrap();
    assert_eq!(lmd(&again), after);
    assert_eq!(current_date(&fx.responder, &ontology).await, after);
}

#[tokio::test]
async fn test_change_property_gui_element() {
    let fx = fixture();
    let (_, _, has_text, date) = anything_with_thing(&fx.responder).await;

    // Attributes without an element
    let err = fx
        .responder
        .change_property_gui_element(
            ChangeGuiElementRequest {
                property_iri: has_text.clone(),
                gui_element: None,
                gui_attributes: ["size=80".to_string()].into_iter().collect(),
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::Syntax));

    let read = fx
        .responder
        .change_property_gui_element(
            ChangeGuiElementRequest {
                property_iri: has_text.clone(),
                gui_element: Some(iri(salsah_gui::SIMPLE_TEXT)),
                gui_attributes: ["size=80".to_string(), "maxlength=255".to_string()]
                    .into_iter()
                    .collect(),
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    let definition = &read.properties[&has_text].definition;
    assert_eq!(definition.gui_element().map(|e| e.as_str()), Some(salsah_gui::SIMPLE_TEXT));
    assert_eq!(definition.predicates.get(salsah_gui::GUI_ATTRIBUTE).map(|a| a.len()), Some(2));

    // Clearing removes both
    let read = fx
        .responder
        .change_property_gui_element(
            ChangeGuiElementRequest {
                property_iri: has_text.clone(),
                gui_element: None,
                gui_attributes: BTreeSet::new(),
                last_modification_date: lmd(&read),
            },
            &system_admin(),
        )
        .await
        .unwrap();
    let definition = &read.properties[&has_text].definition;
    assert!(definition.gui_element().is_none());
    assert!(!definition.predicates.contains(salsah_gui::GUI_ATTRIBUTE));
}

// ---- classes ----

#[tokio::test]
async fn test_create_class_with_cardinalities() {
    let fx = fixture();
    let (ontology, thing, has_text, _) = anything_with_thing(&fx.responder).await;

    let read = fx.responder.get_classes(&[thing.clone()]).await.unwrap();
    let info = &read.classes[&thing];
    assert!(info.is_resource_class);
    assert!(info.is_subclass_of(&iri(knora_base::RESOURCE)));
    assert_eq!(
        info.all_cardinalities.get(&has_text).map(|c| c.cardinality),
        Some(Cardinality::ZeroOrMore)
    );
    // Inherited from knora-base:Resource
    assert!(info.is_inherited(&iri(knora_base::ATTACHED_TO_PROJECT)));
    assert!(!info.all_resource_property_cardinalities.contains_key(&iri(knora_base::ATTACHED_TO_PROJECT)));

    let entities = fx.responder.get_ontology_entities(&ontology).await.unwrap();
    assert!(entities.classes.contains_key(&thing));
}

#[tokio::test]
async fn test_link_cardinality_brings_link_value_cardinality() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;
    let (link, date) = add_link_to_thing(&fx.responder, &ontology, &thing, date).await;

    let linker = class_definition(&ontology, "Linker", knora_base::RESOURCE, &[(&link, Cardinality::ZeroOrOne)]);
    let linker_iri = linker.iri.clone();
    let read = create_class(&fx.responder, linker, date).await.unwrap();

    let direct = &read.classes[&linker_iri].definition.direct_cardinalities;
    assert_eq!(direct.len(), 2);
    assert_eq!(
        direct.get(&link.link_value_property()).map(|c| c.cardinality),
        Some(Cardinality::ZeroOrOne)
    );
}

#[tokio::test]
async fn test_boolean_property_cardinality() {
    let fx = fixture();
    let (ontology, date) = create_ontology(&fx.responder, "anything", ANYTHING_PROJECT).await;
    let is_done = ontology.make_entity_iri("isDone");
    let date = lmd(
        &create_property(&fx.responder, value_property(&ontology, "isDone", knora_base::BOOLEAN_VALUE), date)
            .await
            .unwrap(),
    );

    let many = class_definition(&ontology, "Task", knora_base::RESOURCE, &[(&is_done, Cardinality::ZeroOrMore)]);
    let err = create_class(&fx.responder, many, date).await.unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::CardinalityLegality));

    let single = class_definition(&ontology, "Task", knora_base::RESOURCE, &[(&is_done, Cardinality::ZeroOrOne)]);
    assert!(create_class(&fx.responder, single, date).await.is_ok());
}

#[tokio::test]
async fn test_class_cannot_use_another_projects_property() {
    let fx = fixture();
    let (_, _, has_text, _) = anything_with_thing(&fx.responder).await;
    let (incunabula, date) = create_ontology(&fx.responder, "incunabula", INCUNABULA_PROJECT).await;

    let book = class_definition(&incunabula, "Book", knora_base::RESOURCE, &[(&has_text, Cardinality::ZeroOrOne)]);
    let err = create_class(&fx.responder, book, date).await.unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::SharingBoundary));
}

#[tokio::test]
async fn test_class_in_built_in_ontology_rejected() {
    let fx = fixture();
    let knora_base_iri = iri(knora_base::ONTOLOGY);
    let class = class_definition(&knora_base_iri, "MyResource", knora_base::RESOURCE, &[]);

    let err = create_class(&fx.responder, class, chrono::Utc::now()).await.unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::BuiltInOntology));
}

#[tokio::test]
async fn test_subclass_cannot_loosen_inherited_cardinality() {
    let fx = fixture();
    let (ontology, thing, has_text, date) = anything_with_thing(&fx.responder).await;

    // 1. Tighten Thing's hasText to 0-1
    let read = fx
        .responder
        .replace_cardinalities(
            cardinality_request(&thing, &[(&has_text, Cardinality::ZeroOrOne)], date),
            &system_admin(),
        )
        .await
        .unwrap();

    // 2. A subclass may not go back to 0-n
    let blue = class_definition(&ontology, "BlueThing", thing.as_str(), &[(&has_text, Cardinality::ZeroOrMore)]);
    let err = create_class(&fx.responder, blue, lmd(&read)).await.unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::CardinalityLegality));

    // 3. ...but may keep or narrow it
    let blue = class_definition(&ontology, "BlueThing", thing.as_str(), &[(&has_text, Cardinality::ExactlyOne)]);
    let read = create_class(&fx.responder, blue, lmd(&read)).await.unwrap();
    let blue_iri = ontology.make_entity_iri("BlueThing");
    assert!(read.classes[&blue_iri].is_subclass_of(&thing));
}

#[tokio::test]
async fn test_add_and_delete_cardinalities() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;
    let has_integer = ontology.make_entity_iri("hasInteger");
    let date = lmd(
        &create_property(&fx.responder, value_property(&ontology, "hasInteger", knora_base::INT_VALUE), date)
            .await
            .unwrap(),
    );

    // 1. Add
    let read = fx
        .responder
        .add_cardinalities(
            cardinality_request(&thing, &[(&has_integer, Cardinality::ZeroOrOne)], date),
            &system_admin(),
        )
        .await
        .unwrap();
    assert!(read.classes[&thing].definition.direct_cardinalities.contains_key(&has_integer));
    let date = lmd(&read);

    // 2. Adding the same property again
    let err = fx
        .responder
        .add_cardinalities(
            cardinality_request(&thing, &[(&has_integer, Cardinality::ZeroOrMore)], date),
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::CardinalityLegality));

    // 3. Delete must name the current cardinality
    let err = fx
        .responder
        .delete_cardinalities(
            cardinality_request(&thing, &[(&has_integer, Cardinality::ExactlyOne)], date),
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::CardinalityRemoval));

    let read = fx
        .responder
        .delete_cardinalities(
            cardinality_request(&thing, &[(&has_integer, Cardinality::ZeroOrOne)], date),
            &system_admin(),
        )
        .await
        .unwrap();
    assert!(!read.classes[&thing].all_cardinalities.contains_key(&has_integer));
}

#[tokio::test]
async fn test_cardinality_used_in_data_cannot_be_removed() {
    let fx = fixture();
    let (ontology, thing, has_text, date) = anything_with_thing(&fx.responder).await;
    add_thing_instance(&fx.store, "thing-1", true);

    let request = cardinality_request(&thing, &[(&has_text, Cardinality::ZeroOrMore)], date);
    let check = fx
        .responder
        .can_delete_cardinalities(request.clone(), &system_admin())
        .await
        .unwrap();
    assert!(!check.can_do);
    assert!(check.reason.unwrap().contains("used in data"));

    let err = fx
        .responder
        .delete_cardinalities(request, &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::CardinalityRemoval));

    // Replacing with a set that drops it is refused the same way
    let err = fx
        .responder
        .replace_cardinalities(cardinality_request(&thing, &[], date), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::CardinalityRemoval));

    // The dry run did not publish anything
    assert_eq!(current_date(&fx.responder, &ontology).await, date);
}

#[tokio::test]
async fn test_new_minimum_cardinality_checks_existing_data() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;
    let has_integer = ontology.make_entity_iri("hasInteger");
    let date = lmd(
        &create_property(&fx.responder, value_property(&ontology, "hasInteger", knora_base::INT_VALUE), date)
            .await
            .unwrap(),
    );
    add_thing_instance(&fx.store, "thing-1", false);

    let err = fx
        .responder
        .add_cardinalities(
            cardinality_request(&thing, &[(&has_integer, Cardinality::ExactlyOne)], date),
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::CardinalityLegality));

    // No minimum: fine
    assert!(fx
        .responder
        .add_cardinalities(
            cardinality_request(&thing, &[(&has_integer, Cardinality::ZeroOrOne)], date),
            &system_admin(),
        )
        .await
        .is_ok());
}

#[tokio::test]
async fn test_deleting_link_cardinality_removes_link_value_cardinality() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;
    let (link, date) = add_link_to_thing(&fx.responder, &ontology, &thing, date).await;

    let read = fx
        .responder
        .add_cardinalities(
            cardinality_request(&thing, &[(&link, Cardinality::ZeroOrMore)], date),
            &system_admin(),
        )
        .await
        .unwrap();
    let date = lmd(&read);
    assert!(read.classes[&thing]
        .definition
        .direct_cardinalities
        .contains_key(&link.link_value_property()));

    // The link value on its own cannot be removed
    let err = fx
        .responder
        .delete_cardinalities(
            cardinality_request(&thing, &[(&link.link_value_property(), Cardinality::ZeroOrMore)], date),
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::CardinalityRemoval));

    let read = fx
        .responder
        .delete_cardinalities(
            cardinality_request(&thing, &[(&link, Cardinality::ZeroOrMore)], date),
            &system_admin(),
        )
        .await
        .unwrap();
    let direct = &read.classes[&thing].definition.direct_cardinalities;
    assert!(!direct.contains_key(&link));
    assert!(!direct.contains_key(&link.link_value_property()));
}

#[tokio::test]
async fn test_change_gui_order() {
    let fx = fixture();
    let (ontology, thing, has_text, date) = anything_with_thing(&fx.responder).await;
    let (link, date) = add_link_to_thing(&fx.responder, &ontology, &thing, date).await;
    let date = lmd(
        &fx.responder
            .add_cardinalities(
                cardinality_request(&thing, &[(&link, Cardinality::ZeroOrOne)], date),
                &system_admin(),
            )
            .await
            .unwrap(),
    );

    let read = fx
        .responder
        .change_gui_order(
            ChangeGuiOrderRequest {
                class_iri: thing.clone(),
                gui_orders: [(has_text.clone(), 1), (link.clone(), 2)].into_iter().collect(),
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    let direct = &read.classes[&thing].definition.direct_cardinalities;
    assert_eq!(direct[&has_text].gui_order, Some(1));
    assert_eq!(direct[&link].gui_order, Some(2));
    assert_eq!(direct[&link.link_value_property()].gui_order, Some(2));
    // Cardinalities themselves are untouched
    assert_eq!(direct[&has_text].cardinality, Cardinality::ZeroOrMore);

    // A property without a cardinality on the class
    let err = fx
        .responder
        .change_gui_order(
            ChangeGuiOrderRequest {
                class_iri: thing.clone(),
                gui_orders: [(iri(knora_base::HAS_VALUE), 3)].into_iter().collect(),
                last_modification_date: lmd(&read),
            },
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::CardinalityLegality));
}

#[tokio::test]
async fn test_change_class_comment_and_delete_it() {
    let fx = fixture();
    let (_, thing, _, date) = anything_with_thing(&fx.responder).await;

    let read = fx
        .responder
        .change_class_labels_or_comments(
            ChangeEntityTextRequest {
                entity_iri: thing.clone(),
                predicate: TextPredicate::Comment,
                objects: [Literal::lang_string("Ein Ding", "de")].into_iter().collect(),
                last_modification_date: date,
            },
            &system_admin(),
        )
        .await
        .unwrap();
    let predicates = &read.classes[&thing].definition.predicates;
    assert_eq!(predicates.lang_value(rdfs::COMMENT, "de"), Some("Ein Ding"));
    // Replaced, not merged
    assert_eq!(predicates.lang_value(rdfs::COMMENT, "en"), None);

    // Plain strings are not accepted as labels
    let err = fx
        .responder
        .change_class_labels_or_comments(
            ChangeEntityTextRequest {
                entity_iri: thing.clone(),
                predicate: TextPredicate::Label,
                objects: [Literal::String("thing".to_string())].into_iter().collect(),
                last_modification_date: lmd(&read),
            },
            &system_admin(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::RequiredMetadata));

    let read = fx
        .responder
        .delete_class_comment(entity_target(&thing, lmd(&read)), &system_admin())
        .await
        .unwrap();
    assert!(!read.classes[&thing].definition.has_comment());
}

// ---- deletion ----

#[tokio::test]
async fn test_delete_class_guards() {
    let fx = fixture();
    let (ontology, thing, _, date) = anything_with_thing(&fx.responder).await;

    // 1. A subclass blocks deletion
    let blue = class_definition(&ontology, "BlueThing", thing.as_str(), &[]);
    let blue_iri = blue.iri.clone();
    let date = lmd(&create_class(&fx.responder, blue, date).await.unwrap());

    let check = fx.responder.can_delete_class(&thing, &system_admin()).await.unwrap();
    assert!(!check.can_do);
    let err = fx
        .responder
        .delete_class(entity_target(&thing, date), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::DeletionGuard));

    // 2. Instance data blocks deletion
    add_thing_instance(&fx.store, "thing-1", false);
    let response = fx
        .responder
        .delete_class(entity_target(&blue_iri, date), &system_admin())
        .await
        .unwrap();
    let date = response.only().unwrap().last_modification_date.unwrap();

    let check = fx.responder.can_delete_class(&thing, &system_admin()).await.unwrap();
    assert!(!check.can_do);
    assert!(check.reason.unwrap().contains("thing-1"));
    let err = fx
        .responder
        .delete_class(entity_target(&thing, date), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::DeletionGuard));
    assert!(fx.responder.get_classes(&[thing]).await.is_ok());
    assert!(fx.responder.get_classes(&[blue_iri]).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_property_guards() {
    let fx = fixture();
    let (ontology, thing, has_text, date) = anything_with_thing(&fx.responder).await;

    // Used in a cardinality
    let check = fx.responder.can_delete_property(&has_text, &system_admin()).await.unwrap();
    assert!(!check.can_do);
    let err = fx
        .responder
        .delete_property(entity_target(&has_text, date), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::DeletionGuard));

    // An unused link property goes away with its link value
    let (link, date) = add_link_to_thing(&fx.responder, &ontology, &thing, date).await;
    let check = fx.responder.can_delete_property(&link, &system_admin()).await.unwrap();
    assert!(check.can_do);
    fx.responder
        .delete_property(entity_target(&link, date), &system_admin())
        .await
        .unwrap();

    let entities = fx.responder.get_ontology_entities(&ontology).await.unwrap();
    assert!(!entities.properties.contains_key(&link));
    assert!(!entities.properties.contains_key(&link.link_value_property()));

    // Both stay gone after a reload from the store
    fx.responder.refresh_cache(&system_admin()).await.unwrap();
    for property in [link.clone(), link.link_value_property()] {
        let err = fx.responder.get_properties(&[property]).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {}", err);
    }
}

#[tokio::test]
async fn test_property_used_in_data_cannot_be_deleted() {
    let fx = fixture();
    let (ontology, _, _, date) = anything_with_thing(&fx.responder).await;
    let has_note = ontology.make_entity_iri("hasNote");
    let date = lmd(
        &create_property(&fx.responder, value_property(&ontology, "hasNote", knora_base::TEXT_VALUE), date)
            .await
            .unwrap(),
    );
    fx.store
        .load_turtle(
            ANYTHING_DATA,
            &format!("<http://rdfh.ch/0001/thing-9> <{}> \"loose note\" .", has_note.as_str()),
        )
        .unwrap();

    let err = fx
        .responder
        .delete_property(entity_target(&has_note, date), &system_admin())
        .await
        .unwrap_err();
    assert_eq!(err.rule(), Some(ValidationRule::DeletionGuard));
    assert!(err.to_string().contains("thing-9"));
}

#[tokio::test]
async fn test_project_admin_cannot_edit_other_project() {
    let fx = fixture();
    let (_, thing, _, date) = anything_with_thing(&fx.responder).await;

    let err = fx
        .responder
        .delete_class_comment(entity_target(&thing, date), &incunabula_admin())
        .await
        .unwrap_err();
    assert!(err.is_forbidden());

    let err = fx.responder.can_delete_class(&thing, &incunabula_admin()).await.unwrap_err();
    assert!(err.is_forbidden());
}
