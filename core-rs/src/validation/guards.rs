//! Existing-data checks
//!
//! These run synchronously against the persistence service during
//! validation. Each one is a single SPARQL round trip.

use tracing::debug;

use crate::cache::OntologyCacheData;
use crate::entity::Cardinality;
use crate::errors::{OntoError, Result, ValidationRule};
use crate::iri::SmartIri;
use crate::triplestore::{SparqlQuery, TriplestoreService};

/// Subjects outside `graph` that refer to any of `entities`
pub async fn referencing_subjects(
    triplestore: &dyn TriplestoreService,
    entities: &[SmartIri],
    graph: &SmartIri,
) -> Result<Vec<SmartIri>> {
    if entities.is_empty() {
        return Ok(Vec::new());
    }
    let rows = triplestore
        .select(&SparqlQuery::subjects_referencing(entities, graph))
        .await?;
    let mut subjects: Vec<SmartIri> = rows
        .iter()
        .filter_map(|row| row.get("s").and_then(|node| node.as_iri()))
        .map(SmartIri::from_trusted)
        .collect();
    subjects.sort();
    subjects.dedup();
    Ok(subjects)
}

/// Reject with every referencing subject listed
pub async fn check_not_referenced(
    triplestore: &dyn TriplestoreService,
    entities: &[SmartIri],
    graph: &SmartIri,
    what: &str,
) -> Result<()> {
    let subjects = referencing_subjects(triplestore, entities, graph).await?;
    if subjects.is_empty() {
        return Ok(());
    }
    Err(OntoError::bad_request(
        ValidationRule::DeletionGuard,
        format!(
            "{} cannot be deleted, it is used by: {}",
            what,
            subjects.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
        ),
    ))
}

/// A cardinality can be removed if it is direct and no instance of the
/// class or its subclasses has a value for the property
pub async fn check_cardinality_removable(
    triplestore: &dyn TriplestoreService,
    snapshot: &OntologyCacheData,
    class: &SmartIri,
    property: &SmartIri,
) -> Result<()> {
    let info = snapshot
        .class(class)
        .ok_or_else(|| OntoError::NotFound(format!("Class {} not found", class)))?;

    if !info.definition.direct_cardinalities.contains_key(property) {
        let reason = if info.is_inherited(property) {
            "is inherited and can only be removed from the class that declares it"
        } else {
            "does not exist"
        };
        return Err(OntoError::bad_request(
            ValidationRule::CardinalityRemoval,
            format!("The cardinality of {} on {} {}", class, property, reason),
        ));
    }

    let classes = snapshot.class_and_subclasses(class);
    let used = triplestore
        .ask(&SparqlQuery::instances_using_property(&classes, property))
        .await?;
    debug!(class = %class, property = %property, used, "Checked cardinality usage");
    if used {
        return Err(OntoError::bad_request(
            ValidationRule::CardinalityRemoval,
            format!(
                "The cardinality of {} on {} cannot be removed, the property is used in data",
                class, property
            ),
        ));
    }
    Ok(())
}

/// Existing instances must still satisfy `next`
///
/// A new minimum of one needs every instance to have a value. Lifting a
/// max-1 bound is refused while the property is used. Narrowing the
/// maximum alone never needs a data check.
pub async fn check_cardinality_change(
    triplestore: &dyn TriplestoreService,
    snapshot: &OntologyCacheData,
    class: &SmartIri,
    property: &SmartIri,
    previous: Option<Cardinality>,
    next: Cardinality,
) -> Result<()> {
    let adds_minimum = next.requires_value() && !previous.map(|p| p.requires_value()).unwrap_or(false);
    let widens = previous.map(|p| next.widens_max_of(p)).unwrap_or(false);
    if !adds_minimum && !widens {
        return Ok(());
    }

    let classes = snapshot.class_and_subclasses(class);
    if adds_minimum
        && triplestore
            .ask(&SparqlQuery::instances_lacking_property(&classes, property))
            .await?
    {
        return Err(OntoError::bad_request(
            ValidationRule::CardinalityLegality,
            format!(
                "Cardinality {} on {} for {} would be violated by existing instances without a value",
                next, property, class
            ),
        ));
    }
    if widens
        && triplestore
            .ask(&SparqlQuery::instances_using_property(&classes, property))
            .await?
    {
        return Err(OntoError::bad_request(
            ValidationRule::CardinalityLegality,
            format!(
                "The cardinality of {} on {} cannot be widened to {}, the property is used in data",
                class, property, next
            ),
        ));
    }
    Ok(())
}
