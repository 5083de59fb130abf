//! Structural rules checked against the candidate snapshot
//!
//! A mutation is applied to a copy of its ontology and a candidate snapshot
//! is built from it. The rules below inspect that candidate, so every check
//! sees the closures the mutation would publish.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::OntologyCacheData;
use crate::entity::{CardinalityInfo, ClassInfo, Ontology, OntologyMetadata, PropertyInfo, PropertyKind};
use crate::errors::{OntoError, Result, ValidationRule};
use crate::iri::vocabulary::knora_base;
use crate::iri::SmartIri;
use crate::project::EngineConfig;

fn bad(rule: ValidationRule, message: String) -> OntoError {
    OntoError::bad_request(rule, message)
}

fn join(iris: &[SmartIri]) -> String {
    iris.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

pub fn check_not_built_in(ontology: &SmartIri) -> Result<()> {
    if ontology.is_built_in() {
        return Err(bad(
            ValidationRule::BuiltInOntology,
            format!("Built-in ontology {} cannot be modified", ontology),
        ));
    }
    Ok(())
}

/// Shared ontologies live in the shared-ontologies project and nowhere else
pub fn check_ontology_project(config: &EngineConfig, project: &SmartIri, is_shared: bool) -> Result<()> {
    let in_shared_project = project.as_str() == config.spec.shared_ontologies_project;
    match (is_shared, in_shared_project) {
        (true, false) => Err(bad(
            ValidationRule::SharingBoundary,
            format!(
                "Shared ontologies must be created in <{}>, not {}",
                config.spec.shared_ontologies_project, project
            ),
        )),
        (false, true) => Err(bad(
            ValidationRule::SharingBoundary,
            format!("Project {} may only contain shared ontologies", project),
        )),
        _ => Ok(()),
    }
}

/// An IRI is unused as class and as property
pub fn check_entity_iri_unused(current: &OntologyCacheData, ontology: &Ontology, iri: &SmartIri) -> Result<()> {
    if ontology.contains_entity(iri) || current.is_class(iri) || current.is_property(iri) {
        return Err(bad(ValidationRule::Uniqueness, format!("{} already exists", iri)));
    }
    Ok(())
}

/// Candidate snapshot with `working` in place of its published version
///
/// Closure conflicts surface here as cardinality violations.
pub fn candidate_snapshot(current: &OntologyCacheData, working: Ontology) -> Result<OntologyCacheData> {
    let iri = working.iri().clone();
    current.rebuild(&iri, Some(working)).map_err(|e| match e {
        OntoError::Inconsistency(message) => bad(ValidationRule::CardinalityLegality, message),
        other => other,
    })
}

/// Rules evaluated against a candidate snapshot
pub struct RuleContext<'a> {
    pub snapshot: &'a OntologyCacheData,
    pub config: &'a EngineConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(snapshot: &'a OntologyCacheData, config: &'a EngineConfig) -> Self {
        Self { snapshot, config }
    }

    fn class(&self, iri: &SmartIri) -> Result<&'a Arc<ClassInfo>> {
        self.snapshot
            .class(iri)
            .ok_or_else(|| OntoError::NotFound(format!("Class {} not found", iri)))
    }

    fn property(&self, iri: &SmartIri) -> Result<&'a Arc<PropertyInfo>> {
        self.snapshot
            .property(iri)
            .ok_or_else(|| OntoError::NotFound(format!("Property {} not found", iri)))
    }

    fn metadata_of(&self, entity: &SmartIri) -> Result<&'a OntologyMetadata> {
        let ontology = self
            .snapshot
            .ontology_of(entity)
            .and_then(|iri| self.snapshot.ontology(iri))
            .ok_or_else(|| OntoError::NotFound(format!("No ontology defines {}", entity)))?;
        Ok(&ontology.metadata)
    }

    fn is_subclass(&self, class: &SmartIri, of: &SmartIri) -> bool {
        class == of
            || self
                .snapshot
                .class(class)
                .map(|info| info.is_subclass_of(of))
                .unwrap_or(false)
    }

    /// Cross-ontology reference boundary
    ///
    /// Entities of built-in and shared ontologies can be used anywhere.
    /// Project ontologies may use entities of their own project. Non-Knora
    /// IRIs must come from a whitelisted vocabulary.
    pub fn check_reference(&self, from: &OntologyMetadata, referenced: &SmartIri, usage: &str) -> Result<()> {
        if !referenced.is_knora_iri() {
            if self.config.is_reusable(referenced.as_str()) {
                return Ok(());
            }
            return Err(bad(
                ValidationRule::SharingBoundary,
                format!("{} is not from a reusable vocabulary and cannot be used as {}", referenced, usage),
            ));
        }

        let owner = match referenced.ontology_iri() {
            Some(owner) => owner,
            None => return Ok(()),
        };
        if owner == from.ontology_iri || owner.is_built_in() {
            return Ok(());
        }
        let owner_metadata = match self.snapshot.ontology(&owner) {
            Some(ontology) => &ontology.metadata,
            None => return Ok(()),
        };

        let owner_shared = owner_metadata.is_shared || owner.is_shared();
        let from_shared = from.is_shared || from.ontology_iri.is_shared();
        if from_shared && !owner_shared {
            return Err(bad(
                ValidationRule::SharingBoundary,
                format!(
                    "Shared ontology {} cannot use {} from non-shared ontology {} as {}",
                    from.ontology_iri, referenced, owner, usage
                ),
            ));
        }
        if !owner_shared && owner_metadata.project_iri != from.project_iri {
            return Err(bad(
                ValidationRule::SharingBoundary,
                format!(
                    "{} belongs to another project's ontology {} and cannot be used as {}",
                    referenced, owner, usage
                ),
            ));
        }
        Ok(())
    }

    /// Base classes of a new class
    pub fn check_superclasses(&self, class_iri: &SmartIri) -> Result<()> {
        let info = self.class(class_iri)?;
        let from = self.metadata_of(class_iri)?;

        for superclass in &info.definition.subclass_of {
            if superclass == class_iri {
                return Err(bad(
                    ValidationRule::Compatibility,
                    format!("{} cannot be its own base class", class_iri),
                ));
            }
            self.check_reference(from, superclass, "a base class")?;
            match self.snapshot.class(superclass) {
                Some(base) if base.is_resource_class => {}
                Some(_) => {
                    return Err(bad(
                        ValidationRule::TypeConstraint,
                        format!("Base class {} is not a resource class", superclass),
                    ))
                }
                None if superclass.is_knora_iri() => {
                    return Err(bad(
                        ValidationRule::TypeConstraint,
                        format!("Base class {} does not exist", superclass),
                    ))
                }
                None => {}
            }
        }

        if !info.is_resource_class {
            return Err(bad(
                ValidationRule::TypeConstraint,
                format!("{} must be a subclass of <{}>", class_iri, knora_base::RESOURCE),
            ));
        }
        Ok(())
    }

    /// Cardinalities submitted by the client for `class_iri`
    pub fn check_cardinality_targets(
        &self,
        class_iri: &SmartIri,
        submitted: &BTreeMap<SmartIri, CardinalityInfo>,
    ) -> Result<()> {
        let info = self.class(class_iri)?;
        let from = self.metadata_of(class_iri)?;

        for (property_iri, cardinality) in submitted {
            self.check_reference(from, property_iri, "a cardinality")?;
            let property = self.snapshot.property(property_iri).ok_or_else(|| {
                bad(
                    ValidationRule::CardinalityLegality,
                    format!("Property {} does not exist", property_iri),
                )
            })?;

            if property.kind.is_link_value() {
                return Err(bad(
                    ValidationRule::CardinalityLegality,
                    format!(
                        "Cardinalities on link value property {} are derived from its link property",
                        property_iri
                    ),
                ));
            }
            if !property.kind.is_resource_property() {
                return Err(bad(
                    ValidationRule::CardinalityLegality,
                    format!("{} cannot be given a cardinality", property_iri),
                ));
            }
            if !cardinality
                .cardinality
                .is_compatible_with_value_type(property.is_boolean())
            {
                return Err(bad(
                    ValidationRule::CardinalityLegality,
                    format!(
                        "Boolean property {} cannot have cardinality {}",
                        property_iri, cardinality.cardinality
                    ),
                ));
            }
            if let Some(subject) = &property.effective_subject_type {
                if !info.is_subclass_of(subject) {
                    return Err(bad(
                        ValidationRule::Compatibility,
                        format!(
                            "{} has subject type {}, which {} is not a subclass of",
                            property_iri, subject, class_iri
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Direct cardinalities of `class_iri` and all its subclasses against
    /// what they inherit
    pub fn check_cardinality_overrides(&self, class_iri: &SmartIri) -> Result<()> {
        for target in self.snapshot.class_and_subclasses(class_iri) {
            self.check_direct_cardinalities(&target)?;
        }
        Ok(())
    }

    fn check_direct_cardinalities(&self, class_iri: &SmartIri) -> Result<()> {
        let info = self.class(class_iri)?;
        let direct = &info.definition.direct_cardinalities;

        for (property_iri, cardinality) in direct {
            let property = match self.snapshot.property(property_iri) {
                Some(property) => property,
                None => continue,
            };

            for other in direct.keys() {
                if other != property_iri && property.is_subproperty_of(other) {
                    return Err(bad(
                        ValidationRule::CardinalityLegality,
                        format!(
                            "{} has cardinalities on both {} and its superproperty {}",
                            class_iri, property_iri, other
                        ),
                    ));
                }
            }

            for base in &info.definition.subclass_of {
                let Some(base_info) = self.snapshot.class(base) else {
                    continue;
                };
                for (inherited_property, inherited) in &base_info.all_cardinalities {
                    if !property.is_subproperty_of(inherited_property) {
                        continue;
                    }
                    if !cardinality.cardinality.is_subsumed_by(inherited.cardinality) {
                        return Err(bad(
                            ValidationRule::CardinalityLegality,
                            format!(
                                "Cardinality {} of {} on {} is less restrictive than {} inherited from {} on {}",
                                cardinality.cardinality,
                                class_iri,
                                property_iri,
                                inherited.cardinality,
                                base,
                                inherited_property
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Taxonomy and type constraints of a new property
    pub fn check_property(&self, property_iri: &SmartIri) -> Result<()> {
        let info = self.property(property_iri)?;
        let from = self.metadata_of(property_iri)?;
        let definition = &info.definition;

        if definition.subproperty_of.is_empty() {
            return Err(bad(
                ValidationRule::PropertyTaxonomy,
                format!("{} must have at least one base property", property_iri),
            ));
        }
        for superproperty in &definition.subproperty_of {
            if superproperty == property_iri {
                return Err(bad(
                    ValidationRule::Compatibility,
                    format!("{} cannot be its own base property", property_iri),
                ));
            }
            self.check_reference(from, superproperty, "a base property")?;
            if superproperty.is_knora_iri() && !self.snapshot.is_property(superproperty) {
                return Err(bad(
                    ValidationRule::PropertyTaxonomy,
                    format!("Base property {} does not exist", superproperty),
                ));
            }
        }

        self.check_taxonomy(info)?;
        self.check_type_constraints(info, from)?;
        self.check_narrowing(info)?;

        debug!(property = %property_iri, kind = ?info.kind, "Property passed structural rules");
        Ok(())
    }

    fn check_taxonomy(&self, info: &PropertyInfo) -> Result<()> {
        if info.is_subproperty_of(&SmartIri::from_trusted(knora_base::HAS_LINK_TO_VALUE)) {
            return Err(bad(
                ValidationRule::PropertyTaxonomy,
                format!(
                    "{} cannot be a subproperty of <{}>: link value properties are created with their link property",
                    info.iri(),
                    knora_base::HAS_LINK_TO_VALUE
                ),
            ));
        }

        let is_value = info.is_subproperty_of(&SmartIri::from_trusted(knora_base::HAS_VALUE));
        let is_link = info.is_subproperty_of(&SmartIri::from_trusted(knora_base::HAS_LINK_TO));
        match (is_value, is_link) {
            (true, true) => Err(bad(
                ValidationRule::PropertyTaxonomy,
                format!(
                    "{} cannot be a subproperty of both <{}> and <{}>",
                    info.iri(),
                    knora_base::HAS_VALUE,
                    knora_base::HAS_LINK_TO
                ),
            )),
            (false, false) => Err(bad(
                ValidationRule::PropertyTaxonomy,
                format!(
                    "{} must be a subproperty of <{}> or <{}>",
                    info.iri(),
                    knora_base::HAS_VALUE,
                    knora_base::HAS_LINK_TO
                ),
            )),
            _ => Ok(()),
        }
    }

    fn check_type_constraints(&self, info: &PropertyInfo, from: &OntologyMetadata) -> Result<()> {
        let definition = &info.definition;

        let object = definition.object_type.as_ref().ok_or_else(|| {
            bad(
                ValidationRule::TypeConstraint,
                format!("{} must declare an object type", info.iri()),
            )
        })?;
        self.check_reference(from, object, "an object type")?;
        let object_info = self.snapshot.class(object).ok_or_else(|| {
            bad(
                ValidationRule::TypeConstraint,
                format!("Object type {} of {} is not a known class", object, info.iri()),
            )
        })?;

        match &info.kind {
            PropertyKind::Link { .. } => {
                if !object_info.is_resource_class {
                    return Err(bad(
                        ValidationRule::TypeConstraint,
                        format!(
                            "Link property {} must point at a resource class, not {}",
                            info.iri(),
                            object
                        ),
                    ));
                }
            }
            _ => {
                let generic = [knora_base::VALUE, knora_base::LINK_VALUE, knora_base::FILE_VALUE];
                let is_link_value = object_info.is_subclass_of(&SmartIri::from_trusted(knora_base::LINK_VALUE));
                if !object_info.is_value_class || generic.contains(&object.as_str()) || is_link_value {
                    return Err(bad(
                        ValidationRule::TypeConstraint,
                        format!(
                            "Value property {} must have a concrete value type as object, not {}",
                            info.iri(),
                            object
                        ),
                    ));
                }
            }
        }

        if let Some(subject) = &definition.subject_type {
            self.check_reference(from, subject, "a subject type")?;
            let subject_is_resource = self
                .snapshot
                .class(subject)
                .map(|c| c.is_resource_class)
                .unwrap_or(false);
            if !subject_is_resource {
                return Err(bad(
                    ValidationRule::TypeConstraint,
                    format!("Subject type {} of {} must be an existing resource class", subject, info.iri()),
                ));
            }
        }
        Ok(())
    }

    /// Declared constraints may only narrow those of each superproperty
    fn check_narrowing(&self, info: &PropertyInfo) -> Result<()> {
        let definition = &info.definition;
        for superproperty in &definition.subproperty_of {
            let Some(super_info) = self.snapshot.property(superproperty) else {
                continue;
            };
            let pairs = [
                ("subject", &definition.subject_type, &super_info.effective_subject_type),
                ("object", &definition.object_type, &super_info.effective_object_type),
            ];
            for (position, own, inherited) in pairs {
                if let (Some(own), Some(inherited)) = (own, inherited) {
                    if !self.is_subclass(own, inherited) {
                        return Err(bad(
                            ValidationRule::Compatibility,
                            format!(
                                "The {} type {} of {} is not a subclass of {}, the {} type of its base property {}",
                                position,
                                own,
                                info.iri(),
                                inherited,
                                position,
                                superproperty
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// A class is deletable once nothing in the cache refers to it
pub fn check_class_deletable(snapshot: &OntologyCacheData, class: &SmartIri) -> Result<()> {
    let subclasses: Vec<SmartIri> = snapshot.direct_subclasses(class).into_iter().cloned().collect();
    if !subclasses.is_empty() {
        return Err(bad(
            ValidationRule::DeletionGuard,
            format!("{} cannot be deleted, it has subclasses: {}", class, join(&subclasses)),
        ));
    }

    let constrained = snapshot.properties_constrained_to(class);
    if !constrained.is_empty() {
        return Err(bad(
            ValidationRule::DeletionGuard,
            format!(
                "{} cannot be deleted, it is the subject or object type of: {}",
                class,
                join(&constrained)
            ),
        ));
    }
    Ok(())
}

/// A property is deletable once no class has a cardinality on it or its
/// link value, and it has no subproperties
pub fn check_property_deletable(snapshot: &OntologyCacheData, property: &PropertyInfo) -> Result<()> {
    let mut targets = vec![property.iri().clone()];
    match &property.kind {
        PropertyKind::LinkValue { link_property } => {
            return Err(bad(
                ValidationRule::DeletionGuard,
                format!(
                    "{} is a link value property and is deleted with its link property {}",
                    property.iri(),
                    link_property
                ),
            ));
        }
        PropertyKind::Link { link_value_property } => targets.push(link_value_property.clone()),
        _ => {}
    }

    let mut classes: Vec<SmartIri> = targets
        .iter()
        .flat_map(|t| snapshot.classes_with_cardinality_on(t))
        .collect();
    classes.sort();
    classes.dedup();
    if !classes.is_empty() {
        return Err(bad(
            ValidationRule::DeletionGuard,
            format!(
                "{} cannot be deleted, it is used in cardinalities of: {}",
                property.iri(),
                join(&classes)
            ),
        ));
    }

    let subproperties: Vec<SmartIri> = targets
        .iter()
        .flat_map(|t| snapshot.direct_subproperties(t))
        .filter(|p| !targets.contains(*p))
        .cloned()
        .collect();
    if !subproperties.is_empty() {
        return Err(bad(
            ValidationRule::DeletionGuard,
            format!(
                "{} cannot be deleted, it has subproperties: {}",
                property.iri(),
                join(&subproperties)
            ),
        ));
    }
    Ok(())
}
