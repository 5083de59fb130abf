//! Immutable cache snapshot
//!
//! A snapshot is never modified after it is built. Replacing or removing an
//! ontology produces a new snapshot that shares every closure the change
//! cannot have affected.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::cache::builtin::builtin_ontologies;
use crate::cache::closure::ClosureBuilder;
use crate::entity::{ClassInfo, Ontology, PropertyInfo};
use crate::errors::Result;
use crate::iri::SmartIri;

#[derive(Debug, Clone, Default)]
pub struct OntologyCacheData {
    ontologies: BTreeMap<SmartIri, Arc<Ontology>>,
    classes: HashMap<SmartIri, Arc<ClassInfo>>,
    properties: HashMap<SmartIri, Arc<PropertyInfo>>,
    entity_ontology: HashMap<SmartIri, SmartIri>,
    direct_subclasses: HashMap<SmartIri, BTreeSet<SmartIri>>,
    direct_subproperties: HashMap<SmartIri, BTreeSet<SmartIri>>,
}

impl OntologyCacheData {
    /// Build a snapshot from scratch; built-in ontologies are always added
    pub fn build(ontologies: Vec<Ontology>) -> Result<Self> {
        let mut by_iri: BTreeMap<SmartIri, Arc<Ontology>> = BTreeMap::new();
        for ontology in builtin_ontologies().into_iter().chain(ontologies) {
            if by_iri.contains_key(ontology.iri()) && ontology.iri().is_built_in() {
                continue;
            }
            by_iri.insert(ontology.iri().clone(), Arc::new(ontology));
        }

        let (classes, properties) =
            ClosureBuilder::new(by_iri.values().map(|o| o.as_ref())).build_all()?;
        Ok(Self::assemble(by_iri, classes, properties))
    }

    fn assemble(
        ontologies: BTreeMap<SmartIri, Arc<Ontology>>,
        classes: HashMap<SmartIri, Arc<ClassInfo>>,
        properties: HashMap<SmartIri, Arc<PropertyInfo>>,
    ) -> Self {
        let mut entity_ontology = HashMap::new();
        let mut direct_subclasses: HashMap<SmartIri, BTreeSet<SmartIri>> = HashMap::new();
        let mut direct_subproperties: HashMap<SmartIri, BTreeSet<SmartIri>> = HashMap::new();

        for (ontology_iri, ontology) in &ontologies {
            for (class_iri, class) in &ontology.classes {
                entity_ontology.insert(class_iri.clone(), ontology_iri.clone());
                for superclass in &class.subclass_of {
                    direct_subclasses
                        .entry(superclass.clone())
                        .or_default()
                        .insert(class_iri.clone());
                }
            }
            for (property_iri, property) in &ontology.properties {
                entity_ontology.insert(property_iri.clone(), ontology_iri.clone());
                for superproperty in &property.subproperty_of {
                    direct_subproperties
                        .entry(superproperty.clone())
                        .or_default()
                        .insert(property_iri.clone());
                }
            }
        }

        Self {
            ontologies,
            classes,
            properties,
            entity_ontology,
            direct_subclasses,
            direct_subproperties,
        }
    }

    /// New snapshot with `changed` replaced by `replacement`, or removed
    ///
    /// Only closures that can observe an entity of `changed` are recomputed.
    pub fn rebuild(&self, changed: &SmartIri, replacement: Option<Ontology>) -> Result<Self> {
        let mut touched: HashSet<SmartIri> = HashSet::new();
        if let Some(old) = self.ontologies.get(changed) {
            touched.extend(old.entity_iris().cloned());
        }
        if let Some(new) = &replacement {
            touched.extend(new.entity_iris().cloned());
        }

        let mut ontologies = self.ontologies.clone();
        match replacement {
            Some(ontology) => {
                ontologies.insert(changed.clone(), Arc::new(ontology));
            }
            None => {
                ontologies.remove(changed);
            }
        }

        let reusable_properties: Vec<Arc<PropertyInfo>> = self
            .properties
            .values()
            .filter(|info| !info.all_super_properties.iter().any(|p| touched.contains(p)))
            .cloned()
            .collect();
        let affected_properties: HashSet<&SmartIri> = self
            .properties
            .values()
            .filter(|info| info.all_super_properties.iter().any(|p| touched.contains(p)))
            .map(|info| info.iri())
            .collect();

        let reusable_classes: Vec<Arc<ClassInfo>> = self
            .classes
            .values()
            .filter(|info| {
                let base_touched = info.all_base_classes.iter().any(|c| touched.contains(c));
                let cardinality_touched = info
                    .definition
                    .direct_cardinalities
                    .keys()
                    .chain(info.all_cardinalities.keys())
                    .any(|p| touched.contains(p) || affected_properties.contains(p));
                !base_touched && !cardinality_touched
            })
            .cloned()
            .collect();

        debug!(
            ontology = %changed,
            reused_classes = reusable_classes.len(),
            reused_properties = reusable_properties.len(),
            "Rebuilding cache snapshot"
        );

        let (classes, properties) = ClosureBuilder::new(ontologies.values().map(|o| o.as_ref()))
            .seed(reusable_classes, reusable_properties)
            .build_all()?;
        Ok(Self::assemble(ontologies, classes, properties))
    }

    pub fn ontology(&self, iri: &SmartIri) -> Option<&Arc<Ontology>> {
        self.ontologies.get(iri)
    }

    pub fn ontologies(&self) -> impl Iterator<Item = &Arc<Ontology>> {
        self.ontologies.values()
    }

    pub fn class(&self, iri: &SmartIri) -> Option<&Arc<ClassInfo>> {
        self.classes.get(iri)
    }

    pub fn property(&self, iri: &SmartIri) -> Option<&Arc<PropertyInfo>> {
        self.properties.get(iri)
    }

    pub fn is_class(&self, iri: &SmartIri) -> bool {
        self.classes.contains_key(iri)
    }

    pub fn is_property(&self, iri: &SmartIri) -> bool {
        self.properties.contains_key(iri)
    }

    /// Ontology defining `entity`
    pub fn ontology_of(&self, entity: &SmartIri) -> Option<&SmartIri> {
        self.entity_ontology.get(entity)
    }

    /// Ontologies attached to `project`, sorted by IRI
    pub fn ontologies_for_project(&self, project: &SmartIri) -> Vec<&Arc<Ontology>> {
        self.ontologies
            .values()
            .filter(|o| o.metadata.project_iri.as_ref() == Some(project))
            .collect()
    }

    pub fn direct_subclasses(&self, class: &SmartIri) -> Vec<&SmartIri> {
        self.direct_subclasses
            .get(class)
            .map(|subs| subs.iter().collect())
            .unwrap_or_default()
    }

    pub fn direct_subproperties(&self, property: &SmartIri) -> Vec<&SmartIri> {
        self.direct_subproperties
            .get(property)
            .map(|subs| subs.iter().collect())
            .unwrap_or_default()
    }

    /// `class` and every class that has it as an ancestor
    pub fn class_and_subclasses(&self, class: &SmartIri) -> Vec<SmartIri> {
        let mut result: Vec<SmartIri> = self
            .classes
            .values()
            .filter(|info| info.is_subclass_of(class))
            .map(|info| info.iri().clone())
            .collect();
        result.sort();
        result
    }

    /// Classes declaring a direct cardinality on `property`
    pub fn classes_with_cardinality_on(&self, property: &SmartIri) -> Vec<SmartIri> {
        let mut result: Vec<SmartIri> = self
            .classes
            .values()
            .filter(|info| info.definition.direct_cardinalities.contains_key(property))
            .map(|info| info.iri().clone())
            .collect();
        result.sort();
        result
    }

    /// Ontologies that `ontology` refers to or that refer to it
    pub fn related_ontologies(&self, ontology: &Ontology) -> BTreeSet<SmartIri> {
        let mut related = ontology.referenced_ontologies();
        for other in self.ontologies.values() {
            if other.iri() != ontology.iri() && other.referenced_ontologies().contains(ontology.iri()) {
                related.insert(other.iri().clone());
            }
        }
        related
    }

    /// Properties whose declared subject or object type is `class`
    pub fn properties_constrained_to(&self, class: &SmartIri) -> Vec<SmartIri> {
        let mut result: Vec<SmartIri> = self
            .properties
            .values()
            .filter(|info| {
                info.definition.subject_type.as_ref() == Some(class)
                    || info.definition.object_type.as_ref() == Some(class)
            })
            .map(|info| info.iri().clone())
            .collect();
        result.sort();
        result
    }
}
