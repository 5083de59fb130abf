//! Inheritance closures
//!
//! Closures are computed over an arena of definitions indexed by IRI and
//! memoized, so each class and property is resolved once per snapshot.
//! IRIs that are referenced but not defined (external vocabularies) are
//! treated as leaves.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use crate::entity::{
    CardinalityInfo, ClassDefinition, ClassInfo, Ontology, PropertyDefinition, PropertyInfo,
    PropertyKind,
};
use crate::errors::{OntoError, Result};
use crate::iri::vocabulary::knora_base;
use crate::iri::SmartIri;

/// Keep the last occurrence of each IRI, preserving relative order
fn dedup_keep_last(iris: Vec<SmartIri>) -> Vec<SmartIri> {
    let mut seen = HashSet::new();
    let mut result: Vec<SmartIri> = iris
        .into_iter()
        .rev()
        .filter(|iri| seen.insert(iri.clone()))
        .collect();
    result.reverse();
    result
}

pub(crate) struct ClosureBuilder<'a> {
    classes: HashMap<&'a SmartIri, &'a ClassDefinition>,
    properties: HashMap<&'a SmartIri, &'a PropertyDefinition>,
    class_memo: HashMap<SmartIri, Arc<ClassInfo>>,
    property_memo: HashMap<SmartIri, Arc<PropertyInfo>>,
    visiting: HashSet<SmartIri>,
}

impl<'a> ClosureBuilder<'a> {
    pub fn new<I>(ontologies: I) -> Self
    where
        I: IntoIterator<Item = &'a Ontology>,
    {
        let mut classes = HashMap::new();
        let mut properties = HashMap::new();
        for ontology in ontologies {
            classes.extend(ontology.classes.iter());
            properties.extend(ontology.properties.iter());
        }
        Self {
            classes,
            properties,
            class_memo: HashMap::new(),
            property_memo: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Reuse closures known to be unaffected by the change being applied
    pub fn seed(
        mut self,
        classes: impl IntoIterator<Item = Arc<ClassInfo>>,
        properties: impl IntoIterator<Item = Arc<PropertyInfo>>,
    ) -> Self {
        for info in classes {
            self.class_memo.insert(info.iri().clone(), info);
        }
        for info in properties {
            self.property_memo.insert(info.iri().clone(), info);
        }
        self
    }

    pub fn property(&mut self, iri: &SmartIri) -> Result<Arc<PropertyInfo>> {
        if let Some(info) = self.property_memo.get(iri) {
            return Ok(info.clone());
        }
        let definition = *self
            .properties
            .get(iri)
            .ok_or_else(|| OntoError::NotFound(format!("Property {} not found", iri)))?;

        if !self.visiting.insert(iri.clone()) {
            return Err(OntoError::Inconsistency(format!(
                "Cycle in rdfs:subPropertyOf at {}",
                iri
            )));
        }

        let mut all = vec![iri.clone()];
        let mut subject_type = definition.subject_type.clone();
        let mut object_type = definition.object_type.clone();

        for superproperty in &definition.subproperty_of {
            if self.properties.contains_key(superproperty) {
                let info = self.property(superproperty)?;
                all.extend(info.all_super_properties.iter().cloned());
                subject_type = subject_type.or_else(|| info.effective_subject_type.clone());
                object_type = object_type.or_else(|| info.effective_object_type.clone());
            } else {
                all.push(superproperty.clone());
            }
        }
        self.visiting.remove(iri);

        let all_super_properties = dedup_keep_last(all);
        let kind = PropertyKind::classify(iri, &all_super_properties);
        let info = Arc::new(PropertyInfo {
            definition: definition.clone(),
            all_super_properties,
            kind,
            effective_subject_type: subject_type,
            effective_object_type: object_type,
        });
        self.property_memo.insert(iri.clone(), info.clone());
        Ok(info)
    }

    /// `sub` is a strict subproperty of `sup`
    fn is_strict_subproperty(&mut self, sub: &SmartIri, sup: &SmartIri) -> Result<bool> {
        if sub == sup || !self.properties.contains_key(sub) {
            return Ok(false);
        }
        Ok(self.property(sub)?.is_subproperty_of(sup))
    }

    fn is_resource_property(&mut self, iri: &SmartIri) -> Result<bool> {
        if !self.properties.contains_key(iri) {
            return Ok(false);
        }
        Ok(self.property(iri)?.kind.is_resource_property())
    }

    /// Merge one ancestor's cardinalities into the inherited set
    ///
    /// Two ancestors may disagree only if one cardinality narrows the other;
    /// the narrower one wins.
    fn merge_inherited(
        class: &SmartIri,
        inherited: &mut BTreeMap<SmartIri, CardinalityInfo>,
        from: &BTreeMap<SmartIri, CardinalityInfo>,
    ) -> Result<()> {
        for (property, info) in from {
            match inherited.get(property) {
                None => {
                    inherited.insert(property.clone(), *info);
                }
                Some(existing) if existing.cardinality == info.cardinality => {}
                Some(existing) if info.cardinality.is_subsumed_by(existing.cardinality) => {
                    inherited.insert(property.clone(), *info);
                }
                Some(existing) if existing.cardinality.is_subsumed_by(info.cardinality) => {}
                Some(existing) => {
                    return Err(OntoError::Inconsistency(format!(
                        "Class {} inherits conflicting cardinalities {} and {} for {}",
                        class, existing.cardinality, info.cardinality, property
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn class(&mut self, iri: &SmartIri) -> Result<Arc<ClassInfo>> {
        if let Some(info) = self.class_memo.get(iri) {
            return Ok(info.clone());
        }
        let definition = *self
            .classes
            .get(iri)
            .ok_or_else(|| OntoError::NotFound(format!("Class {} not found", iri)))?;

        if !self.visiting.insert(iri.clone()) {
            return Err(OntoError::Inconsistency(format!(
                "Cycle in rdfs:subClassOf at {}",
                iri
            )));
        }

        let mut bases = vec![iri.clone()];
        let mut inherited = BTreeMap::new();
        for superclass in &definition.subclass_of {
            if self.classes.contains_key(superclass) {
                let info = self.class(superclass)?;
                bases.extend(info.all_base_classes.iter().cloned());
                Self::merge_inherited(iri, &mut inherited, &info.all_cardinalities)?;
            } else {
                bases.push(superclass.clone());
            }
        }
        self.visiting.remove(iri);

        // A direct cardinality on P replaces inherited ones on P and on
        // any superproperty of P.
        let direct = &definition.direct_cardinalities;
        let mut all_cardinalities = BTreeMap::new();
        let mut inherited_cardinalities = BTreeSet::new();
        for (property, info) in inherited {
            let mut overridden = direct.contains_key(&property);
            for direct_property in direct.keys() {
                if overridden {
                    break;
                }
                overridden = self.is_strict_subproperty(direct_property, &property)?;
            }
            if !overridden {
                inherited_cardinalities.insert(property.clone());
                all_cardinalities.insert(property, info);
            }
        }
        for (property, info) in direct {
            all_cardinalities.insert(property.clone(), *info);
        }

        let mut all_resource_property_cardinalities = BTreeMap::new();
        for (property, info) in &all_cardinalities {
            if self.is_resource_property(property)? {
                all_resource_property_cardinalities.insert(property.clone(), *info);
            }
        }

        let all_base_classes = dedup_keep_last(bases);
        let has_base = |base: &str| all_base_classes.iter().any(|b| b.as_str() == base);
        let is_resource_class = has_base(knora_base::RESOURCE);
        let is_value_class = has_base(knora_base::VALUE);

        trace!(class = %iri, bases = all_base_classes.len(), "Computed class closure");

        let info = Arc::new(ClassInfo {
            definition: definition.clone(),
            all_base_classes,
            all_cardinalities,
            all_resource_property_cardinalities,
            inherited_cardinalities,
            is_resource_class,
            is_value_class,
        });
        self.class_memo.insert(iri.clone(), info.clone());
        Ok(info)
    }

    /// Resolve every definition in the arena
    pub fn build_all(
        mut self,
    ) -> Result<(HashMap<SmartIri, Arc<ClassInfo>>, HashMap<SmartIri, Arc<PropertyInfo>>)> {
        let property_iris: Vec<&SmartIri> = self.properties.keys().copied().collect();
        for iri in property_iris {
            self.property(iri)?;
        }
        let class_iris: Vec<&SmartIri> = self.classes.keys().copied().collect();
        for iri in class_iris {
            self.class(iri)?;
        }

        // Seeded entries whose definitions are gone are dropped
        let classes = self.classes;
        let properties = self.properties;
        let class_memo = self
            .class_memo
            .into_iter()
            .filter(|(iri, _)| classes.contains_key(iri))
            .collect();
        let property_memo = self
            .property_memo
            .into_iter()
            .filter(|(iri, _)| properties.contains_key(iri))
            .collect();
        Ok((class_memo, property_memo))
    }
}
