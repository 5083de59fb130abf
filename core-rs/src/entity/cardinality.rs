//! Cardinality lattice
//!
//! The four OWL cardinalities used by Knora ontologies, ordered by their
//! `[min, max]` bounds. A cardinality narrows another when its interval is
//! contained in the other's.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{OntoError, Result, ValidationRule};
use crate::iri::vocabulary::owl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cardinality {
    /// owl:maxCardinality 1
    ZeroOrOne,
    /// owl:cardinality 1
    ExactlyOne,
    /// owl:minCardinality 0
    ZeroOrMore,
    /// owl:minCardinality 1
    OneOrMore,
}

impl Cardinality {
    pub const fn min(&self) -> u32 {
        match self {
            Self::ZeroOrOne | Self::ZeroOrMore => 0,
            Self::ExactlyOne | Self::OneOrMore => 1,
        }
    }

    /// Upper bound, `None` when unbounded
    pub const fn max(&self) -> Option<u32> {
        match self {
            Self::ZeroOrOne | Self::ExactlyOne => Some(1),
            Self::ZeroOrMore | Self::OneOrMore => None,
        }
    }

    /// True if `self` is at least as restrictive as `other` on both bounds
    ///
    /// # Examples
    ///
    /// ```
    /// use onto_cache::entity::Cardinality;
    ///
    /// assert!(Cardinality::ExactlyOne.is_subsumed_by(Cardinality::ZeroOrMore));
    /// assert!(!Cardinality::ZeroOrMore.is_subsumed_by(Cardinality::ZeroOrOne));
    /// ```
    pub fn is_subsumed_by(&self, other: Cardinality) -> bool {
        let max_ok = match (self.max(), Cardinality::max(&other)) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a <= b,
        };
        self.min() >= Cardinality::min(&other) && max_ok
    }

    /// Changing from `previous` to `self` lifts a max-1 bound
    pub fn widens_max_of(&self, previous: Cardinality) -> bool {
        Cardinality::max(&previous).is_some() && self.max().is_none()
    }

    /// Requires at least one value per instance
    pub fn requires_value(&self) -> bool {
        self.min() > 0
    }

    /// Boolean value properties hold at most one value
    pub fn is_compatible_with_value_type(&self, property_is_boolean: bool) -> bool {
        !property_is_boolean || self.max().is_some()
    }

    /// OWL restriction predicate and value
    pub const fn to_owl(&self) -> (&'static str, u32) {
        match self {
            Self::ZeroOrOne => (owl::MAX_CARDINALITY, 1),
            Self::ExactlyOne => (owl::CARDINALITY, 1),
            Self::ZeroOrMore => (owl::MIN_CARDINALITY, 0),
            Self::OneOrMore => (owl::MIN_CARDINALITY, 1),
        }
    }

    pub fn from_owl(predicate: &str, value: u32) -> Result<Self> {
        match (predicate, value) {
            (owl::MAX_CARDINALITY, 1) => Ok(Self::ZeroOrOne),
            (owl::CARDINALITY, 1) => Ok(Self::ExactlyOne),
            (owl::MIN_CARDINALITY, 0) => Ok(Self::ZeroOrMore),
            (owl::MIN_CARDINALITY, 1) => Ok(Self::OneOrMore),
            _ => Err(OntoError::bad_request(
                ValidationRule::CardinalityLegality,
                format!("Unsupported cardinality: <{}> {}", predicate, value),
            )),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::ZeroOrOne => "0-1",
            Self::ExactlyOne => "1",
            Self::ZeroOrMore => "0-n",
            Self::OneOrMore => "1-n",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A cardinality as declared on a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardinalityInfo {
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gui_order: Option<i32>,
}

impl CardinalityInfo {
    pub fn new(cardinality: Cardinality) -> Self {
        Self {
            cardinality,
            gui_order: None,
        }
    }

    pub fn with_gui_order(cardinality: Cardinality, gui_order: i32) -> Self {
        Self {
            cardinality,
            gui_order: Some(gui_order),
        }
    }
}
