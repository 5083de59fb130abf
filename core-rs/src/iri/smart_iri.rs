//! Schema-aware IRIs
//!
//! A [`SmartIri`] is always stored in the internal schema. Client input in
//! either API v2 schema (complex or simple) is converted at parse time, so
//! equality, ordering and hashing never depend on the schema the caller
//! happened to use.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{OntoError, Result, ValidationRule};
use crate::iri::vocabulary::{
    API_ONTOLOGY_BASE, API_V2_SIMPLE_SUFFIX, API_V2_SUFFIX, INTERNAL_ONTOLOGY_BASE,
    KNORA_API_NAME, KNORA_BASE_NAME, SHARED_ONTOLOGY_SEGMENT,
};

static ABSOLUTE_IRI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[a-zA-Z][a-zA-Z0-9+.-]*:[^\s<>"{}|\\^`]+$"#).expect("static regex")
});

static PROJECT_SHORTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{4}$").expect("static regex"));

/// Built-in ontology names (no project segment)
const BUILT_IN_ONTOLOGIES: &[&str] = &[KNORA_BASE_NAME, "knora-admin", "salsah-gui", "standoff"];

/// External projection of an IRI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiSchema {
    /// Storage schema, `http://www.knora.org/ontology/...`
    Internal,
    /// API v2 with value objects, `http://api.knora.org/ontology/.../v2`
    Complex,
    /// API v2 with plain literals, `http://api.knora.org/ontology/.../simple/v2`
    Simple,
}

/// An IRI normalized to the internal schema.
///
/// # Examples
///
/// ```
/// use onto_cache::iri::{ApiSchema, SmartIri};
///
/// let iri = SmartIri::parse("http://api.knora.org/ontology/0001/anything/v2#Thing").unwrap();
/// assert_eq!(iri.as_str(), "http://www.knora.org/ontology/0001/anything#Thing");
/// assert_eq!(
///     iri.to_schema(ApiSchema::Simple),
///     "http://api.knora.org/ontology/0001/anything/simple/v2#Thing"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SmartIri {
    internal: String,
}

impl SmartIri {
    /// Parse a client-supplied IRI in any schema
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if !ABSOLUTE_IRI.is_match(input) {
            return Err(OntoError::bad_request(
                ValidationRule::Syntax,
                format!("Invalid IRI: <{}>", input),
            ));
        }

        if let Some(rest) = input.strip_prefix(API_ONTOLOGY_BASE) {
            return Self::from_api_path(input, rest);
        }

        if let Some(rest) = input.strip_prefix(INTERNAL_ONTOLOGY_BASE) {
            let (path, _) = split_fragment(rest);
            let segments: Vec<&str> = path.split('/').collect();
            if segments.iter().any(|s| s.is_empty()) || segments.len() > 2 {
                return Err(OntoError::bad_request(
                    ValidationRule::Syntax,
                    format!("Invalid internal ontology IRI: <{}>", input),
                ));
            }
        }

        Ok(Self {
            internal: input.to_string(),
        })
    }

    /// Wrap an IRI known to be well-formed and already internal
    ///
    /// Used for vocabulary constants and IRIs read back from the triplestore.
    pub fn from_trusted(iri: &str) -> Self {
        Self {
            internal: iri.to_string(),
        }
    }

    fn from_api_path(input: &str, rest: &str) -> Result<Self> {
        let (path, fragment) = split_fragment(rest);
        let path = path
            .strip_suffix(API_V2_SIMPLE_SUFFIX)
            .or_else(|| path.strip_suffix(API_V2_SUFFIX))
            .ok_or_else(|| {
                OntoError::bad_request(
                    ValidationRule::Syntax,
                    format!("API v2 ontology IRI must end with /v2: <{}>", input),
                )
            })?;

        let segments: Vec<&str> = path.split('/').collect();
        let internal_path = match segments.as_slice() {
            [name] if *name == KNORA_API_NAME => KNORA_BASE_NAME.to_string(),
            [name] if BUILT_IN_ONTOLOGIES.contains(name) && *name != KNORA_BASE_NAME => {
                name.to_string()
            }
            [prefix, name] if !name.is_empty() && (*prefix == SHARED_ONTOLOGY_SEGMENT
                || PROJECT_SHORTCODE.is_match(prefix)) =>
            {
                format!("{}/{}", normalize_prefix(prefix), name)
            }
            _ => {
                return Err(OntoError::bad_request(
                    ValidationRule::Syntax,
                    format!("Unrecognized API v2 ontology IRI: <{}>", input),
                ))
            }
        };

        let mut internal = format!("{}{}", INTERNAL_ONTOLOGY_BASE, internal_path);
        if let Some(fragment) = fragment {
            internal.push('#');
            internal.push_str(fragment);
        }
        Ok(Self { internal })
    }

    /// IRI of a project-specific ontology
    pub fn project_ontology(shortcode: &str, name: &str) -> Result<Self> {
        if !PROJECT_SHORTCODE.is_match(shortcode) {
            return Err(OntoError::bad_request(
                ValidationRule::Syntax,
                format!("Invalid project shortcode: {}", shortcode),
            ));
        }
        Ok(Self {
            internal: format!(
                "{}{}/{}",
                INTERNAL_ONTOLOGY_BASE,
                shortcode.to_uppercase(),
                name
            ),
        })
    }

    /// IRI of a shared ontology
    pub fn shared_ontology(name: &str) -> Self {
        Self {
            internal: format!("{}{}/{}", INTERNAL_ONTOLOGY_BASE, SHARED_ONTOLOGY_SEGMENT, name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.internal
    }

    /// True for any IRI in the `http://www.knora.org/ontology/` namespace
    pub fn is_knora_iri(&self) -> bool {
        self.internal.starts_with(INTERNAL_ONTOLOGY_BASE)
    }

    pub fn is_knora_ontology_iri(&self) -> bool {
        self.is_knora_iri() && !self.internal.contains('#')
    }

    pub fn is_knora_entity_iri(&self) -> bool {
        self.is_knora_iri() && self.entity_name().is_some()
    }

    /// Local name after `#`
    pub fn entity_name(&self) -> Option<&str> {
        split_fragment(&self.internal)
            .1
            .filter(|fragment| !fragment.is_empty())
    }

    /// Ontology this IRI belongs to
    ///
    /// For Knora entity IRIs this strips the fragment. Ontology IRIs return
    /// themselves. Non-Knora IRIs have no owning ontology in the cache.
    pub fn ontology_iri(&self) -> Option<SmartIri> {
        if !self.is_knora_iri() {
            return None;
        }
        let (path, _) = split_fragment(&self.internal);
        Some(Self {
            internal: path.to_string(),
        })
    }

    /// Namespace of any IRI: everything up to and including the last `#` or `/`
    pub fn namespace(&self) -> &str {
        match self.internal.rfind(|c| c == '#' || c == '/') {
            Some(pos) => &self.internal[..=pos],
            None => &self.internal,
        }
    }

    fn internal_path(&self) -> Option<&str> {
        let rest = self.internal.strip_prefix(INTERNAL_ONTOLOGY_BASE)?;
        Some(split_fragment(rest).0)
    }

    /// Short name of the ontology, e.g. `anything`
    pub fn ontology_name(&self) -> Option<&str> {
        self.internal_path()?.rsplit('/').next()
    }

    /// Project shortcode segment, if this is a project-specific ontology
    pub fn project_code(&self) -> Option<&str> {
        let path = self.internal_path()?;
        let (prefix, _) = path.split_once('/')?;
        PROJECT_SHORTCODE.is_match(prefix).then_some(prefix)
    }

    pub fn is_shared(&self) -> bool {
        self.internal_path()
            .and_then(|path| path.split_once('/'))
            .map(|(prefix, _)| prefix == SHARED_ONTOLOGY_SEGMENT)
            .unwrap_or(false)
    }

    /// knora-base, knora-admin, salsah-gui and standoff
    pub fn is_built_in(&self) -> bool {
        self.internal_path()
            .map(|path| BUILT_IN_ONTOLOGIES.contains(&path))
            .unwrap_or(false)
    }

    /// Entity IRI `{self}#{name}` for an ontology IRI
    pub fn make_entity_iri(&self, name: &str) -> SmartIri {
        let (path, _) = split_fragment(&self.internal);
        Self {
            internal: format!("{}#{}", path, name),
        }
    }

    /// The LinkValue shadow of a link property: `hasFoo` -> `hasFooValue`
    pub fn link_value_property(&self) -> SmartIri {
        Self {
            internal: format!("{}Value", self.internal),
        }
    }

    /// Project into an external schema
    ///
    /// Non-Knora IRIs are returned unchanged in every schema.
    pub fn to_schema(&self, schema: ApiSchema) -> String {
        let path = match (schema, self.internal_path()) {
            (ApiSchema::Internal, _) | (_, None) => return self.internal.clone(),
            (_, Some(path)) => path,
        };

        let api_path = if path == KNORA_BASE_NAME {
            KNORA_API_NAME
        } else {
            path
        };
        let suffix = match schema {
            ApiSchema::Simple => API_V2_SIMPLE_SUFFIX,
            _ => API_V2_SUFFIX,
        };

        let mut external = format!("{}{}{}", API_ONTOLOGY_BASE, api_path, suffix);
        if let Some(fragment) = split_fragment(&self.internal).1 {
            external.push('#');
            external.push_str(fragment);
        }
        external
    }
}

fn split_fragment(iri: &str) -> (&str, Option<&str>) {
    match iri.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (iri, None),
    }
}

/// Shortcodes are stored upper-case
fn normalize_prefix(prefix: &str) -> String {
    if PROJECT_SHORTCODE.is_match(prefix) {
        prefix.to_uppercase()
    } else {
        prefix.to_string()
    }
}

impl fmt::Display for SmartIri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.internal)
    }
}

impl TryFrom<String> for SmartIri {
    type Error = OntoError;

    fn try_from(value: String) -> Result<Self> {
        SmartIri::parse(&value)
    }
}

impl From<SmartIri> for String {
    fn from(iri: SmartIri) -> Self {
        iri.internal
    }
}

impl AsRef<str> for SmartIri {
    fn as_ref(&self) -> &str {
        &self.internal
    }
}
