//! Administrative capability checks
//!
//! Ontology mutations only need a yes/no answer: is the requesting user a
//! system administrator or an administrator of the project that owns the
//! ontology. The policy behind that answer lives elsewhere.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::iri::SmartIri;

/// The requesting principal, as seen by the ontology engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_iri: SmartIri,
    #[serde(default)]
    pub is_system_admin: bool,
    /// Projects this user administers
    #[serde(default)]
    pub project_admin_of: BTreeSet<SmartIri>,
}

impl UserProfile {
    pub fn new(user_iri: SmartIri) -> Self {
        Self {
            user_iri,
            is_system_admin: false,
            project_admin_of: BTreeSet::new(),
        }
    }

    pub fn system_admin(user_iri: SmartIri) -> Self {
        Self {
            is_system_admin: true,
            ..Self::new(user_iri)
        }
    }

    pub fn project_admin(user_iri: SmartIri, project: SmartIri) -> Self {
        let mut profile = Self::new(user_iri);
        profile.project_admin_of.insert(project);
        profile
    }
}

#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn is_project_or_system_admin(&self, user: &UserProfile, project_iri: &SmartIri) -> Result<bool>;
}

/// Decides from the memberships carried by the profile itself
#[derive(Debug, Clone, Default)]
pub struct PermissionChecker;

impl PermissionChecker {
    pub fn new() -> Self {
        PermissionChecker
    }
}

#[async_trait]
impl Authorizer for PermissionChecker {
    async fn is_project_or_system_admin(&self, user: &UserProfile, project_iri: &SmartIri) -> Result<bool> {
        let allowed = user.is_system_admin || user.project_admin_of.contains(project_iri);
        debug!(
            user = %user.user_iri,
            project = %project_iri,
            allowed,
            "Checked administrative capability"
        );
        Ok(allowed)
    }
}
