//! RBAC module
//!
//! Consumed as a capability check: is the requesting principal a project
//! or system administrator.

pub mod permission_checker;

pub use permission_checker::{Authorizer, PermissionChecker, UserProfile};
