//! Consistency validator
//!
//! Every mutation passes payload checks, an authorization check and the
//! structural rules before anything is written. Rules never correct a
//! request; they approve it or reject it with the violated rule.

pub mod guards;
pub mod payload;
pub mod pipeline;
pub mod rules;

pub use pipeline::{MutationPhase, MutationPipeline};
pub use rules::RuleContext;
