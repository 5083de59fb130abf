//! Per-request mutation state machine
//!
//! `Received -> SyntaxChecked -> AuthorizationChecked -> StructurallyValidated -> Committed`,
//! with `Rejected` reachable from any non-final phase. Nothing is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Span};
use uuid::Uuid;

use crate::errors::{OntoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationPhase {
    Received,
    SyntaxChecked,
    AuthorizationChecked,
    StructurallyValidated,
    Committed,
    Rejected,
}

impl MutationPhase {
    /// The phase that must come next on the success path
    pub const fn next(&self) -> Option<MutationPhase> {
        match self {
            Self::Received => Some(Self::SyntaxChecked),
            Self::SyntaxChecked => Some(Self::AuthorizationChecked),
            Self::AuthorizationChecked => Some(Self::StructurallyValidated),
            Self::StructurallyValidated => Some(Self::Committed),
            Self::Committed | Self::Rejected => None,
        }
    }

    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Committed | Self::Rejected)
    }
}

impl fmt::Display for MutationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::SyntaxChecked => "syntax-checked",
            Self::AuthorizationChecked => "authorization-checked",
            Self::StructurallyValidated => "structurally-validated",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Tracks one mutation request through its phases
#[derive(Debug)]
pub struct MutationPipeline {
    request_id: Uuid,
    operation: &'static str,
    phase: MutationPhase,
}

impl MutationPipeline {
    pub fn new(operation: &'static str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            operation,
            phase: MutationPhase::Received,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn phase(&self) -> MutationPhase {
        self.phase
    }

    /// Span carrying the request id, entered for the whole request
    pub fn span(&self) -> Span {
        info_span!(
            "ontology_mutation",
            request_id = %self.request_id,
            operation = self.operation
        )
    }

    /// Move to `to`, which must be the next phase on the success path
    pub fn advance(&mut self, to: MutationPhase) -> Result<()> {
        if self.phase.next() != Some(to) {
            return Err(OntoError::Inconsistency(format!(
                "Illegal mutation phase transition {} -> {} in {}",
                self.phase, to, self.operation
            )));
        }
        self.phase = to;
        Ok(())
    }

    /// Close the pipeline with the request's outcome
    ///
    /// A successful request that never reached `Committed` was a no-op.
    pub fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) if self.phase == MutationPhase::Committed => {
                info!(request_id = %self.request_id, operation = self.operation, "Mutation committed");
            }
            Ok(_) => {
                info!(
                    request_id = %self.request_id,
                    operation = self.operation,
                    phase = %self.phase,
                    "Mutation accepted without changes"
                );
            }
            Err(e) => {
                warn!(
                    request_id = %self.request_id,
                    operation = self.operation,
                    phase = %self.phase,
                    error = %e,
                    "Mutation rejected"
                );
                if !self.phase.is_final() {
                    self.phase = MutationPhase::Rejected;
                }
            }
        }
        result
    }
}
