//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::NodeId;

/// Domain errors represent violations of the tree's structural contract.
///
/// Lookups never produce these: a missing id or an unmatched predicate is an
/// empty result, not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("invalid record structure: {reason}")]
    InvalidStructure { reason: String },

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("cycle detected: {node} cannot be placed under {target}")]
    CycleDetected { node: NodeId, target: NodeId },

    #[error("reserved attribute cannot be set: {0}")]
    ReservedAttribute(String),

    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),
}

impl TreeError {
    pub(crate) fn structure(reason: impl Into<String>) -> Self {
        Self::InvalidStructure {
            reason: reason.into(),
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
