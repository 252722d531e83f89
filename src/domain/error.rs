//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::NodeId;

/// Domain errors represent invalid curriculum records or impossible requests.
/// Repairable hierarchy defects (orphans, cycles) are not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("record {index}: missing node id")]
    MissingId { index: usize },

    #[error("node {id}: missing required field '{field}'")]
    MissingField { id: NodeId, field: &'static str },

    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("moving {node} under {parent} would create a cycle")]
    WouldCreateCycle { node: NodeId, parent: NodeId },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
