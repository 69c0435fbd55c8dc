//! Error types for the graph runtime.
//!
//! Two categories exist:
//!
//! - [`GraphError`] covers consistency violations: operating on a node that
//!   has no context, registering a node twice, a listener whose handler
//!   snapshot is missing an entry. These indicate a bug in the caller or the
//!   runtime, and the failing operation stops where it detected the problem.
//!
//! - [`ValueError`] covers reading a node's value before its first
//!   recompute. This is the one failure callers are expected to handle.

use thiserror::Error;

use crate::action::ActionType;
use crate::graph::NodeId;

/// Errors produced by node value accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The node was read before its first recompute completed.
    #[error("node {name} ({node}) was read before its first recompute")]
    Uninitialized { node: NodeId, name: String },
}

/// Errors produced by [`DataGraph`](crate::graph::DataGraph) operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The node has no context in the graph.
    #[error("node {name} ({node}) must be in the graph")]
    NotRegistered { node: NodeId, name: String },

    /// The node already has a context in the graph.
    #[error("node {name} ({node}) must not already be in the graph")]
    AlreadyRegistered { node: NodeId, name: String },

    /// A node is registered as a listener for an action type, but its handler
    /// snapshot has no entry for that type.
    #[error("action {action} registered as listener for {name} ({node}), but no handler exists")]
    MissingHandler {
        node: NodeId,
        name: String,
        action: ActionType,
    },

    /// A change cascade went deeper than the configured limit. Usually a
    /// dependency cycle.
    #[error("change cascade exceeded depth {limit} at node {name} ({node})")]
    CascadeDepthExceeded {
        node: NodeId,
        name: String,
        limit: usize,
    },

    /// A structural invariant of the registry does not hold.
    #[error("graph inconsistency: {reason}")]
    Inconsistent { reason: String },

    /// A node failed to produce a value during recompute.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Graph configuration could not be parsed.
    #[error("invalid graph configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
