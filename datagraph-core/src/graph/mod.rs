//! Dependency Graph
//!
//! This module implements the registry and propagation engine that keep
//! derived values consistent with their inputs.
//!
//! # Overview
//!
//! The graph tracks three relations between registered nodes:
//!
//! - Dependencies: if B reads A, A is a dependency of B and B a dependent of A
//! - Children: a node may own child nodes, which are mounted and unmounted
//!   along with it
//! - Action listeners: which nodes handle which action types
//!
//! When an action arrives, its listeners update their internal state and a
//! propagation pass recomputes every node whose inputs may have moved. A node
//! counts as changed when its version differs from the one the graph last
//! observed.
//!
//! # Design Decisions
//!
//! 1. Per-node bookkeeping lives in a context owned by the registry and
//!    indexed by node ID, so nodes themselves hold no graph state.
//!
//! 2. Both forward (dependencies) and reverse (dependents) edges are kept,
//!    and every mutation updates both sides.
//!
//! 3. Tree walks and cascades use explicit worklists rather than recursion,
//!    so deep trees and long chains cannot overflow the stack.

mod context;
mod dispatch;
mod lifecycle;
mod node;
mod propagate;
mod registry;
mod set_change;
mod subscriber;

pub use node::{DataNode, NodeHandle, NodeId, NodeSet, Version};
pub use registry::DataGraph;
pub use set_change::{merge_set, SetChange};
pub use subscriber::{Subscription, SubscriptionCallback, SubscriptionId};
