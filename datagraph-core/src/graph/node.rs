//! Graph Nodes
//!
//! This module defines the capability contract every graph member satisfies,
//! and the handle the graph uses to refer to nodes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexSet;

use crate::action::{ActionHandlerMap, Dispatch, SideEffectResult};
use crate::error::ValueError;

/// Unique identifier for a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node's version marker.
///
/// Two different versions observed for the same node mean its value changed
/// in between. Equal versions mean it did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Version(pub u64);

impl Version {
    /// The version following this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// An ordered set of node handles.
pub type NodeSet = IndexSet<NodeHandle>;

/// The capability contract the graph programs against.
///
/// Only [`id`](DataNode::id) and [`version`](DataNode::version) are required.
/// Every other capability has a default meaning "this node does not have it".
pub trait DataNode: Send + Sync {
    /// Stable identity of this node.
    fn id(&self) -> NodeId;

    /// The node's current version.
    fn version(&self) -> Version;

    /// Label used in logs and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Recompute the node's value from its inputs.
    ///
    /// Calling this again without new inputs must not change the version.
    fn update_value(&self) -> Result<(), ValueError> {
        Ok(())
    }

    /// Dynamic dependency accessor.
    ///
    /// `None` means the node has no accessor, and its dependencies are the
    /// static set returned by [`props`](DataNode::props), wired once at mount.
    fn dependencies(&self) -> Option<NodeSet> {
        None
    }

    /// Static implicit dependencies, used when there is no dependency accessor.
    fn props(&self) -> NodeSet {
        NodeSet::new()
    }

    /// Child accessor. `None` means the node never owns children.
    fn child_nodes(&self) -> Option<NodeSet> {
        None
    }

    /// The node's action handler table. Read once, at registration.
    fn action_handlers(&self) -> ActionHandlerMap {
        ActionHandlerMap::new()
    }

    /// Called after the node's context has been removed from the graph.
    fn node_did_unmount(&self) {}

    /// Called at the end of every pass in which the node changed.
    fn manage_side_effects(&self, _dispatch: &dyn Dispatch) -> SideEffectResult {
        Ok(())
    }
}

/// A shared reference to a node, compared and hashed by [`NodeId`].
#[derive(Clone)]
pub struct NodeHandle(Arc<dyn DataNode>);

impl NodeHandle {
    /// Wrap a node in a handle.
    pub fn new<N: DataNode + 'static>(node: N) -> Self {
        Self(Arc::new(node))
    }

    pub fn id(&self) -> NodeId {
        self.0.id()
    }

    /// Dependencies the graph should wire for this node right now: the
    /// accessor if present, otherwise the static props.
    pub(crate) fn declared_dependencies(&self) -> NodeSet {
        self.0.dependencies().unwrap_or_else(|| self.0.props())
    }
}

impl<N: DataNode + 'static> From<Arc<N>> for NodeHandle {
    fn from(node: Arc<N>) -> Self {
        Self(node)
    }
}

impl Deref for NodeHandle {
    type Target = dyn DataNode;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for NodeHandle {}

impl Hash for NodeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("id", &self.id())
            .field("name", &self.0.name())
            .finish()
    }
}
