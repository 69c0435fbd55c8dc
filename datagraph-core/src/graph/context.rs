//! Node Context
//!
//! The graph keeps one context per registered node. It caches everything the
//! runtime needs to know about the node between passes: its edges in both
//! directions, the children it currently owns, the handler table captured at
//! registration, external subscriptions, and the last version observed.

use indexmap::{IndexMap, IndexSet};

use super::node::{NodeHandle, NodeId, NodeSet, Version};
use super::subscriber::{Subscription, SubscriptionId};
use crate::action::ActionHandlerMap;
use crate::error::ValueError;

/// Per-node bookkeeping owned by the graph.
pub(crate) struct NodeContext {
    node: NodeHandle,

    /// Nodes this node reads from.
    pub(crate) dependencies: IndexSet<NodeId>,

    /// Nodes that read from this node. Inverse of `dependencies`.
    pub(crate) dependents: IndexSet<NodeId>,

    /// Nodes whose registration this node currently owns.
    pub(crate) children: NodeSet,

    pub(crate) action_handlers: ActionHandlerMap,

    pub(crate) subscriptions: IndexMap<SubscriptionId, Subscription>,

    /// Last version observed. `None` until the first recompute.
    version: Option<Version>,
}

impl NodeContext {
    /// Create a context, snapshotting the node's handler table.
    pub(crate) fn new(node: NodeHandle) -> Self {
        let action_handlers = node.action_handlers();
        Self {
            node,
            dependencies: IndexSet::new(),
            dependents: IndexSet::new(),
            children: NodeSet::new(),
            action_handlers,
            subscriptions: IndexMap::new(),
            version: None,
        }
    }

    pub(crate) fn node(&self) -> &NodeHandle {
        &self.node
    }

    pub(crate) fn version(&self) -> Option<Version> {
        self.version
    }

    /// Recompute the node and record its new version.
    ///
    /// Returns `true` if the version differs from the last one observed.
    pub(crate) fn update_value(&mut self) -> Result<bool, ValueError> {
        self.node.update_value()?;
        let before = self.version;
        let after = self.node.version();
        self.version = Some(after);

        Ok(before != Some(after))
    }

    /// Whether the node's version moved since the last observation.
    pub(crate) fn is_outdated(&self) -> bool {
        self.version != Some(self.node.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DataNode;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct Counter {
        id: NodeId,
        version: AtomicU64,
    }

    impl DataNode for Counter {
        fn id(&self) -> NodeId {
            self.id
        }

        fn version(&self) -> Version {
            Version(self.version.load(Ordering::SeqCst))
        }
    }

    #[test]
    fn first_update_counts_as_change() {
        let node = Arc::new(Counter {
            id: NodeId::new(),
            version: AtomicU64::new(0),
        });
        let mut context = NodeContext::new(node.clone().into());

        assert_eq!(context.version(), None);
        assert!(context.is_outdated());
        assert!(context.update_value().unwrap());
        assert_eq!(context.version(), Some(Version(0)));
    }

    #[test]
    fn update_reports_version_changes_only() {
        let node = Arc::new(Counter {
            id: NodeId::new(),
            version: AtomicU64::new(0),
        });
        let mut context = NodeContext::new(node.clone().into());
        context.update_value().unwrap();

        assert!(!context.update_value().unwrap());

        node.version.fetch_add(1, Ordering::SeqCst);
        assert!(context.is_outdated());
        assert!(context.update_value().unwrap());
        assert!(!context.is_outdated());
    }
}
