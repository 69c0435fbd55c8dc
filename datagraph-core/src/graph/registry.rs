//! Graph Registry
//!
//! [`DataGraph`] owns every node context and the index from action types to
//! listening nodes. It is an ordinary value: create one, pass it to whatever
//! drives it, and drop or [`clear`](DataGraph::clear) it when done.
//!
//! Lifecycle, propagation and dispatch are implemented in their own modules
//! as further `impl DataGraph` blocks. This module holds the state, the
//! symmetric edge wiring, tree walks, subscriptions and introspection.

use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use super::context::NodeContext;
use super::node::{NodeHandle, NodeId, NodeSet, Version};
use super::subscriber::{Subscription, SubscriptionId};
use crate::action::ActionType;
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};

/// Order in which [`DataGraph::for_each_in_tree`] visits a node relative to
/// its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TraversalOrder {
    /// Parents before children.
    Pre,
    /// Children before parents.
    Post,
}

/// The incremental computation graph.
pub struct DataGraph {
    /// Contexts of all registered nodes, in registration order.
    pub(crate) contexts: IndexMap<NodeId, NodeContext>,

    /// Nodes listening for each action type.
    pub(crate) action_listeners: HashMap<ActionType, NodeSet>,

    pub(crate) config: GraphConfig,
}

impl DataGraph {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty graph with the given configuration.
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            contexts: IndexMap::new(),
            action_listeners: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub(crate) fn not_registered(node: &NodeHandle) -> GraphError {
        GraphError::NotRegistered {
            node: node.id(),
            name: node.name().to_owned(),
        }
    }

    pub(crate) fn context(&self, node: &NodeHandle) -> Result<&NodeContext> {
        self.contexts
            .get(&node.id())
            .ok_or_else(|| Self::not_registered(node))
    }

    pub(crate) fn context_mut(&mut self, node: &NodeHandle) -> Result<&mut NodeContext> {
        self.contexts
            .get_mut(&node.id())
            .ok_or_else(|| Self::not_registered(node))
    }

    /// Wire `node` to read from `dependency`. Both must be registered.
    pub(crate) fn add_dependency(&mut self, node: &NodeHandle, dependency: &NodeHandle) -> Result<()> {
        if !self.contexts.contains_key(&dependency.id()) {
            return Err(Self::not_registered(dependency));
        }
        self.context_mut(node)?.dependencies.insert(dependency.id());
        self.context_mut(dependency)?.dependents.insert(node.id());
        Ok(())
    }

    /// Unwire `node` from `dependency`. Either side may already be gone.
    pub(crate) fn remove_dependency(&mut self, node: NodeId, dependency: NodeId) {
        if let Some(context) = self.contexts.get_mut(&node) {
            context.dependencies.shift_remove(&dependency);
        }
        if let Some(context) = self.contexts.get_mut(&dependency) {
            context.dependents.shift_remove(&node);
        }
    }

    /// Visit every node in the trees rooted at `roots`, following cached
    /// `children`. Each node is visited at most once per walk.
    ///
    /// In pre-order the visitor runs before the node's context is read, so it
    /// may create that context. In post-order a node's children are read when
    /// it is first reached, before any node in its subtree is visited, so the
    /// visitor may delete contexts.
    pub(crate) fn for_each_in_tree<F>(
        &mut self,
        roots: &NodeSet,
        order: TraversalOrder,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(&mut Self, &NodeHandle) -> Result<()>,
    {
        let mut visited: HashSet<NodeId> = HashSet::new();
        // (node, children already pushed)
        let mut stack: SmallVec<[(NodeHandle, bool); 16]> =
            roots.iter().rev().map(|node| (node.clone(), false)).collect();

        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                visit(self, &node)?;
                continue;
            }
            if !visited.insert(node.id()) {
                continue;
            }

            match order {
                TraversalOrder::Pre => {
                    visit(self, &node)?;
                    let children = &self.context(&node)?.children;
                    stack.extend(children.iter().rev().map(|child| (child.clone(), false)));
                }
                TraversalOrder::Post => {
                    stack.push((node.clone(), true));
                    let children = &self.context(&node)?.children;
                    stack.extend(children.iter().rev().map(|child| (child.clone(), false)));
                }
            }
        }

        Ok(())
    }

    /// Attach a change-notification callback to a registered node.
    pub fn subscribe<F>(&mut self, node: &NodeHandle, callback: F) -> Result<SubscriptionId>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let subscription = Subscription::new(callback);
        let id = subscription.id();
        self.context_mut(node)?.subscriptions.insert(id, subscription);
        Ok(id)
    }

    /// Detach a callback. Returns whether it was attached.
    pub fn unsubscribe(&mut self, node: &NodeHandle, id: SubscriptionId) -> Result<bool> {
        Ok(self
            .context_mut(node)?
            .subscriptions
            .shift_remove(&id)
            .is_some())
    }

    /// Invoke every subscription callback of every node in `nodes`.
    ///
    /// Callbacks of one node fire in the order they were subscribed.
    pub fn trigger_subscription_callbacks(&self, nodes: &NodeSet) -> Result<()> {
        for node in nodes {
            for subscription in self.context(node)?.subscriptions.values() {
                subscription.notify();
            }
        }
        Ok(())
    }

    /// Whether the node has a context in this graph.
    pub fn contains(&self, node: &NodeHandle) -> bool {
        self.contexts.contains_key(&node.id())
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// All registered nodes, in registration order.
    pub fn nodes(&self) -> NodeSet {
        self.contexts
            .values()
            .map(|context| context.node().clone())
            .collect()
    }

    pub fn dependencies_of(&self, node: &NodeHandle) -> Option<&IndexSet<NodeId>> {
        self.contexts
            .get(&node.id())
            .map(|context| &context.dependencies)
    }

    pub fn dependents_of(&self, node: &NodeHandle) -> Option<&IndexSet<NodeId>> {
        self.contexts
            .get(&node.id())
            .map(|context| &context.dependents)
    }

    pub fn children_of(&self, node: &NodeHandle) -> Option<&NodeSet> {
        self.contexts.get(&node.id()).map(|context| &context.children)
    }

    /// The version the graph last observed for this node.
    pub fn observed_version(&self, node: &NodeHandle) -> Option<Version> {
        self.contexts
            .get(&node.id())
            .and_then(|context| context.version())
    }

    /// Nodes listening for the given action type.
    pub fn listeners(&self, kind: &ActionType) -> Option<&NodeSet> {
        self.action_listeners.get(kind)
    }

    /// Registered nodes whose current version differs from the last one the
    /// graph observed.
    pub fn outdated_nodes(&self) -> NodeSet {
        self.contexts
            .values()
            .filter(|context| context.is_outdated())
            .map(|context| context.node().clone())
            .collect()
    }

    /// Verify that edges are symmetric, that every child and listener is
    /// registered, and that contexts are keyed by their node's ID.
    pub fn check_consistency(&self) -> Result<()> {
        let inconsistent = |reason: String| Err(GraphError::Inconsistent { reason });

        for (id, context) in &self.contexts {
            if context.node().id() != *id {
                return inconsistent(format!("context {id} holds node {}", context.node().id()));
            }
            for dependency in &context.dependencies {
                match self.contexts.get(dependency) {
                    Some(other) if other.dependents.contains(id) => {}
                    Some(_) => {
                        return inconsistent(format!(
                            "{id} depends on {dependency}, which does not list it as a dependent"
                        ))
                    }
                    None => {
                        return inconsistent(format!(
                            "{id} depends on unregistered node {dependency}"
                        ))
                    }
                }
            }
            for dependent in &context.dependents {
                match self.contexts.get(dependent) {
                    Some(other) if other.dependencies.contains(id) => {}
                    Some(_) => {
                        return inconsistent(format!(
                            "{id} lists {dependent} as a dependent, which does not depend on it"
                        ))
                    }
                    None => {
                        return inconsistent(format!(
                            "{id} lists unregistered node {dependent} as a dependent"
                        ))
                    }
                }
            }
            for child in &context.children {
                if !self.contexts.contains_key(&child.id()) {
                    return inconsistent(format!("{id} owns unregistered child {}", child.id()));
                }
            }
        }

        for (kind, listeners) in &self.action_listeners {
            for listener in listeners {
                if !self.contexts.contains_key(&listener.id()) {
                    return inconsistent(format!(
                        "unregistered node {} listens for {kind}",
                        listener.id()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Unmount every registered node.
    pub fn clear(&mut self) -> Result<()> {
        let nodes = self.nodes();
        self.remove_nodes(&nodes)
    }
}

impl Default for DataGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGraph")
            .field("node_count", &self.node_count())
            .field("action_types", &self.action_listeners.len())
            .field("config", &self.config)
            .finish()
    }
}
