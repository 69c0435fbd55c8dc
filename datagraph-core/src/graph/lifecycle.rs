//! Mounting and Unmounting
//!
//! Nodes enter the graph as trees: registering a node also registers every
//! child its child accessor reports, recursively. Removal works on the same
//! trees in the opposite direction.
//!
//! Both operations run two passes. Adding creates every context before wiring
//! any dependency, since a node may depend on a sibling that appears later in
//! the same batch. Removing unwires every dependency before deleting any
//! context, so no remaining node is left reading from a deleted one.

use indexmap::IndexSet;
use tracing::{debug, warn};

use super::context::NodeContext;
use super::node::{NodeHandle, NodeId, NodeSet};
use super::registry::{DataGraph, TraversalOrder};
use crate::error::{GraphError, Result};

impl DataGraph {
    /// Register a node and its children.
    pub fn add_node(&mut self, node: impl Into<NodeHandle>) -> Result<()> {
        let nodes: NodeSet = [node.into()].into_iter().collect();
        self.add_nodes(&nodes)
    }

    /// Register nodes and their children, then wire their dependencies.
    ///
    /// Newly registered nodes are not recomputed here; run a pass
    /// (for example [`update_all_nodes`](DataGraph::update_all_nodes)) to
    /// materialize them.
    pub fn add_nodes(&mut self, nodes: &NodeSet) -> Result<()> {
        self.for_each_in_tree(nodes, TraversalOrder::Pre, |graph, node| graph.mount(node))?;

        self.for_each_in_tree(nodes, TraversalOrder::Pre, |graph, node| {
            for dependency in &node.declared_dependencies() {
                graph.add_dependency(node, dependency)?;
            }
            Ok(())
        })
    }

    /// Unregister nodes and their children.
    pub fn remove_nodes(&mut self, nodes: &NodeSet) -> Result<()> {
        self.for_each_in_tree(nodes, TraversalOrder::Post, |graph, node| {
            let mut dependencies: IndexSet<NodeId> = node
                .declared_dependencies()
                .iter()
                .map(NodeHandle::id)
                .collect();
            if let Some(context) = graph.contexts.get(&node.id()) {
                dependencies.extend(context.dependencies.iter().copied());
            }
            for dependency in dependencies {
                graph.remove_dependency(node.id(), dependency);
            }
            Ok(())
        })?;

        self.for_each_in_tree(nodes, TraversalOrder::Post, |graph, node| graph.unmount(node))
    }

    fn mount(&mut self, node: &NodeHandle) -> Result<()> {
        debug!(node = %node.id(), name = node.name(), "adding node");
        if self.contains(node) {
            return Err(GraphError::AlreadyRegistered {
                node: node.id(),
                name: node.name().to_owned(),
            });
        }

        let mut context = NodeContext::new(node.clone());
        if let Some(children) = node.child_nodes() {
            context.children = children;
        }
        for kind in context.action_handlers.keys() {
            self.action_listeners
                .entry(kind.clone())
                .or_default()
                .insert(node.clone());
        }

        self.contexts.insert(node.id(), context);
        Ok(())
    }

    fn unmount(&mut self, node: &NodeHandle) -> Result<()> {
        debug!(node = %node.id(), name = node.name(), "removing node");
        let id = node.id();
        let context = self
            .contexts
            .shift_remove(&id)
            .ok_or_else(|| Self::not_registered(node))?;

        for dependent in &context.dependents {
            if let Some(other) = self.contexts.get_mut(dependent) {
                warn!(
                    node = %id,
                    dependent = %dependent,
                    "removed node still had a registered dependent; dropping the edge"
                );
                other.dependencies.shift_remove(&id);
            }
        }
        for dependency in &context.dependencies {
            if let Some(other) = self.contexts.get_mut(dependency) {
                other.dependents.shift_remove(&id);
            }
        }

        node.node_did_unmount();

        for kind in context.action_handlers.keys() {
            if let Some(listeners) = self.action_listeners.get_mut(kind) {
                listeners.shift_remove(node);
                if listeners.is_empty() {
                    self.action_listeners.remove(kind);
                }
            }
        }

        Ok(())
    }
}
