//! Change Propagation
//!
//! A pass starts from a set of directly affected nodes and works in stages:
//!
//! 1. Recompute each affected node. Whenever a node's version moves, record
//!    it as changed and recompute its dependents, skipping dependents that
//!    are themselves in the affected set (they get their own turn).
//! 2. For every changed node with a child accessor, reconcile its children:
//!    unmount subtrees it no longer reports, mount the new ones.
//! 3. Recompute each newly mounted node once and report it as changed.
//! 4. For every changed node with a dependency accessor, rewire its edges to
//!    match what it now reads.
//! 5. Run the side-effect hook of every changed node.
//!
//! # Known limitations
//!
//! The order is naive. Dependents are followed depth-first as soon as a node
//! changes, so a node reachable through two paths in one cascade can be
//! recomputed twice, and a dependency cycle whose values keep changing never
//! settles unless [`GraphConfig::max_cascade_depth`](crate::GraphConfig) is
//! set.

use indexmap::IndexSet;
use smallvec::SmallVec;
use tracing::{debug, debug_span, trace, warn};

use super::node::{NodeHandle, NodeId, NodeSet};
use super::registry::{DataGraph, TraversalOrder};
use super::set_change::{merge_set, SetChange};
use crate::action::Dispatch;
use crate::error::{GraphError, Result};

impl DataGraph {
    /// Run a propagation pass over `affected` and return every node whose
    /// value changed, directly or transitively, including nodes mounted
    /// during the pass.
    pub fn update_nodes(&mut self, dispatch: &dyn Dispatch, affected: &NodeSet) -> Result<NodeSet> {
        let span = debug_span!("update_nodes", affected = affected.len());
        let _enter = span.enter();

        let mut changed = NodeSet::new();
        for node in affected {
            self.collect_changed_nodes(node, &mut changed, affected)?;
        }

        // Only now are all value updates complete.
        self.handle_node_children(&mut changed)?;

        for node in &changed {
            self.handle_node_dependencies(node)?;
        }

        for node in &changed {
            if let Err(error) = node.manage_side_effects(dispatch) {
                warn!(node = %node.id(), name = node.name(), %error, "side effect failed");
            }
        }

        debug!(changed = changed.len(), "pass complete");
        Ok(changed)
    }

    /// Recompute every registered node.
    ///
    /// This does not order nodes topologically; every node is treated as
    /// directly affected, in registration order.
    pub fn update_all_nodes(&mut self, dispatch: &dyn Dispatch) -> Result<NodeSet> {
        debug!("updating all nodes");
        let nodes = self.nodes();
        self.update_nodes(dispatch, &nodes)
    }

    fn collect_changed_nodes(
        &mut self,
        start: &NodeHandle,
        changed: &mut NodeSet,
        originals: &NodeSet,
    ) -> Result<()> {
        let limit = self.config.max_cascade_depth;
        let mut stack: SmallVec<[(NodeHandle, usize); 16]> = SmallVec::new();
        stack.push((start.clone(), 0));

        while let Some((node, depth)) = stack.pop() {
            if let Some(limit) = limit {
                if depth > limit {
                    return Err(GraphError::CascadeDepthExceeded {
                        node: node.id(),
                        name: node.name().to_owned(),
                        limit,
                    });
                }
            }

            trace!(node = %node.id(), name = node.name(), depth, "updating value");
            let context = self.context_mut(&node)?;
            if !context.update_value()? {
                continue;
            }
            trace!(node = %node.id(), "value changed");
            changed.insert(node.clone());

            let dependent_ids: SmallVec<[NodeId; 8]> = context.dependents.iter().copied().collect();
            let mut dependents: SmallVec<[NodeHandle; 8]> = SmallVec::new();
            for id in dependent_ids {
                let dependent = self
                    .contexts
                    .get(&id)
                    .map(|context| context.node().clone())
                    .ok_or_else(|| GraphError::Inconsistent {
                        reason: format!("{} lists unregistered node {id} as a dependent", node.id()),
                    })?;
                if !originals.contains(&dependent) {
                    dependents.push(dependent);
                }
            }

            // Reversed so dependents are visited in the order they were wired.
            stack.extend(dependents.into_iter().rev().map(|dependent| (dependent, depth + 1)));
        }

        Ok(())
    }

    /// Reconcile children of every changed node.
    ///
    /// Diffs are computed against the cached children of every node before
    /// any cache is rewritten, so removed subtrees are walked as they stood
    /// when the pass began, whatever order `changed` is in. Nodes inside a
    /// removed subtree neither commit their own diff nor mount anything.
    fn handle_node_children(&mut self, changed: &mut NodeSet) -> Result<()> {
        let mut pending: Vec<(NodeHandle, NodeSet, SetChange<NodeHandle>)> = Vec::new();
        let mut removed = NodeSet::new();

        for node in changed.iter() {
            let Some(children_after) = node.child_nodes() else {
                continue;
            };
            let change = SetChange::calculate(&self.context(node)?.children, &children_after);
            if change.is_empty() {
                continue;
            }
            merge_set(&mut removed, &change.removed);
            pending.push((node.clone(), children_after, change));
        }

        let mut gone: IndexSet<NodeId> = IndexSet::new();
        self.for_each_in_tree(&removed, TraversalOrder::Post, |_, node| {
            gone.insert(node.id());
            Ok(())
        })?;
        changed.retain(|node| !gone.contains(&node.id()));

        let mut added = NodeSet::new();
        for (node, children_after, change) in pending {
            if gone.contains(&node.id()) {
                trace!(node = %node.id(), "skipping children of removed node");
                continue;
            }
            debug!(
                node = %node.id(),
                name = node.name(),
                added = change.added.len(),
                removed = change.removed.len(),
                "reconciling children"
            );
            merge_set(&mut added, &change.added);
            self.context_mut(&node)?.children = children_after;
        }

        self.remove_nodes(&removed)?;
        self.add_nodes(&added)?;

        // After all additions, in case new nodes depend on each other.
        self.for_each_in_tree(&added, TraversalOrder::Pre, |graph, node| {
            trace!(node = %node.id(), name = node.name(), "initial update for mounted node");
            graph.context_mut(node)?.update_value()?;
            changed.insert(node.clone());
            Ok(())
        })
    }

    fn handle_node_dependencies(&mut self, node: &NodeHandle) -> Result<()> {
        // Without an accessor the dependencies are static, wired at mount.
        let Some(after) = node.dependencies() else {
            return Ok(());
        };

        let after_ids: IndexSet<NodeId> = after.iter().map(NodeHandle::id).collect();
        let change = SetChange::calculate(&self.context(node)?.dependencies, &after_ids);

        for dependency in &change.removed {
            self.remove_dependency(node.id(), *dependency);
        }
        for dependency in after.iter().filter(|d| change.added.contains(&d.id())) {
            self.add_dependency(node, dependency)?;
        }

        Ok(())
    }
}
