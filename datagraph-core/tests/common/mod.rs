//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use datagraph_core::{
    Action, ActionHandlerMap, ActionType, DataGraph, DataNode, Dispatch, NodeHandle, NodeId,
    NodeSet, SideEffectResult, Version,
};

/// A node whose dependencies, children and handlers are set by the test,
/// counting every call the graph makes into it.
#[derive(Default)]
pub struct MockNode {
    id: NodeId,
    version: AtomicU64,
    pub dependencies: Mutex<NodeSet>,
    pub children: Mutex<NodeSet>,
    handlers: Mutex<ActionHandlerMap>,
    updates: AtomicUsize,
    side_effects: AtomicUsize,
    unmounts: AtomicUsize,
}

impl MockNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn increment_version(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_dependency(&self, node: &Arc<MockNode>) {
        self.dependencies.lock().insert(node.clone().into());
    }

    pub fn remove_dependency(&self, node: &Arc<MockNode>) {
        self.dependencies.lock().shift_remove(&NodeHandle::from(node.clone()));
    }

    pub fn add_child(&self, node: &Arc<MockNode>) {
        self.children.lock().insert(node.clone().into());
    }

    pub fn clear_children(&self) {
        self.children.lock().clear();
    }

    /// Install a handler. Must happen before the node is registered, since
    /// the graph snapshots handlers at registration.
    pub fn on<F>(&self, kind: &'static str, handler: F)
    where
        F: Fn(&Action) + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .insert(ActionType::from_static(kind), Arc::new(handler));
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn side_effects(&self) -> usize {
        self.side_effects.load(Ordering::SeqCst)
    }

    pub fn unmounts(&self) -> usize {
        self.unmounts.load(Ordering::SeqCst)
    }
}

impl DataNode for MockNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn version(&self) -> Version {
        Version(self.version.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "MockNode"
    }

    fn update_value(&self) -> Result<(), datagraph_core::ValueError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn dependencies(&self) -> Option<NodeSet> {
        Some(self.dependencies.lock().clone())
    }

    fn child_nodes(&self) -> Option<NodeSet> {
        Some(self.children.lock().clone())
    }

    fn action_handlers(&self) -> ActionHandlerMap {
        self.handlers.lock().clone()
    }

    fn node_did_unmount(&self) {
        self.unmounts.fetch_add(1, Ordering::SeqCst);
    }

    fn manage_side_effects(&self, _dispatch: &dyn Dispatch) -> SideEffectResult {
        self.side_effects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Build a node set from mock nodes.
pub fn set(nodes: &[&Arc<MockNode>]) -> NodeSet {
    nodes.iter().map(|node| NodeHandle::from((*node).clone())).collect()
}

/// `a` with child `a1`, and `b` depending on `a`.
pub struct Fixture {
    pub graph: DataGraph,
    pub a: Arc<MockNode>,
    pub a1: Arc<MockNode>,
    pub b: Arc<MockNode>,
}

impl Fixture {
    pub fn new() -> Self {
        let a1 = MockNode::new();
        let a = MockNode::new();
        a.add_child(&a1);
        let b = MockNode::new();
        b.add_dependency(&a);

        Self {
            graph: DataGraph::new(),
            a,
            a1,
            b,
        }
    }
}
