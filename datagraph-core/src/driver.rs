//! Async Driver
//!
//! [`GraphDriver`] owns a [`DataGraph`] and feeds it actions from a tokio
//! channel, one propagation pass per action. Any task holding an
//! [`ActionSender`] can dispatch into the graph; side effects receive the
//! driver's own sender, so actions they emit land on the same channel and are
//! handled by a later pass.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::action::{Action, Dispatch};
use crate::error::Result;
use crate::graph::{merge_set, DataGraph, NodeSet};

/// Channel-backed [`Dispatch`] for a [`GraphDriver`].
#[derive(Debug, Clone)]
pub struct ActionSender {
    tx: mpsc::UnboundedSender<Action>,
}

impl ActionSender {
    /// Whether the driver on the other end has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Dispatch for ActionSender {
    fn dispatch(&self, action: Action) {
        if let Err(error) = self.tx.send(action) {
            warn!(action = %error.0.kind, "graph driver dropped, action discarded");
        }
    }
}

/// Runs a graph against a stream of actions.
pub struct GraphDriver {
    graph: DataGraph,
    sender: ActionSender,
    rx: mpsc::UnboundedReceiver<Action>,
}

impl GraphDriver {
    pub fn new(graph: DataGraph) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            graph,
            sender: ActionSender { tx },
            rx,
        }
    }

    /// A new handle for dispatching into this driver.
    pub fn sender(&self) -> ActionSender {
        self.sender.clone()
    }

    pub fn graph(&self) -> &DataGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut DataGraph {
        &mut self.graph
    }

    /// Wait for the next action and run one pass for it.
    ///
    /// The driver holds a sender itself, so this waits until some action
    /// arrives; it does not return just because every other sender is gone.
    pub async fn next_pass(&mut self) -> Result<NodeSet> {
        match self.rx.recv().await {
            Some(action) => self.run_pass(&action),
            None => Ok(NodeSet::new()),
        }
    }

    /// Handle queued actions, each as its own pass, until the channel is
    /// empty. Returns every node changed by any pass.
    ///
    /// Yields to the runtime between passes so other tasks can keep
    /// dispatching.
    pub async fn run_until_idle(&mut self) -> Result<NodeSet> {
        let mut changed = NodeSet::new();
        let mut passes = 0usize;
        while let Ok(action) = self.rx.try_recv() {
            let pass = self.run_pass(&action)?;
            merge_set(&mut changed, &pass);
            passes += 1;
            tokio::task::yield_now().await;
        }
        debug!(passes, changed = changed.len(), "driver idle");
        Ok(changed)
    }

    /// Stop driving and hand back the graph. Actions still queued are dropped.
    pub fn into_graph(self) -> DataGraph {
        self.graph
    }

    fn run_pass(&mut self, action: &Action) -> Result<NodeSet> {
        let changed = self.graph.handle_action(&self.sender, action)?;
        if self.graph.config().notify_subscribers_on_drain {
            self.graph.trigger_subscription_callbacks(&changed)?;
        }
        Ok(changed)
    }
}
