//! Action Dispatch
//!
//! Routes an action to the nodes listening for its type, then runs a single
//! propagation pass over those listeners.

use tracing::{debug, debug_span};

use super::node::NodeSet;
use super::registry::DataGraph;
use super::set_change::merge_set;
use crate::action::{Action, ActionQueue, Dispatch};
use crate::error::{GraphError, Result};

impl DataGraph {
    /// Deliver `action` to every listener and propagate the result.
    ///
    /// Returns the nodes changed by the pass, or an empty set if nothing
    /// listens for the action's type.
    pub fn handle_action(&mut self, dispatch: &dyn Dispatch, action: &Action) -> Result<NodeSet> {
        let span = debug_span!("handle_action", action = %action.kind);
        let _enter = span.enter();

        let Some(listeners) = self.action_listeners.get(&action.kind).cloned() else {
            debug!("no listeners");
            return Ok(NodeSet::new());
        };

        for node in &listeners {
            let handler = self
                .context(node)?
                .action_handlers
                .get(&action.kind)
                .cloned()
                .ok_or_else(|| GraphError::MissingHandler {
                    node: node.id(),
                    name: node.name().to_owned(),
                    action: action.kind.clone(),
                })?;
            handler(action);
        }

        debug!(listeners = listeners.len(), "handlers ran");
        self.update_nodes(dispatch, &listeners)
    }

    /// Handle queued actions one pass at a time until the queue is empty.
    ///
    /// Side effects dispatch back into `queue`, so actions they emit are
    /// handled by this same call. Returns every node changed by any pass.
    ///
    /// # Errors
    ///
    /// The first failing pass stops the drain and its error is returned.
    /// The action that pass popped is not requeued, and actions behind it
    /// stay in `queue`. Passes that completed before it keep their effects
    /// on the graph and have already notified subscribers, but the nodes
    /// they changed are not reported.
    pub fn drain(&mut self, queue: &ActionQueue) -> Result<NodeSet> {
        let mut changed = NodeSet::new();
        while let Some(action) = queue.pop() {
            let pass = self.handle_action(queue, &action)?;
            if self.config.notify_subscribers_on_drain {
                self.trigger_subscription_callbacks(&pass)?;
            }
            merge_set(&mut changed, &pass);
        }
        Ok(changed)
    }
}
