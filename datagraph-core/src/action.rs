//! Actions and the Dispatch Capability
//!
//! An [`Action`] is a typed event record dispatched into the graph. Nodes
//! listen for action types through an [`ActionHandlerMap`]; the graph routes
//! each incoming action to every listener's handler before running a
//! propagation pass.
//!
//! # Dispatching from side effects
//!
//! Side-effect hooks receive a `&dyn Dispatch`. Dispatching never re-enters
//! the graph: the action is queued and processed by a later, separate call
//! into the dispatcher. [`ActionQueue`] is the synchronous queue used by
//! [`DataGraph::drain`](crate::graph::DataGraph::drain); the async driver
//! provides a channel-backed implementation.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// The type tag of an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionType(Cow<'static, str>);

impl ActionType {
    /// Create an action type from a static string without allocating.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create an action type from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ActionType {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for ActionType {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// An event record dispatched into the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Action {
    /// Create an action with a payload.
    pub fn new(kind: impl Into<ActionType>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Create an action whose payload is `null`.
    pub fn payloadless(kind: impl Into<ActionType>) -> Self {
        Self::new(kind, serde_json::Value::Null)
    }
}

/// A node's handler for one action type.
///
/// Handlers stage new internal state on their node. They must not change the
/// graph's structure themselves; structural changes are picked up by the
/// propagation pass that follows.
pub type ActionHandler = Arc<dyn Fn(&Action) + Send + Sync>;

/// A node's handler table, keyed by action type.
pub type ActionHandlerMap = IndexMap<ActionType, ActionHandler>;

/// Result returned by side-effect hooks.
pub type SideEffectResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// The capability handed to side-effect hooks for emitting further actions.
pub trait Dispatch {
    /// Queue an action for a later, separate dispatch.
    fn dispatch(&self, action: Action);
}

impl<D: Dispatch + ?Sized> Dispatch for &D {
    fn dispatch(&self, action: Action) {
        (**self).dispatch(action);
    }
}

impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    fn dispatch(&self, action: Action) {
        (**self).dispatch(action);
    }
}

/// A first-in, first-out queue of actions awaiting dispatch.
///
/// Cloning shares the underlying queue.
#[derive(Clone, Default)]
pub struct ActionQueue {
    pending: Arc<Mutex<VecDeque<Action>>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest queued action.
    pub fn pop(&self) -> Option<Action> {
        self.pending.lock().pop_front()
    }

    /// Remove and return every queued action, oldest first.
    pub fn take_all(&self) -> Vec<Action> {
        self.pending.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl Dispatch for ActionQueue {
    fn dispatch(&self, action: Action) {
        self.pending.lock().push_back(action);
    }
}

impl fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serializes_type_field() {
        let action = Action::new("Toggle", serde_json::json!(true));
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Toggle", "payload": true }));

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn missing_payload_defaults_to_null() {
        let action: Action = serde_json::from_str(r#"{ "type": "Expand" }"#).unwrap();
        assert_eq!(action.kind, ActionType::from_static("Expand"));
        assert!(action.payload.is_null());
    }

    #[test]
    fn static_and_owned_types_compare_equal() {
        assert_eq!(ActionType::from_static("add"), ActionType::new("add"));
    }

    #[test]
    fn queue_is_fifo_and_shared_between_clones() {
        let queue = ActionQueue::new();
        let other = queue.clone();

        queue.dispatch(Action::payloadless("first"));
        other.dispatch(Action::payloadless("second"));
        assert_eq!(queue.len(), 2);

        assert_eq!(other.pop().unwrap().kind.as_str(), "first");
        assert_eq!(queue.take_all().len(), 1);
        assert!(other.is_empty());
    }
}
