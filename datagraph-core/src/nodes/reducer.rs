//! Reducer Nodes
//!
//! A reducer node holds state that changes only in response to actions. Each
//! action type it listens for maps to a pure function from the current value
//! and the action to the next value.
//!
//! # Lifecycle
//!
//! The node starts uninitialized. The first recompute or the first handled
//! action, whichever comes first, seeds the initial value and bumps the
//! version once. After that, a reducer's output replaces the value and bumps
//! the version only when it differs from the current value.
//!
//! # Thread Safety
//!
//! The value lives in shared state behind a `RwLock`. The handlers returned
//! by `action_handlers` hold their own reference to it, so they stay valid
//! however long the graph keeps them.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::trace;

use super::derived::Equality;
use super::Gettable;
use crate::action::{Action, ActionHandler, ActionHandlerMap, ActionType};
use crate::error::ValueError;
use crate::graph::{DataNode, NodeId, Version};

/// A pure transition from the current value and an action to the next value.
pub type Reducer<T> = Arc<dyn Fn(&T, &Action) -> T + Send + Sync>;

struct ReducerState<T> {
    value: Option<T>,
    version: Version,
}

struct Shared<T> {
    initial: T,
    equals: Equality<T>,
    state: RwLock<ReducerState<T>>,
}

impl<T: Clone> Shared<T> {
    fn seed(&self, state: &mut ReducerState<T>) {
        if state.value.is_none() {
            state.value = Some(self.initial.clone());
            state.version = state.version.next();
        }
    }

    fn apply(&self, reducer: &Reducer<T>, action: &Action) {
        let mut state = self.state.write();
        self.seed(&mut state);

        let Some(current) = state.value.as_ref() else {
            return;
        };
        let next = reducer(current, action);
        if !(self.equals)(current, &next) {
            state.value = Some(next);
            state.version = state.version.next();
        }
    }
}

/// State driven by actions.
///
/// # Example
///
/// ```rust
/// use datagraph_core::nodes::{Gettable, ReducerNode};
/// use datagraph_core::{Action, ActionQueue, DataGraph};
/// use std::sync::Arc;
///
/// let toggle = Arc::new(
///     ReducerNode::builder(false)
///         .on("Toggle", |value, _| !value)
///         .build(),
/// );
///
/// let mut graph = DataGraph::new();
/// graph.add_node(toggle.clone()).unwrap();
/// graph.update_all_nodes(&ActionQueue::new()).unwrap();
/// assert!(!toggle.get().unwrap());
///
/// graph
///     .handle_action(&ActionQueue::new(), &Action::payloadless("Toggle"))
///     .unwrap();
/// assert!(toggle.get().unwrap());
/// ```
pub struct ReducerNode<T> {
    id: NodeId,
    name: Cow<'static, str>,
    shared: Arc<Shared<T>>,
    reducers: IndexMap<ActionType, Reducer<T>>,
}

impl<T> ReducerNode<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start building a reducer node that begins at `initial`.
    pub fn builder(initial: T) -> ReducerBuilder<T> {
        ReducerBuilder {
            name: Cow::Borrowed("ReducerNode"),
            initial,
            equals: Arc::new(|a: &T, b: &T| a == b),
            reducers: IndexMap::new(),
        }
    }
}

impl<T> ReducerNode<T> {
    /// Action types this node handles, in the order they were added.
    pub fn action_types(&self) -> impl Iterator<Item = &ActionType> {
        self.reducers.keys()
    }
}

impl<T> DataNode for ReducerNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn id(&self) -> NodeId {
        self.id
    }

    fn version(&self) -> Version {
        self.shared.state.read().version
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn update_value(&self) -> Result<(), ValueError> {
        let mut state = self.shared.state.write();
        self.shared.seed(&mut state);
        Ok(())
    }

    fn action_handlers(&self) -> ActionHandlerMap {
        self.reducers
            .iter()
            .map(|(kind, reducer)| {
                let shared = self.shared.clone();
                let reducer = reducer.clone();
                let id = self.id;
                let handler: ActionHandler = Arc::new(move |action: &Action| {
                    trace!(node = %id, action = %action.kind, "reducing");
                    shared.apply(&reducer, action);
                });
                (kind.clone(), handler)
            })
            .collect()
    }
}

impl<T> Gettable<T> for ReducerNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> Result<T, ValueError> {
        self.shared
            .state
            .read()
            .value
            .clone()
            .ok_or_else(|| ValueError::Uninitialized {
                node: self.id,
                name: self.name.to_string(),
            })
    }
}

impl<T: fmt::Debug> fmt::Debug for ReducerNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("ReducerNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value", &state.value)
            .field("version", &state.version)
            .field("actions", &self.reducers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`ReducerNode`].
pub struct ReducerBuilder<T> {
    name: Cow<'static, str>,
    initial: T,
    equals: Equality<T>,
    reducers: IndexMap<ActionType, Reducer<T>>,
}

impl<T> ReducerBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Handle actions of type `kind` with `reducer`. A later call for the
    /// same type replaces the earlier reducer.
    pub fn on<F>(mut self, kind: impl Into<ActionType>, reducer: F) -> Self
    where
        F: Fn(&T, &Action) -> T + Send + Sync + 'static,
    {
        self.reducers.insert(kind.into(), Arc::new(reducer));
        self
    }

    /// Use a custom change test instead of `PartialEq`.
    pub fn with_equality<E>(mut self, equals: E) -> Self
    where
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.equals = Arc::new(equals);
        self
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> ReducerNode<T> {
        ReducerNode {
            id: NodeId::new(),
            name: self.name,
            shared: Arc::new(Shared {
                initial: self.initial,
                equals: self.equals,
                state: RwLock::new(ReducerState {
                    value: None,
                    version: Version::default(),
                }),
            }),
            reducers: self.reducers,
        }
    }
}
