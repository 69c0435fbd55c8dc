//! DataGraph Core
//!
//! This crate provides an incremental computation runtime. Values live in
//! nodes; nodes depend on other nodes; actions update a few nodes and the
//! graph recomputes exactly the ones downstream of what moved.
//!
//! It implements:
//!
//! - A registry of nodes with symmetric dependency edges and owned child trees
//! - Action routing to the nodes that listen for each action type
//! - Change propagation driven by per-node version markers
//! - Side effects that can only enqueue further actions
//! - Ready-made constant, derived and reducer nodes
//!
//! # Architecture
//!
//! - `graph`: the registry, lifecycle, dispatcher and propagation engine
//! - `nodes`: node flavors built on the [`DataNode`] contract
//! - `action`: action records and the [`Dispatch`] capability
//! - `driver`: a tokio driver feeding the graph from a channel
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use datagraph_core::nodes::{DerivedNode, Gettable, ReducerNode};
//! use datagraph_core::{Action, ActionQueue, DataGraph};
//!
//! let flag = Arc::new(ReducerNode::builder(false).on("Toggle", |v, _| !v).build());
//! let text = Arc::new(DerivedNode::new({
//!     let flag = flag.clone();
//!     move |inputs| Ok(if inputs.read(&flag)? { "Hello, world." } else { "Wat" })
//! }));
//!
//! let mut graph = DataGraph::new();
//! graph.add_node(flag.clone())?;
//! graph.add_node(text.clone())?;
//!
//! let queue = ActionQueue::new();
//! graph.update_all_nodes(&queue)?;
//! assert_eq!(text.get()?, "Wat");
//!
//! graph.handle_action(&queue, &Action::payloadless("Toggle"))?;
//! assert_eq!(text.get()?, "Hello, world.");
//! # Ok::<(), datagraph_core::GraphError>(())
//! ```

pub mod action;
pub mod config;
pub mod driver;
pub mod error;
pub mod graph;
pub mod nodes;

pub use action::{Action, ActionHandler, ActionHandlerMap, ActionQueue, ActionType, Dispatch, SideEffectResult};
pub use config::GraphConfig;
pub use driver::{ActionSender, GraphDriver};
pub use error::{GraphError, Result, ValueError};
pub use graph::{
    merge_set, DataGraph, DataNode, NodeHandle, NodeId, NodeSet, SetChange, Subscription,
    SubscriptionCallback, SubscriptionId, Version,
};
