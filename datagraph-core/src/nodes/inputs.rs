//! Input Tracking
//!
//! A derived node's computation reads its inputs through [`Inputs`], which
//! records every node it touches. The recorded set becomes the node's
//! dependencies once the pass that ran the computation finishes.
//!
//! # Redirection
//!
//! An [`Input`] is either a plain value, a node holding the value, or a node
//! holding *another* input. Resolving follows the chain until it reaches a
//! plain value, and every node passed along the way counts as a dependency.
//! When a redirecting node changes which node it points at, the reader's
//! dependencies move with it on the next pass.

use std::fmt;
use std::sync::Arc;

use super::Gettable;
use crate::error::ValueError;
use crate::graph::{NodeHandle, NodeId, NodeSet};

/// A typed reference to a gettable node that the graph can also track.
pub struct GettableRef<T> {
    handle: NodeHandle,
    node: Arc<dyn Gettable<T>>,
}

impl<T> GettableRef<T> {
    pub fn new<N: Gettable<T> + 'static>(node: &Arc<N>) -> Self {
        Self {
            handle: NodeHandle::from(node.clone()),
            node: node.clone(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.handle.id()
    }

    /// The untyped handle, for registering the node with a graph.
    pub fn handle(&self) -> &NodeHandle {
        &self.handle
    }

    /// Read the node without recording a dependency.
    pub fn get_untracked(&self) -> Result<T, ValueError> {
        self.node.get()
    }
}

impl<T> Clone for GettableRef<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            node: self.node.clone(),
        }
    }
}

impl<T> fmt::Debug for GettableRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GettableRef").field(&self.handle).finish()
    }
}

/// A value, a node holding the value, or a node holding another input.
pub enum Input<T> {
    Value(T),
    Node(GettableRef<T>),
    Redirect(GettableRef<Input<T>>),
}

impl<T> Input<T> {
    /// An input read from `node`.
    pub fn node<N: Gettable<T> + 'static>(node: &Arc<N>) -> Self {
        Self::Node(GettableRef::new(node))
    }

    /// An input whose source is chosen by `node`.
    pub fn redirect<N: Gettable<Input<T>> + 'static>(node: &Arc<N>) -> Self {
        Self::Redirect(GettableRef::new(node))
    }
}

impl<T> From<T> for Input<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: Clone> Clone for Input<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Node(node) => Self::Node(node.clone()),
            Self::Redirect(node) => Self::Redirect(node.clone()),
        }
    }
}

/// Values compare by value, node references by node identity.
impl<T: PartialEq> PartialEq for Input<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a.id() == b.id(),
            (Self::Redirect(a), Self::Redirect(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(&node.id()).finish(),
            Self::Redirect(node) => f.debug_tuple("Redirect").field(&node.id()).finish(),
        }
    }
}

/// Records the nodes a computation reads.
#[derive(Debug, Default)]
pub struct Inputs {
    read: NodeSet,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `node` and record it as a dependency.
    pub fn read<T, N: Gettable<T> + 'static>(&mut self, node: &Arc<N>) -> Result<T, ValueError> {
        self.read.insert(NodeHandle::from(node.clone()));
        node.get()
    }

    /// Read through a typed reference and record it as a dependency.
    pub fn get<T>(&mut self, node: &GettableRef<T>) -> Result<T, ValueError> {
        self.read.insert(node.handle.clone());
        node.node.get()
    }

    /// Follow `input` to a plain value, recording every node on the way.
    pub fn resolve<T: Clone>(&mut self, input: &Input<T>) -> Result<T, ValueError> {
        let mut current = input.clone();
        loop {
            current = match current {
                Input::Value(value) => return Ok(value),
                Input::Node(node) => return self.get(&node),
                Input::Redirect(node) => self.get(&node)?,
            };
        }
    }

    /// Nodes read so far.
    pub fn recorded(&self) -> &NodeSet {
        &self.read
    }

    pub(crate) fn into_recorded(self) -> NodeSet {
        self.read
    }
}
