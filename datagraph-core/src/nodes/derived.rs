//! Derived Nodes
//!
//! A derived node is a memoized value computed from other nodes.
//!
//! # How Derived Nodes Work
//!
//! 1. The graph calls `update_value`, which runs the computation with a fresh
//!    [`Inputs`] recorder.
//!
//! 2. Every node the computation reads is recorded. The recorded set is what
//!    the node reports from its dependency accessor, so the graph rewires
//!    its edges after the pass.
//!
//! 3. The result is compared with the cached value. Only an unequal result
//!    (or the first one) replaces the cache and bumps the version.
//!
//! Because dependencies come from the previous run, a freshly registered
//! derived node has no edges until its first recompute. Run a pass over it
//! (for example `update_all_nodes`) right after registering it.
//!
//! # Thread Safety
//!
//! The cached value and version sit behind one `RwLock`, the recorded
//! dependencies behind a `Mutex`. The computation runs without either lock
//! held, so it may read other nodes freely.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::inputs::Inputs;
use super::Gettable;
use crate::error::ValueError;
use crate::graph::{DataNode, NodeId, NodeSet, Version};

/// Equality used to decide whether a new value counts as a change.
pub type Equality<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

type Compute<T> = Box<dyn Fn(&mut Inputs) -> Result<T, ValueError> + Send + Sync>;

struct Cached<T> {
    value: Option<T>,
    version: Version,
}

/// A memoized value computed from other nodes.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use datagraph_core::nodes::{ConstantNode, DerivedNode, Gettable};
/// use datagraph_core::{ActionQueue, DataGraph};
///
/// let name = Arc::new(ConstantNode::new(String::from("bob")));
/// let length = Arc::new(DerivedNode::new({
///     let name = name.clone();
///     move |inputs| Ok(inputs.read(&name)?.len())
/// }));
///
/// let mut graph = DataGraph::new();
/// graph.add_node(name.clone()).unwrap();
/// graph.add_node(length.clone()).unwrap();
/// graph.update_all_nodes(&ActionQueue::new()).unwrap();
///
/// assert_eq!(length.get().unwrap(), 3);
/// ```
pub struct DerivedNode<T> {
    id: NodeId,
    name: Cow<'static, str>,
    compute: Compute<T>,
    equals: Equality<T>,
    cached: RwLock<Cached<T>>,
    dependencies: Mutex<NodeSet>,
}

impl<T> DerivedNode<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a derived node compared with `PartialEq`.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&mut Inputs) -> Result<T, ValueError> + Send + Sync + 'static,
    {
        Self::with_equality(compute, |a: &T, b: &T| a == b)
    }
}

impl<T> DerivedNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a derived node with a custom change test.
    pub fn with_equality<F, E>(compute: F, equals: E) -> Self
    where
        F: Fn(&mut Inputs) -> Result<T, ValueError> + Send + Sync + 'static,
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            id: NodeId::new(),
            name: Cow::Borrowed("DerivedNode"),
            compute: Box::new(compute),
            equals: Arc::new(equals),
            cached: RwLock::new(Cached {
                value: None,
                version: Version::default(),
            }),
            dependencies: Mutex::new(NodeSet::new()),
        }
    }

    /// Label this node in logs and errors.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.cached.read().value.is_some()
    }
}

impl<T> DataNode for DerivedNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn id(&self) -> NodeId {
        self.id
    }

    fn version(&self) -> Version {
        self.cached.read().version
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn update_value(&self) -> Result<(), ValueError> {
        let mut inputs = Inputs::new();
        let result = (self.compute)(&mut inputs);
        *self.dependencies.lock() = inputs.into_recorded();
        let value = result?;

        let mut cached = self.cached.write();
        let unchanged = cached
            .value
            .as_ref()
            .is_some_and(|current| (self.equals)(current, &value));
        if !unchanged {
            cached.value = Some(value);
            cached.version = cached.version.next();
        }
        Ok(())
    }

    fn dependencies(&self) -> Option<NodeSet> {
        Some(self.dependencies.lock().clone())
    }
}

impl<T> Gettable<T> for DerivedNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> Result<T, ValueError> {
        self.cached
            .read()
            .value
            .clone()
            .ok_or_else(|| ValueError::Uninitialized {
                node: self.id,
                name: self.name.to_string(),
            })
    }
}

impl<T: fmt::Debug> fmt::Debug for DerivedNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.cached.read();
        f.debug_struct("DerivedNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value", &cached.value)
            .field("version", &cached.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI32, Ordering};

    use super::*;
    use crate::graph::NodeHandle;
    use crate::nodes::{ConstantNode, Input};

    #[test]
    fn read_before_first_recompute_fails() {
        let node = DerivedNode::new(|_| Ok(1)).named("one");
        let err = node.get().unwrap_err();
        assert_eq!(
            err,
            ValueError::Uninitialized {
                node: node.id(),
                name: "one".into()
            }
        );
        assert!(!node.is_initialized());
    }

    #[test]
    fn version_moves_only_on_unequal_values() {
        let source = Arc::new(AtomicI32::new(1));
        let node = {
            let source = source.clone();
            DerivedNode::new(move |_| Ok(source.load(Ordering::SeqCst) / 2))
        };

        node.update_value().unwrap();
        let first = node.version();
        assert_eq!(node.get().unwrap(), 0);

        // 1 / 2 == 0 again: recompute leaves the version alone.
        node.update_value().unwrap();
        assert_eq!(node.version(), first);

        source.store(4, Ordering::SeqCst);
        node.update_value().unwrap();
        assert_eq!(node.get().unwrap(), 2);
        assert_ne!(node.version(), first);
    }

    #[test]
    fn custom_equality_controls_change_detection() {
        let source = Arc::new(AtomicI32::new(10));
        let node = {
            let source = source.clone();
            DerivedNode::with_equality(
                move |_| Ok(source.load(Ordering::SeqCst)),
                |a: &i32, b: &i32| (a - b).abs() < 5,
            )
        };

        node.update_value().unwrap();
        let first = node.version();
        source.store(12, Ordering::SeqCst);
        node.update_value().unwrap();

        assert_eq!(node.version(), first);
        assert_eq!(node.get().unwrap(), 10);
    }

    #[test]
    fn dependencies_follow_the_last_recompute() {
        let flag = Arc::new(AtomicI32::new(0));
        let a = Arc::new(ConstantNode::new(1));
        let b = Arc::new(ConstantNode::new(2));
        let node = {
            let (flag, a, b) = (flag.clone(), a.clone(), b.clone());
            DerivedNode::new(move |inputs| {
                let source = if flag.load(Ordering::SeqCst) == 0 {
                    Input::node(&a)
                } else {
                    Input::node(&b)
                };
                inputs.resolve(&source)
            })
        };

        assert_eq!(node.dependencies(), Some(NodeSet::new()));

        node.update_value().unwrap();
        assert_eq!(node.dependencies(), Some([NodeHandle::from(a.clone())].into_iter().collect()));

        flag.store(1, Ordering::SeqCst);
        node.update_value().unwrap();
        assert_eq!(node.dependencies(), Some([NodeHandle::from(b.clone())].into_iter().collect()));
        assert_eq!(node.get().unwrap(), 2);
    }

    #[test]
    fn failed_recompute_keeps_the_cached_value() {
        let fail = Arc::new(AtomicI32::new(0));
        let node = {
            let fail = fail.clone();
            DerivedNode::new(move |_| {
                if fail.load(Ordering::SeqCst) == 0 {
                    Ok(5)
                } else {
                    Err(ValueError::Uninitialized {
                        node: NodeId::new(),
                        name: "upstream".into(),
                    })
                }
            })
        };

        node.update_value().unwrap();
        let version = node.version();
        fail.store(1, Ordering::SeqCst);

        assert!(node.update_value().is_err());
        assert_eq!(node.get().unwrap(), 5);
        assert_eq!(node.version(), version);
    }
}
