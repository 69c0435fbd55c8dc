//! Constant Nodes

use std::fmt;

use super::Gettable;
use crate::error::ValueError;
use crate::graph::{DataNode, NodeId, Version};

/// A node holding a value that never changes.
///
/// Its version is always `Version(0)`, so after the graph first observes it,
/// it never counts as changed again.
pub struct ConstantNode<T> {
    id: NodeId,
    value: T,
}

impl<T> ConstantNode<T> {
    pub fn new(value: T) -> Self {
        Self {
            id: NodeId::new(),
            value,
        }
    }
}

impl<T> DataNode for ConstantNode<T>
where
    T: Send + Sync + 'static,
{
    fn id(&self) -> NodeId {
        self.id
    }

    fn version(&self) -> Version {
        Version(0)
    }

    fn name(&self) -> &str {
        "ConstantNode"
    }
}

impl<T> Gettable<T> for ConstantNode<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> Result<T, ValueError> {
        Ok(self.value.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for ConstantNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantNode")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}
