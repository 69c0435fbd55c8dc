//! Node Flavors
//!
//! Ready-made [`DataNode`] implementations:
//!
//! - [`ConstantNode`]: a fixed value that never changes
//! - [`DerivedNode`]: a memoized value computed from other nodes, with
//!   dependencies tracked from what the computation actually reads
//! - [`ReducerNode`]: state that evolves only in response to actions
//!
//! All three expose their value through [`Gettable`], so a derived node can
//! read any of them without knowing which flavor it is reading.

mod constant;
mod derived;
mod inputs;
mod reducer;

pub use constant::ConstantNode;
pub use derived::{DerivedNode, Equality};
pub use inputs::{GettableRef, Input, Inputs};
pub use reducer::{Reducer, ReducerBuilder, ReducerNode};

use crate::error::ValueError;
use crate::graph::DataNode;

/// A node whose current value can be read.
pub trait Gettable<T>: DataNode {
    /// The node's current value.
    ///
    /// Fails with [`ValueError::Uninitialized`] if the node has not been
    /// recomputed yet.
    fn get(&self) -> Result<T, ValueError>;
}
