//! B+-tree.
//!
//! Nodes live in an arena and refer to each other
//! by [`NodeId`](crate::NodeId). Children are owned through the parent's
//! `children` list; the `parent` and leaf `next` handles are lookups only,
//! so there is no ownership cycle to manage.

mod node;
mod tree;

pub use node::NodeRef;
pub use tree::{BPlusTree, Iter, Leaves};
