//! Classic B-tree.
//!
//! Keys are stored at every level. Children are owned directly by their
//! parent node, so the whole tree is a plain ownership hierarchy with no
//! back-references.

mod node;
mod tree;

pub use node::Node;
pub use tree::{BTree, Iter};
