//! Node handle type.

use std::fmt;

/// Identifies a node slot in the B+-tree's node arena.
///
/// Using `usize` so the handle indexes the slot vector directly:
/// `slots[node_id.0]`. A handle carries no ownership; the arena owns every
/// node and handles stored as parent or `next` links are plain lookups.
///
/// # Example
/// ```
/// use interchangetree::NodeId;
///
/// let id = NodeId::new(5);
/// assert_eq!(id.0, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Create a new NodeId.
    #[inline]
    pub fn new(id: usize) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_new() {
        let id = NodeId::new(10);
        assert_eq!(id.0, 10);
    }

    #[test]
    fn test_node_id_equality() {
        assert_eq!(NodeId::new(5), NodeId::new(5));
        assert_ne!(NodeId::new(5), NodeId::new(6));
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::new(42)), "Node(42)");
    }
}
