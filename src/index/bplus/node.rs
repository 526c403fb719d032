//! B+-tree nodes stored in an [`Arena`].

use std::fmt;

use crate::common::NodeId;
use crate::index::arena::Arena;
use crate::index::view::NodeView;

/// One node in the arena.
///
/// `parent` is a lookup handle only; ownership runs exclusively from the
/// arena through `children`.
#[derive(Debug)]
pub(super) struct PlusNode<K> {
    pub(super) keys: Vec<K>,
    pub(super) parent: Option<NodeId>,
    pub(super) kind: NodeKind,
}

/// What distinguishes a leaf from an internal node.
///
/// Only leaves carry a forward link and only internal nodes carry children.
#[derive(Debug)]
pub(super) enum NodeKind {
    Leaf { next: Option<NodeId> },
    Internal { children: Vec<NodeId> },
}

impl<K> PlusNode<K> {
    pub(super) fn leaf(keys: Vec<K>, next: Option<NodeId>, parent: Option<NodeId>) -> Self {
        Self {
            keys,
            parent,
            kind: NodeKind::Leaf { next },
        }
    }

    pub(super) fn internal(keys: Vec<K>, children: Vec<NodeId>, parent: Option<NodeId>) -> Self {
        Self {
            keys,
            parent,
            kind: NodeKind::Internal { children },
        }
    }

    #[inline]
    pub(super) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    #[inline]
    pub(super) fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::Internal { children } => children,
        }
    }

    pub(super) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        match &mut self.kind {
            NodeKind::Internal { children } => children,
            NodeKind::Leaf { .. } => panic!("leaf nodes have no children"),
        }
    }

    /// Child `i`, or `None` for leaves.
    #[inline]
    pub(super) fn child_at(&self, i: usize) -> Option<NodeId> {
        self.children().get(i).copied()
    }

    #[inline]
    pub(super) fn next(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Leaf { next } => next,
            NodeKind::Internal { .. } => None,
        }
    }

    pub(super) fn set_next(&mut self, link: Option<NodeId>) {
        match &mut self.kind {
            NodeKind::Leaf { next } => *next = link,
            NodeKind::Internal { .. } => panic!("internal nodes are not in the leaf chain"),
        }
    }
}

/// Read-only handle to a B+-tree node, handed out for rendering and
/// traversal.
///
/// Borrowing the tree keeps the handle valid: no mutation can happen while
/// a `NodeRef` exists.
pub struct NodeRef<'a, K> {
    nodes: &'a Arena<PlusNode<K>>,
    id: NodeId,
}

impl<'a, K> NodeRef<'a, K> {
    pub(super) fn new(nodes: &'a Arena<PlusNode<K>>, id: NodeId) -> Self {
        Self { nodes, id }
    }

    fn node(&self) -> &'a PlusNode<K> {
        let nodes: &'a Arena<PlusNode<K>> = self.nodes;
        &nodes[self.id]
    }

    /// Arena handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// True for leaf nodes.
    pub fn is_leaf(&self) -> bool {
        self.node().is_leaf()
    }

    /// Keys of this node. For internal nodes these are separator copies.
    pub fn keys(&self) -> &'a [K] {
        &self.node().keys
    }

    /// Children in key order; empty for leaves.
    pub fn children(&self) -> Vec<NodeRef<'a, K>> {
        self.node()
            .children()
            .iter()
            .map(|&id| NodeRef::new(self.nodes, id))
            .collect()
    }

    /// The following leaf in the leaf chain; `None` for the last leaf and
    /// for internal nodes.
    pub fn next_leaf(&self) -> Option<NodeRef<'a, K>> {
        self.node().next().map(|id| NodeRef::new(self.nodes, id))
    }

    pub(super) fn parent_id(&self) -> Option<NodeId> {
        self.node().parent
    }
}

impl<K> Clone for NodeRef<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NodeRef<'_, K> {}

impl<K> PartialEq for NodeRef<'_, K> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.nodes, other.nodes) && self.id == other.id
    }
}

impl<K> Eq for NodeRef<'_, K> {}

impl<K: fmt::Debug> fmt::Debug for NodeRef<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("leaf", &self.is_leaf())
            .field("keys", &self.keys())
            .finish()
    }
}

impl<'a, K: 'a> NodeView<'a, K> for NodeRef<'a, K> {
    fn is_leaf(&self) -> bool {
        NodeRef::is_leaf(self)
    }

    fn keys(&self) -> &'a [K] {
        NodeRef::keys(self)
    }

    fn children(&self) -> Vec<Self> {
        NodeRef::children(self)
    }

    fn next_leaf(&self) -> Option<Self> {
        NodeRef::next_leaf(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_and_internal_shape() {
        let leaf: PlusNode<u32> = PlusNode::leaf(vec![1, 2], None, None);
        assert!(leaf.is_leaf());
        assert!(leaf.children().is_empty());
        assert_eq!(leaf.child_at(0), None);

        let internal: PlusNode<u32> =
            PlusNode::internal(vec![5], vec![NodeId::new(0), NodeId::new(1)], None);
        assert!(!internal.is_leaf());
        assert_eq!(internal.child_at(1), Some(NodeId::new(1)));
        assert_eq!(internal.next(), None);
    }

    #[test]
    fn test_set_next_links_leaves() {
        let mut leaf: PlusNode<u32> = PlusNode::leaf(vec![], None, None);
        leaf.set_next(Some(NodeId::new(7)));
        assert_eq!(leaf.next(), Some(NodeId::new(7)));
    }

    #[test]
    #[should_panic(expected = "not in the leaf chain")]
    fn test_set_next_on_internal_panics() {
        let mut internal: PlusNode<u32> = PlusNode::internal(vec![], vec![], None);
        internal.set_next(None);
    }

    #[test]
    fn test_node_ref_views_arena() {
        let mut arena = Arena::new();
        let right = arena.alloc(PlusNode::leaf(vec![5, 6], None, None));
        let left = arena.alloc(PlusNode::leaf(vec![1, 2], Some(right), None));
        let root = arena.alloc(PlusNode::internal(vec![5], vec![left, right], None));

        let view = NodeRef::new(&arena, root);
        assert!(!view.is_leaf());
        assert_eq!(view.keys(), &[5]);

        let children = view.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].keys(), &[1, 2]);
        assert_eq!(children[0].next_leaf(), Some(children[1]));
        assert_eq!(children[1].next_leaf(), None);
    }
}
