//! B+-tree: keys live in the leaves, internal nodes hold separator copies.

use std::fmt::{self, Debug};

use tracing::{debug, trace};

use crate::common::{Error, NodeId, Order, Result};
use crate::index::arena::Arena;
use crate::index::bplus::node::{NodeKind, NodeRef, PlusNode};
use crate::index::stats::{StatsSnapshot, TreeStats};
use crate::index::validate::{check_structure, InvariantViolation, SeparatorRule};
use crate::index::view;

/// An ordered set backed by a B+-tree of minimum degree `t`.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────┐
/// │                       BPlusTree                          │
/// │                        [ C  E ]          separators      │
/// │                       /   |    \                         │
/// │                 [A B] → [C D] → [E F G] → None           │
/// │                    leaves + forward chain                │
/// │                                                          │
/// │  nodes: Arena<PlusNode>   (owns every node)              │
/// │  children: Vec<NodeId>    (owning direction)             │
/// │  parent / next: NodeId    (lookup only)                  │
/// └──────────────────────────────────────────────────────────┘
/// ```
///
/// Insertion splits full nodes on the way down; a leaf split copies the
/// first key of the new right leaf up as its separator. Deletion removes
/// from a leaf and then repairs underflow bottom-up: borrow from the left
/// sibling, else from the right sibling, else merge into the left-hand
/// node, repeating at the parent as needed.
///
/// # Example
/// ```
/// use interchangetree::BPlusTree;
///
/// let mut tree = BPlusTree::new(2).unwrap();
/// for key in 'A'..='G' {
///     tree.insert(key);
/// }
/// tree.delete(&'D').unwrap();
///
/// let chain: String = tree.iter().collect();
/// assert_eq!(chain, "ABCEFG");
/// ```
pub struct BPlusTree<K> {
    nodes: Arena<PlusNode<K>>,

    root: NodeId,

    order: Order,

    /// Number of keys stored in leaves.
    len: usize,

    stats: TreeStats,
}

impl<K: Ord + Clone> BPlusTree<K> {
    /// Create an empty tree with minimum degree `t`.
    ///
    /// # Errors
    /// `Error::InvalidConfiguration` if `t < 2`.
    pub fn new(t: usize) -> Result<Self> {
        Ok(Self::with_order(Order::new(t)?))
    }

    /// Create an empty tree with an already validated order.
    pub fn with_order(order: Order) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(PlusNode::leaf(Vec::new(), None, None));
        Self {
            nodes,
            root,
            order,
            len: 0,
            stats: TreeStats::new(),
        }
    }

    /// The tree's minimum degree.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes, leaves and internal nodes together.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Read-only handle to the root for rendering.
    pub fn root(&self) -> NodeRef<'_, K> {
        NodeRef::new(&self.nodes, self.root)
    }

    /// The leftmost leaf, where the leaf chain starts.
    pub fn first_leaf(&self) -> NodeRef<'_, K> {
        let mut id = self.root;
        while let Some(child) = self.nodes[id].child_at(0) {
            id = child;
        }
        NodeRef::new(&self.nodes, id)
    }

    /// Leaves in chain order, starting from the leftmost.
    pub fn leaves(&self) -> Leaves<'_, K> {
        Leaves {
            next: Some(self.first_leaf()),
        }
    }

    /// Keys in ascending order, read along the leaf chain.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            leaf: Some(self.first_leaf()),
            pos: 0,
        }
    }

    /// Number of levels; an empty or single-leaf tree has height 1.
    pub fn height(&self) -> usize {
        view::height(self.root())
    }

    /// Descend to the leaf whose range covers `key`.
    ///
    /// A key equal to a separator routes right: the separator is a copy of
    /// the right subtree's smallest key.
    fn find_leaf(&self, key: &K) -> NodeId {
        let mut id = self.root;
        loop {
            let node = &self.nodes[id];
            let i = node.keys.partition_point(|sep| sep <= key);
            match node.child_at(i) {
                Some(child) => id = child,
                None => return id,
            }
        }
    }

    /// Membership test. Only leaves are authoritative.
    pub fn search(&self, key: &K) -> bool {
        let leaf = self.find_leaf(key);
        self.nodes[leaf].keys.binary_search(key).is_ok()
    }

    /// The leaf holding `key`.
    pub fn find(&self, key: &K) -> Option<NodeRef<'_, K>> {
        let leaf = self.find_leaf(key);
        self.nodes[leaf]
            .keys
            .binary_search(key)
            .ok()
            .map(|_| NodeRef::new(&self.nodes, leaf))
    }

    /// Smallest key.
    pub fn first(&self) -> Option<&K> {
        self.first_leaf().keys().first()
    }

    /// Largest key.
    pub fn last(&self) -> Option<&K> {
        let mut id = self.root;
        while let Some(&child) = self.nodes[id].children().last() {
            id = child;
        }
        self.nodes[id].keys.last()
    }

    /// Copy of all keys in ascending order.
    pub fn to_vec(&self) -> Vec<K> {
        self.iter().cloned().collect()
    }

    /// Snapshot of the structural counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Add `key`. Returns `false` and leaves the tree untouched if it is
    /// already present.
    pub fn insert(&mut self, key: K) -> bool {
        if self.search(&key) {
            debug!(len = self.len, "duplicate insert rejected");
            return false;
        }

        if self.nodes[self.root].keys.len() == self.order.max_keys() {
            let old_root = self.root;
            let new_root = self
                .nodes
                .alloc(PlusNode::internal(Vec::new(), vec![old_root], None));
            self.nodes[old_root].parent = Some(new_root);
            self.root = new_root;
            self.split_child(new_root, 0);
            self.stats.record_grow();
            trace!(root = %new_root, "b+ tree grew a level");
        }

        self.insert_non_full(self.root, key);
        self.len += 1;
        true
    }

    fn insert_non_full(&mut self, mut id: NodeId, key: K) {
        let max = self.order.max_keys();
        loop {
            let node = &self.nodes[id];
            let mut i = node.keys.partition_point(|sep| sep <= &key);
            let Some(child) = node.child_at(i) else {
                self.nodes[id].keys.insert(i, key);
                return;
            };

            if self.nodes[child].keys.len() == max {
                self.split_child(id, i);
                if key >= self.nodes[id].keys[i] {
                    i += 1;
                }
                id = self.nodes[id].children()[i];
            } else {
                id = child;
            }
        }
    }

    /// Split the full child `i` of `parent`.
    ///
    /// Internal split: the median moves up and belongs to neither half.
    /// Leaf split: the right leaf's first key is copied up and the new leaf
    /// is spliced into the chain right after the old one.
    fn split_child(&mut self, parent: NodeId, i: usize) {
        let t = self.order.min_degree();
        let max = self.order.max_keys();
        let child = self.nodes[parent].children()[i];

        let node = &mut self.nodes[child];
        assert_eq!(node.keys.len(), max, "split of a non-full node");
        let (separator, sibling) = match &mut node.kind {
            NodeKind::Internal { children } => {
                let upper_keys = node.keys.split_off(t);
                let median = node.keys.remove(t - 1);
                let upper_children = children.split_off(t);
                (
                    median,
                    PlusNode::internal(upper_keys, upper_children, Some(parent)),
                )
            }
            NodeKind::Leaf { next } => {
                let upper_keys = node.keys.split_off(t - 1);
                let separator = upper_keys[0].clone();
                (
                    separator,
                    PlusNode::leaf(upper_keys, next.take(), Some(parent)),
                )
            }
        };

        let sibling = self.nodes.alloc(sibling);
        if self.nodes[child].is_leaf() {
            self.nodes[child].set_next(Some(sibling));
        } else {
            self.reparent_children(sibling);
        }

        let parent_node = &mut self.nodes[parent];
        parent_node.keys.insert(i, separator);
        parent_node.children_mut().insert(i + 1, sibling);

        self.stats.record_split();
        trace!(node = %child, sibling = %sibling, "b+ split");
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Remove `key`.
    ///
    /// # Errors
    /// `Error::NotFound` if the key is absent; the tree is left untouched.
    pub fn delete(&mut self, key: &K) -> Result<()> {
        let leaf = self.find_leaf(key);
        let Ok(pos) = self.nodes[leaf].keys.binary_search(key) else {
            debug!(len = self.len, "delete of absent key");
            return Err(Error::NotFound);
        };

        self.nodes[leaf].keys.remove(pos);
        self.len -= 1;

        if self.nodes[leaf].keys.len() < self.order.min_keys() {
            self.rebalance(leaf);
        }
        Ok(())
    }

    /// Repair underflow at `id`, walking up while merges leave the parent
    /// under minimum.
    fn rebalance(&mut self, mut id: NodeId) {
        let min = self.order.min_keys();
        loop {
            if id == self.root {
                self.collapse_root();
                return;
            }

            let Some(parent) = self.nodes[id].parent else {
                unreachable!("{id} is not the root but has no parent");
            };
            let idx = self.child_index(parent, id);
            let siblings = self.nodes[parent].children();
            let left = idx.checked_sub(1).map(|l| siblings[l]);
            let right = siblings.get(idx + 1).copied();

            if let Some(left) = left.filter(|&l| self.nodes[l].keys.len() > min) {
                self.borrow_from_left(id, left, parent, idx);
                return;
            }
            if let Some(right) = right.filter(|&r| self.nodes[r].keys.len() > min) {
                self.borrow_from_right(id, right, parent, idx);
                return;
            }

            match (left, right) {
                (Some(_), _) => self.merge(parent, idx - 1),
                (None, Some(_)) => self.merge(parent, idx),
                (None, None) => unreachable!("{id} has no siblings"),
            }

            if self.nodes[parent].keys.len() >= min {
                return;
            }
            id = parent;
        }
    }

    /// Replace an internal root with no keys by its only child.
    ///
    /// A leaf root may hold any number of keys, including none.
    fn collapse_root(&mut self) {
        let root = &self.nodes[self.root];
        if root.is_leaf() || !root.keys.is_empty() {
            return;
        }

        let old_root = self.root;
        let child = root.children()[0];
        self.nodes.free(old_root);
        self.nodes[child].parent = None;
        self.root = child;

        self.stats.record_shrink();
        trace!(root = %child, "b+ tree lost a level");
    }

    /// Move the left sibling's last key (and last child) to the front of
    /// `node`.
    fn borrow_from_left(&mut self, node: NodeId, left: NodeId, parent: NodeId, idx: usize) {
        let Some(moved) = self.nodes[left].keys.pop() else {
            unreachable!("borrow from an empty sibling");
        };

        if self.nodes[node].is_leaf() {
            self.nodes[parent].keys[idx - 1] = moved.clone();
            self.nodes[node].keys.insert(0, moved);
        } else {
            // Rotate through the parent: its separator drops into `node`,
            // the sibling's boundary key replaces it.
            let separator = std::mem::replace(&mut self.nodes[parent].keys[idx - 1], moved);
            self.nodes[node].keys.insert(0, separator);

            let Some(grandchild) = self.nodes[left].children_mut().pop() else {
                unreachable!("internal sibling without children");
            };
            self.nodes[node].children_mut().insert(0, grandchild);
            self.nodes[grandchild].parent = Some(node);
        }

        self.stats.record_borrow();
        trace!(node = %node, from = %left, "b+ borrow from left sibling");
    }

    /// Move the right sibling's first key (and first child) to the end of
    /// `node`.
    fn borrow_from_right(&mut self, node: NodeId, right: NodeId, parent: NodeId, idx: usize) {
        let moved = self.nodes[right].keys.remove(0);

        if self.nodes[node].is_leaf() {
            self.nodes[node].keys.push(moved);
            let separator = self.nodes[right].keys[0].clone();
            self.nodes[parent].keys[idx] = separator;
        } else {
            let separator = std::mem::replace(&mut self.nodes[parent].keys[idx], moved);
            self.nodes[node].keys.push(separator);

            let grandchild = self.nodes[right].children_mut().remove(0);
            self.nodes[node].children_mut().push(grandchild);
            self.nodes[grandchild].parent = Some(node);
        }

        self.stats.record_borrow();
        trace!(node = %node, from = %right, "b+ borrow from right sibling");
    }

    /// Merge child `left_idx + 1` of `parent` into child `left_idx`.
    ///
    /// The parent loses one separator and one child slot. Internal merges
    /// pull that separator down; leaf merges drop it and unlink the absorbed
    /// leaf from the chain.
    fn merge(&mut self, parent: NodeId, left_idx: usize) {
        let parent_node = &mut self.nodes[parent];
        let separator = parent_node.keys.remove(left_idx);
        let right = parent_node.children_mut().remove(left_idx + 1);
        let left = parent_node.children()[left_idx];

        let PlusNode {
            keys: right_keys,
            kind: right_kind,
            ..
        } = self.nodes.free(right);

        let left_node = &mut self.nodes[left];
        let moved = match (&mut left_node.kind, right_kind) {
            (NodeKind::Leaf { next }, NodeKind::Leaf { next: right_next }) => {
                left_node.keys.extend(right_keys);
                *next = right_next;
                Vec::new()
            }
            (
                NodeKind::Internal { children },
                NodeKind::Internal {
                    children: right_children,
                },
            ) => {
                left_node.keys.push(separator);
                left_node.keys.extend(right_keys);
                children.extend(right_children.iter().copied());
                right_children
            }
            _ => unreachable!("merging nodes at different depths"),
        };

        for grandchild in moved {
            self.nodes[grandchild].parent = Some(left);
        }

        self.stats.record_merge();
        trace!(node = %left, absorbed = %right, "b+ merge");
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> usize {
        self.nodes[parent]
            .children()
            .iter()
            .position(|&c| c == child)
            .unwrap_or_else(|| panic!("{child} is not a child of {parent}"))
    }

    fn reparent_children(&mut self, id: NodeId) {
        let children = self.nodes[id].children().to_vec();
        for child in children {
            self.nodes[child].parent = Some(id);
        }
    }

    /// Remove every key, leaving an empty leaf root and zeroed counters.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(PlusNode::leaf(Vec::new(), None, None));
        self.len = 0;
        self.stats.reset();
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check every structural invariant, the leaf chain and parent links.
    pub fn validate(&self) -> std::result::Result<(), InvariantViolation>
    where
        K: Debug,
    {
        let actual = check_structure(self.root(), self.order, SeparatorRule::Copied)?;
        if actual != self.len {
            return Err(InvariantViolation::Length {
                reported: self.len,
                actual,
            });
        }
        self.check_parent_links()?;
        self.check_leaf_chain()
    }

    fn check_parent_links(&self) -> std::result::Result<(), InvariantViolation> {
        let root = self.root();
        if root.parent_id().is_some() {
            return Err(InvariantViolation::ParentLink {
                child: root.id(),
                expected: None,
                found: root.parent_id(),
            });
        }

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            for child in node.children() {
                if child.parent_id() != Some(node.id()) {
                    return Err(InvariantViolation::ParentLink {
                        child: child.id(),
                        expected: Some(node.id()),
                        found: child.parent_id(),
                    });
                }
                stack.push(child);
            }
        }
        Ok(())
    }

    fn check_leaf_chain(&self) -> std::result::Result<(), InvariantViolation>
    where
        K: Debug,
    {
        let by_tree: Vec<NodeId> = view::leaves(self.root()).iter().map(|l| l.id()).collect();

        // Bounded so a cycle in the chain shows up as a mismatch
        let by_chain: Vec<NodeId> = self
            .leaves()
            .take(self.nodes.len() + 1)
            .map(|l| l.id())
            .collect();

        if by_tree != by_chain {
            return Err(InvariantViolation::LeafChain(format!(
                "tree order {:?}, chain order {:?}",
                by_tree, by_chain
            )));
        }

        let keys: Vec<&K> = self.iter().collect();
        if let Some(pair) = keys.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(InvariantViolation::LeafChain(format!(
                "{:?} precedes {:?}",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }
}

impl<K: Ord + Clone> Default for BPlusTree<K> {
    fn default() -> Self {
        Self::with_order(Order::DEFAULT)
    }
}

impl<K: Ord + Clone> Extend<K> for BPlusTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Debug> fmt::Display for BPlusTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        view::render(NodeRef::new(&self.nodes, self.root), f)
    }
}

impl<K: Debug> Debug for BPlusTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BPlusTree")
            .field("order", &self.order)
            .field("len", &self.len)
            .field("root", &self.root)
            .field("nodes", &self.nodes)
            .finish()
    }
}

/// Iterator over the leaf chain.
pub struct Leaves<'a, K> {
    next: Option<NodeRef<'a, K>>,
}

impl<'a, K> Iterator for Leaves<'a, K> {
    type Item = NodeRef<'a, K>;

    fn next(&mut self) -> Option<NodeRef<'a, K>> {
        let leaf = self.next?;
        self.next = leaf.next_leaf();
        Some(leaf)
    }
}

/// Ascending iterator over keys, following the leaf chain.
pub struct Iter<'a, K> {
    leaf: Option<NodeRef<'a, K>>,
    pos: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        loop {
            let leaf = self.leaf?;
            if let Some(key) = leaf.keys().get(self.pos) {
                self.pos += 1;
                return Some(key);
            }
            self.leaf = leaf.next_leaf();
            self.pos = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_of(t: usize, keys: impl IntoIterator<Item = u32>) -> BPlusTree<u32> {
        let mut tree = BPlusTree::new(t).unwrap();
        tree.extend(keys);
        tree
    }

    fn leaf_keys(tree: &BPlusTree<u32>) -> Vec<Vec<u32>> {
        tree.leaves().map(|leaf| leaf.keys().to_vec()).collect()
    }

    #[test]
    fn test_new_rejects_order_one() {
        assert!(matches!(
            BPlusTree::<u32>::new(1),
            Err(Error::InvalidConfiguration { order: 1, .. })
        ));
    }

    #[test]
    fn test_leaf_split_copies_separator() {
        let tree = tree_of(2, [1, 2, 3, 4]);

        // Leaf [1,2,3] split at index t-1: left keeps [1], right starts with 2
        assert_eq!(tree.root().keys(), &[2]);
        assert_eq!(leaf_keys(&tree), vec![vec![1], vec![2, 3, 4]]);
        tree.validate().unwrap();
    }

    #[test]
    fn test_search_routes_separator_right() {
        let tree = tree_of(2, [1, 2, 3, 4]);

        let leaf = tree.find(&2).unwrap();
        assert!(leaf.is_leaf());
        assert_eq!(leaf.keys(), &[2, 3, 4]);
        assert!(tree.find(&5).is_none());
    }

    #[test]
    fn test_delete_borrows_from_left_leaf() {
        // Reshape to [3] over [0,1,2] [3,4]; emptying the right leaf then
        // takes 2 from its left sibling.
        let mut tree = tree_of(2, [1, 2, 3, 4]);
        tree.delete(&1).unwrap();
        tree.insert(0);
        tree.insert(1);
        tree.validate().unwrap();

        let before = tree.stats().borrows;
        tree.delete(&4).unwrap();
        tree.delete(&3).unwrap();
        tree.validate().unwrap();
        assert!(tree.stats().borrows > before);
        assert_eq!(tree.to_vec(), vec![0, 1, 2]);
    }

    #[test]
    fn test_delete_merges_and_collapses_root() {
        let mut tree = tree_of(2, [1, 2, 3, 4]);
        assert_eq!(tree.height(), 2);

        tree.delete(&1).unwrap();
        tree.validate().unwrap();
        tree.delete(&2).unwrap();
        tree.validate().unwrap();
        tree.delete(&3).unwrap();
        tree.validate().unwrap();

        assert_eq!(tree.height(), 1);
        assert_eq!(tree.to_vec(), vec![4]);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.stats().height_shrinks >= 1);
    }

    #[test]
    fn test_delete_to_empty_leaves_empty_leaf_root() {
        let mut tree = tree_of(3, 0..30);
        for key in 0..30 {
            tree.delete(&key).unwrap();
            tree.validate().unwrap();
        }

        assert!(tree.is_empty());
        assert!(tree.root().is_leaf());
        assert!(tree.root().keys().is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_reinsert_key_equal_to_stale_separator() {
        let mut tree = tree_of(2, 1..=10);
        let separators: Vec<u32> = tree.root().keys().to_vec();

        // The separator can outlive its key
        let key = separators[0];
        tree.delete(&key).unwrap();
        tree.validate().unwrap();
        assert!(!tree.search(&key));

        assert!(tree.insert(key));
        tree.validate().unwrap();
        assert!(tree.search(&key));
        assert_eq!(tree.to_vec(), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_clear_resets_arena() {
        let mut tree = tree_of(2, 0..50);
        assert!(tree.node_count() > 1);

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.iter().count(), 0);
        assert_eq!(tree.first(), None);
        assert_eq!(tree.last(), None);
    }

    #[test]
    fn test_clear_zeroes_stats() {
        let mut tree = tree_of(2, 0..64);
        assert!(tree.stats().height_grows > 0);

        tree.clear();
        assert_eq!(tree.stats(), StatsSnapshot::default());
        assert_eq!(tree.stats().net_height(), tree.height() as i64 - 1);

        // Counting starts over from the fresh root
        tree.extend(0..64);
        assert_eq!(tree.stats().net_height(), tree.height() as i64 - 1);
    }

    #[test]
    fn test_first_and_last() {
        let tree = tree_of(2, [5, 3, 9, 1, 7]);
        assert_eq!(tree.first(), Some(&1));
        assert_eq!(tree.last(), Some(&9));
    }

    #[test]
    fn test_display_marks_leaves() {
        let tree = tree_of(2, [1, 2, 3, 4]);
        assert_eq!(format!("{}", tree), "[2]\n  L[1]\n  L[2, 3, 4]\n");
    }
}
