//! Classic B-tree node and its structural primitives.
//!
//! Every key stored in a classic node is live, whether the node is a leaf or
//! internal. The primitives here (split, borrow, merge) all operate on a
//! parent's `keys`/`children` pair so the recursion in [`Node::remove`] and
//! [`Node::insert_non_full`] can fix a child before descending into it.

use tracing::trace;

use crate::common::Order;
use crate::index::stats::TreeStats;
use crate::index::view::NodeView;

/// A node of a classic B-tree.
///
/// Leaf and internal nodes are distinct variants, so a leaf can never carry
/// children. Each internal node exclusively owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<K> {
    Leaf {
        keys: Vec<K>,
    },
    Internal {
        keys: Vec<K>,
        /// Always `keys.len() + 1` entries.
        children: Vec<Node<K>>,
    },
}

impl<K> Node<K> {
    pub(crate) fn empty_leaf() -> Self {
        Node::Leaf { keys: Vec::new() }
    }

    /// True for leaf nodes.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Keys of this node, strictly ascending.
    #[inline]
    pub fn keys(&self) -> &[K] {
        match self {
            Node::Leaf { keys } | Node::Internal { keys, .. } => keys,
        }
    }

    /// Children in key order; empty for leaves.
    #[inline]
    pub fn children(&self) -> &[Node<K>] {
        match self {
            Node::Leaf { .. } => &[],
            Node::Internal { children, .. } => children,
        }
    }

    fn keys_mut(&mut self) -> &mut Vec<K> {
        match self {
            Node::Leaf { keys } | Node::Internal { keys, .. } => keys,
        }
    }

    #[inline]
    fn is_full(&self, order: Order) -> bool {
        self.keys().len() == order.max_keys()
    }

    /// Rightmost key of the subtree rooted here.
    fn last_key(&self) -> &K {
        let mut node = self;
        while let Some(child) = node.children().last() {
            node = child;
        }
        let keys = node.keys();
        assert!(!keys.is_empty(), "last_key of an empty subtree");
        &keys[keys.len() - 1]
    }

    /// Leftmost key of the subtree rooted here.
    fn first_key(&self) -> &K {
        let mut node = self;
        while let Some(child) = node.children().first() {
            node = child;
        }
        let keys = node.keys();
        assert!(!keys.is_empty(), "first_key of an empty subtree");
        &keys[0]
    }

    /// Move the upper half of a full node into a new sibling.
    ///
    /// Returns the median key, which belongs to neither half afterwards.
    fn split_upper(&mut self, order: Order) -> (K, Node<K>) {
        let t = order.min_degree();
        match self {
            Node::Leaf { keys } => {
                let upper = keys.split_off(t);
                let median = keys.remove(t - 1);
                (median, Node::Leaf { keys: upper })
            }
            Node::Internal { keys, children } => {
                let upper = keys.split_off(t);
                let median = keys.remove(t - 1);
                let upper_children = children.split_off(t);
                (
                    median,
                    Node::Internal {
                        keys: upper,
                        children: upper_children,
                    },
                )
            }
        }
    }

    /// Append `separator` and everything in `right` to this node.
    fn absorb(&mut self, separator: K, right: Node<K>) {
        match (self, right) {
            (Node::Leaf { keys }, Node::Leaf { keys: right_keys }) => {
                keys.push(separator);
                keys.extend(right_keys);
            }
            (
                Node::Internal { keys, children },
                Node::Internal {
                    keys: right_keys,
                    children: right_children,
                },
            ) => {
                keys.push(separator);
                keys.extend(right_keys);
                children.extend(right_children);
            }
            _ => unreachable!("merging nodes at different depths"),
        }
    }

    /// Turn a full root into the only child of a new root and split it.
    pub(crate) fn grow(self, order: Order, stats: &TreeStats) -> Node<K> {
        let mut keys = Vec::with_capacity(order.max_keys());
        let mut children = Vec::with_capacity(order.max_children());
        children.push(self);
        split_child(&mut keys, &mut children, 0, order, stats);
        stats.record_grow();
        trace!("classic tree grew a level");
        Node::Internal { keys, children }
    }

    /// Replace an internal node with no keys by its only child.
    pub(crate) fn collapse(self, stats: &TreeStats) -> Node<K> {
        match self {
            Node::Internal { keys, mut children } if keys.is_empty() => {
                assert_eq!(children.len(), 1, "empty internal node with {} children", children.len());
                stats.record_shrink();
                trace!("classic tree lost a level");
                children.remove(0)
            }
            node => node,
        }
    }
}

impl<K: Ord> Node<K> {
    /// Locate `key` in this subtree: the node holding it and its position.
    pub(crate) fn find(&self, key: &K) -> Option<(&Node<K>, usize)> {
        let mut node = self;
        loop {
            match node.keys().binary_search(key) {
                Ok(pos) => return Some((node, pos)),
                Err(i) => match node {
                    Node::Leaf { .. } => return None,
                    Node::Internal { children, .. } => node = &children[i],
                },
            }
        }
    }
}

impl<K: Ord + Clone> Node<K> {
    /// Insert into a subtree whose root is known not to be full.
    ///
    /// Full children are split before the descent reaches them, so no node
    /// on the path ever overflows.
    pub(crate) fn insert_non_full(&mut self, key: K, order: Order, stats: &TreeStats) {
        match self {
            Node::Leaf { keys } => {
                let pos = keys.partition_point(|k| k < &key);
                keys.insert(pos, key);
            }
            Node::Internal { keys, children } => {
                let mut i = keys.partition_point(|k| k < &key);
                if children[i].is_full(order) {
                    split_child(keys, children, i, order, stats);
                    if key > keys[i] {
                        i += 1;
                    }
                }
                children[i].insert_non_full(key, order, stats);
            }
        }
    }

    /// Remove `key` from this subtree, topping up every child on the path
    /// to at least `t` keys before descending into it.
    ///
    /// The caller guarantees `key` is present and that this node either is
    /// the root or holds at least `t` keys.
    pub(crate) fn remove(&mut self, key: &K, order: Order, stats: &TreeStats) {
        let t = order.min_degree();
        match self {
            Node::Leaf { keys } => {
                if let Ok(pos) = keys.binary_search(key) {
                    keys.remove(pos);
                }
            }
            Node::Internal { keys, children } => match keys.binary_search(key) {
                Ok(i) => {
                    if children[i].keys().len() >= t {
                        let predecessor = children[i].last_key().clone();
                        children[i].remove(&predecessor, order, stats);
                        keys[i] = predecessor;
                    } else if children[i + 1].keys().len() >= t {
                        let successor = children[i + 1].first_key().clone();
                        children[i + 1].remove(&successor, order, stats);
                        keys[i] = successor;
                    } else {
                        merge_children(keys, children, i, stats);
                        children[i].remove(key, order, stats);
                    }
                }
                Err(i) => {
                    let i = if children[i].keys().len() < t {
                        fill_child(keys, children, i, order, stats)
                    } else {
                        i
                    };
                    children[i].remove(key, order, stats);
                }
            },
        }
    }
}

/// Split the full child `i`, promoting its median into `keys[i]`.
fn split_child<K>(
    keys: &mut Vec<K>,
    children: &mut Vec<Node<K>>,
    i: usize,
    order: Order,
    stats: &TreeStats,
) {
    assert!(children[i].is_full(order), "split of a non-full child");
    let (median, sibling) = children[i].split_upper(order);
    keys.insert(i, median);
    children.insert(i + 1, sibling);
    stats.record_split();
    trace!(child = i, "classic split");
}

/// Bring child `i` up to `t` keys; returns the index to descend into.
///
/// Tries the left sibling, then the right sibling, then merges. When child
/// `i` is the last child it merges into its left sibling, which shifts the
/// descent index down by one.
fn fill_child<K>(
    keys: &mut Vec<K>,
    children: &mut Vec<Node<K>>,
    i: usize,
    order: Order,
    stats: &TreeStats,
) -> usize {
    let t = order.min_degree();
    if i > 0 && children[i - 1].keys().len() >= t {
        borrow_from_prev(keys, children, i, stats);
        i
    } else if i + 1 < children.len() && children[i + 1].keys().len() >= t {
        borrow_from_next(keys, children, i, stats);
        i
    } else if i + 1 < children.len() {
        merge_children(keys, children, i, stats);
        i
    } else {
        merge_children(keys, children, i - 1, stats);
        i - 1
    }
}

/// Rotate the left sibling's last key through `keys[i - 1]` into child `i`.
fn borrow_from_prev<K>(keys: &mut [K], children: &mut [Node<K>], i: usize, stats: &TreeStats) {
    let (left, right) = children.split_at_mut(i);
    let sibling = &mut left[i - 1];
    let child = &mut right[0];

    let Some(moved) = sibling.keys_mut().pop() else {
        unreachable!("borrow from an empty sibling");
    };
    let separator = std::mem::replace(&mut keys[i - 1], moved);
    child.keys_mut().insert(0, separator);

    match (sibling, child) {
        (Node::Internal { children: from, .. }, Node::Internal { children: to, .. }) => {
            if let Some(grandchild) = from.pop() {
                to.insert(0, grandchild);
            }
        }
        (Node::Leaf { .. }, Node::Leaf { .. }) => {}
        _ => unreachable!("siblings at different depths"),
    }
    stats.record_borrow();
    trace!(child = i, "classic borrow from left sibling");
}

/// Rotate the right sibling's first key through `keys[i]` into child `i`.
fn borrow_from_next<K>(keys: &mut [K], children: &mut [Node<K>], i: usize, stats: &TreeStats) {
    let (left, right) = children.split_at_mut(i + 1);
    let child = &mut left[i];
    let sibling = &mut right[0];

    let moved = sibling.keys_mut().remove(0);
    let separator = std::mem::replace(&mut keys[i], moved);
    child.keys_mut().push(separator);

    match (sibling, child) {
        (Node::Internal { children: from, .. }, Node::Internal { children: to, .. }) => {
            to.push(from.remove(0));
        }
        (Node::Leaf { .. }, Node::Leaf { .. }) => {}
        _ => unreachable!("siblings at different depths"),
    }
    stats.record_borrow();
    trace!(child = i, "classic borrow from right sibling");
}

/// Merge child `i + 1` and separator `keys[i]` into child `i`.
fn merge_children<K>(keys: &mut Vec<K>, children: &mut Vec<Node<K>>, i: usize, stats: &TreeStats) {
    let right = children.remove(i + 1);
    let separator = keys.remove(i);
    children[i].absorb(separator, right);
    stats.record_merge();
    trace!(child = i, "classic merge");
}

impl<'a, K: 'a> NodeView<'a, K> for &'a Node<K> {
    fn is_leaf(&self) -> bool {
        Node::is_leaf(*self)
    }

    fn keys(&self) -> &'a [K] {
        Node::keys(*self)
    }

    fn children(&self) -> Vec<Self> {
        Node::children(*self).iter().collect()
    }
}
