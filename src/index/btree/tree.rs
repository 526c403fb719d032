//! Classic B-tree: keys live at every level.

use std::fmt::{self, Debug};

use tracing::debug;

use crate::common::{Error, Order, Result};
use crate::index::btree::node::Node;
use crate::index::stats::{StatsSnapshot, TreeStats};
use crate::index::validate::{check_structure, InvariantViolation, SeparatorRule};
use crate::index::view;

/// An ordered set backed by a classic B-tree of minimum degree `t`.
///
/// # Structure
/// ```text
///                 [ C ]                 keys live in every node
///               /       \
///         [ A B ]       [ D E ]
/// ```
///
/// Insertion splits full nodes on the way down, so the tree only grows at
/// the root. Deletion tops up every node on the path before descending
/// into it, so the removal itself never leaves a node under `t - 1` keys.
///
/// # Example
/// ```
/// use interchangetree::BTree;
///
/// let mut tree = BTree::new(2).unwrap();
/// for key in ['A', 'B', 'C', 'D', 'E'] {
///     assert!(tree.insert(key));
/// }
/// assert!(!tree.insert('C'));
///
/// tree.delete(&'A').unwrap();
/// assert!(!tree.search(&'A'));
/// assert_eq!(tree.to_vec(), vec!['B', 'C', 'D', 'E']);
/// ```
pub struct BTree<K> {
    /// Exclusively owned root; an empty tree is an empty leaf.
    root: Node<K>,

    order: Order,

    /// Number of keys currently stored.
    len: usize,

    stats: TreeStats,
}

impl<K: Ord + Clone> BTree<K> {
    /// Create an empty tree with minimum degree `t`.
    ///
    /// # Errors
    /// `Error::InvalidConfiguration` if `t < 2`.
    pub fn new(t: usize) -> Result<Self> {
        Ok(Self::with_order(Order::new(t)?))
    }

    /// Create an empty tree with an already validated order.
    pub fn with_order(order: Order) -> Self {
        Self {
            root: Node::empty_leaf(),
            order,
            len: 0,
            stats: TreeStats::new(),
        }
    }

    /// The tree's minimum degree.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Read-only access to the root for rendering.
    pub fn root(&self) -> &Node<K> {
        &self.root
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels; an empty or single-leaf tree has height 1.
    pub fn height(&self) -> usize {
        view::height(&self.root)
    }

    /// Membership test.
    pub fn search(&self, key: &K) -> bool {
        self.root.find(key).is_some()
    }

    /// The node holding `key` and the key's position within it.
    pub fn find(&self, key: &K) -> Option<(&Node<K>, usize)> {
        self.root.find(key)
    }

    /// Add `key`. Returns `false` and leaves the tree untouched if it is
    /// already present.
    pub fn insert(&mut self, key: K) -> bool {
        if self.search(&key) {
            debug!(len = self.len, "duplicate insert rejected");
            return false;
        }

        if self.root.keys().len() == self.order.max_keys() {
            let old_root = std::mem::replace(&mut self.root, Node::empty_leaf());
            self.root = old_root.grow(self.order, &self.stats);
        }
        self.root.insert_non_full(key, self.order, &self.stats);
        self.len += 1;
        true
    }

    /// Remove `key`.
    ///
    /// # Errors
    /// `Error::NotFound` if the key is absent; the tree is left untouched.
    pub fn delete(&mut self, key: &K) -> Result<()> {
        if !self.search(key) {
            debug!(len = self.len, "delete of absent key");
            return Err(Error::NotFound);
        }

        self.root.remove(key, self.order, &self.stats);
        if !self.root.is_leaf() && self.root.keys().is_empty() {
            let old_root = std::mem::replace(&mut self.root, Node::empty_leaf());
            self.root = old_root.collapse(&self.stats);
        }
        self.len -= 1;
        Ok(())
    }

    /// Remove every key, leaving an empty leaf root and zeroed counters.
    pub fn clear(&mut self) {
        self.root = Node::empty_leaf();
        self.len = 0;
        self.stats.reset();
    }

    /// Keys in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(&self.root)
    }

    /// Smallest key.
    pub fn first(&self) -> Option<&K> {
        let mut node = &self.root;
        while let Some(child) = node.children().first() {
            node = child;
        }
        node.keys().first()
    }

    /// Largest key.
    pub fn last(&self) -> Option<&K> {
        let mut node = &self.root;
        while let Some(child) = node.children().last() {
            node = child;
        }
        node.keys().last()
    }

    /// Copy of all keys in ascending order.
    pub fn to_vec(&self) -> Vec<K> {
        self.iter().cloned().collect()
    }

    /// Snapshot of the structural counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> std::result::Result<(), InvariantViolation>
    where
        K: Debug,
    {
        let actual = check_structure(&self.root, self.order, SeparatorRule::Strict)?;
        if actual != self.len {
            return Err(InvariantViolation::Length {
                reported: self.len,
                actual,
            });
        }
        Ok(())
    }
}

impl<K: Ord + Clone> Default for BTree<K> {
    fn default() -> Self {
        Self::with_order(Order::DEFAULT)
    }
}

impl<K: Ord + Clone> Extend<K> for BTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Debug> fmt::Display for BTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        view::render(&self.root, f)
    }
}

impl<K: Debug> Debug for BTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BTree")
            .field("order", &self.order)
            .field("len", &self.len)
            .field("root", &self.root)
            .finish()
    }
}

/// In-order iterator over a classic B-tree.
///
/// Each frame is a node and the index of the next key to yield from it;
/// the child left of that key has already been visited.
pub struct Iter<'a, K> {
    stack: Vec<(&'a Node<K>, usize)>,
}

impl<'a, K> Iter<'a, K> {
    fn new(root: &'a Node<K>) -> Self {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut node: &'a Node<K>) {
        loop {
            self.stack.push((node, 0));
            match node.children().first() {
                Some(child) => node = child,
                None => return,
            }
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        while let Some((node, idx)) = self.stack.pop() {
            if idx < node.keys().len() {
                self.stack.push((node, idx + 1));
                if let Some(child) = node.children().get(idx + 1) {
                    self.push_left_spine(child);
                }
                return Some(&node.keys()[idx]);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_of(t: usize, keys: impl IntoIterator<Item = u32>) -> BTree<u32> {
        let mut tree = BTree::new(t).unwrap();
        tree.extend(keys);
        tree
    }

    #[test]
    fn test_new_rejects_order_one() {
        assert!(matches!(
            BTree::<u32>::new(1),
            Err(Error::InvalidConfiguration { order: 1, .. })
        ));
    }

    #[test]
    fn test_root_split_promotes_median() {
        let tree = tree_of(2, [1, 2, 3, 4]);

        // Root [1,2,3] was full when 4 arrived: 2 moves up, leaves keep 1 and 3
        assert_eq!(tree.root().keys(), &[2]);
        assert_eq!(tree.root().children()[0].keys(), &[1]);
        assert_eq!(tree.root().children()[1].keys(), &[3, 4]);
        assert_eq!(tree.height(), 2);
        tree.validate().unwrap();
    }

    #[test]
    fn test_delete_from_internal_uses_successor() {
        // [2] over [1] [3,4]: left child at minimum, right child has spare
        let mut tree = tree_of(2, [1, 2, 3, 4]);
        tree.delete(&2).unwrap();

        assert_eq!(tree.root().keys(), &[3]);
        assert_eq!(tree.to_vec(), vec![1, 3, 4]);
        tree.validate().unwrap();

        // Now [3] over [1] [4]: both at minimum, so they merge and the root collapses
        tree.delete(&3).unwrap();
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().keys(), &[1, 4]);
        assert_eq!(tree.stats().height_shrinks, 1);
        tree.validate().unwrap();
    }

    #[test]
    fn test_iter_is_sorted() {
        let keys = [50u32, 20, 80, 10, 30, 70, 90, 60, 40, 0, 15, 25];
        let tree = tree_of(2, keys);

        let mut expected = keys.to_vec();
        expected.sort_unstable();
        assert_eq!(tree.to_vec(), expected);
        assert_eq!(tree.first(), Some(&0));
        assert_eq!(tree.last(), Some(&90));
    }

    #[test]
    fn test_delete_absent_is_not_found() {
        let mut tree = tree_of(3, 0..10);
        assert_eq!(tree.delete(&42), Err(Error::NotFound));
        assert_eq!(tree.len(), 10);
        tree.validate().unwrap();
    }

    #[test]
    fn test_clear_resets_to_empty_leaf() {
        let mut tree = tree_of(2, 0..20);
        tree.clear();

        assert!(tree.is_empty());
        assert!(tree.root().is_leaf());
        assert_eq!(tree.iter().count(), 0);
        assert_eq!(tree.first(), None);
    }

    #[test]
    fn test_clear_zeroes_stats() {
        let mut tree = tree_of(2, 0..64);
        assert!(tree.stats().splits > 0);

        tree.clear();
        assert_eq!(tree.stats(), StatsSnapshot::default());
        assert_eq!(tree.stats().net_height(), tree.height() as i64 - 1);

        tree.extend(0..64);
        assert_eq!(tree.stats().net_height(), tree.height() as i64 - 1);
    }

    #[test]
    fn test_display_renders_levels() {
        let tree = tree_of(2, [1, 2, 3, 4]);
        assert_eq!(format!("{}", tree), "[2]\n  L[1]\n  L[3, 4]\n");
    }
}
