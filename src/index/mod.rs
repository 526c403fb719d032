//! Index structures: a classic B-tree and a B+-tree over any ordered key.
//!
//! # Components
//! - [`BTree`] - keys at every level, top-down fix-before-descend deletion
//! - [`BPlusTree`] - keys in leaves only, leaf chain, bottom-up rebalancing
//! - [`OrderedSet`] - the operations both trees share
//! - [`NodeView`] - read-only traversal contract for rendering
//! - [`StatsSnapshot`] - counters for splits, merges and borrows
//!
//! Both trees are single-threaded. Wrap one in a
//! [`SharedTree`](crate::concurrency::SharedTree) to share it between threads.

mod arena;
pub mod bplus;
pub mod btree;
mod stats;
pub mod validate;
pub mod view;

use std::fmt::Debug;

use crate::common::{Order, Result};

pub use bplus::{BPlusTree, NodeRef};
pub use btree::{BTree, Node};
pub use stats::StatsSnapshot;
pub use validate::InvariantViolation;
pub use view::NodeView;

/// Operations shared by both tree variants.
///
/// Lets callers (and [`SharedTree`](crate::concurrency::SharedTree)) pick a
/// variant without changing code.
pub trait OrderedSet {
    /// Key type stored in the set.
    type Key: Ord;

    /// The tree's minimum degree.
    fn order(&self) -> Order;

    /// Add `key`; `false` if it was already present.
    fn insert(&mut self, key: Self::Key) -> bool;

    /// Remove `key`.
    ///
    /// # Errors
    /// `Error::NotFound` if the key is absent.
    fn delete(&mut self, key: &Self::Key) -> Result<()>;

    /// Membership test.
    fn search(&self, key: &Self::Key) -> bool;

    /// Number of keys stored.
    fn len(&self) -> usize;

    /// True if the set holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every key.
    fn clear(&mut self);

    /// All keys in ascending order.
    fn to_vec(&self) -> Vec<Self::Key>;

    /// Check every structural invariant.
    fn validate(&self) -> std::result::Result<(), InvariantViolation>;

    /// Snapshot of the structural counters.
    fn stats(&self) -> StatsSnapshot;
}

impl<K: Ord + Clone + Debug> OrderedSet for BTree<K> {
    type Key = K;

    fn order(&self) -> Order {
        BTree::order(self)
    }

    fn insert(&mut self, key: K) -> bool {
        BTree::insert(self, key)
    }

    fn delete(&mut self, key: &K) -> Result<()> {
        BTree::delete(self, key)
    }

    fn search(&self, key: &K) -> bool {
        BTree::search(self, key)
    }

    fn len(&self) -> usize {
        BTree::len(self)
    }

    fn clear(&mut self) {
        BTree::clear(self)
    }

    fn to_vec(&self) -> Vec<K> {
        BTree::to_vec(self)
    }

    fn validate(&self) -> std::result::Result<(), InvariantViolation> {
        BTree::validate(self)
    }

    fn stats(&self) -> StatsSnapshot {
        BTree::stats(self)
    }
}

impl<K: Ord + Clone + Debug> OrderedSet for BPlusTree<K> {
    type Key = K;

    fn order(&self) -> Order {
        BPlusTree::order(self)
    }

    fn insert(&mut self, key: K) -> bool {
        BPlusTree::insert(self, key)
    }

    fn delete(&mut self, key: &K) -> Result<()> {
        BPlusTree::delete(self, key)
    }

    fn search(&self, key: &K) -> bool {
        BPlusTree::search(self, key)
    }

    fn len(&self) -> usize {
        BPlusTree::len(self)
    }

    fn clear(&mut self) {
        BPlusTree::clear(self)
    }

    fn to_vec(&self) -> Vec<K> {
        BPlusTree::to_vec(self)
    }

    fn validate(&self) -> std::result::Result<(), InvariantViolation> {
        BPlusTree::validate(self)
    }

    fn stats(&self) -> StatsSnapshot {
        BPlusTree::stats(self)
    }
}
