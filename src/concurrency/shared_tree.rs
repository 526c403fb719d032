//! Reader-writer locked handle to a tree.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::Result;
use crate::index::{InvariantViolation, OrderedSet, StatsSnapshot};

/// A cloneable, thread-safe handle to one tree.
///
/// # Thread Safety
/// - `insert` / `delete` / `clear`: write lock, one mutation at a time
/// - `search` / `len` / `to_vec` / `validate`: read lock, many readers
///
/// Every operation runs to completion under its lock, so readers never see
/// a half-applied split or merge.
///
/// # Example
/// ```
/// use interchangetree::{BPlusTree, SharedTree};
/// use std::thread;
///
/// let tree = SharedTree::new(BPlusTree::new(3).unwrap());
/// let handles: Vec<_> = (0..4u32)
///     .map(|i| {
///         let tree = tree.clone();
///         thread::spawn(move || {
///             for key in (i * 100)..(i * 100 + 100) {
///                 tree.insert(key);
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(tree.len(), 400);
/// ```
pub struct SharedTree<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> SharedTree<T> {
    /// Take ownership of `tree` behind a lock.
    pub fn new(tree: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Run `f` with shared access, e.g. to render or traverse the tree.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Run `f` with exclusive access, e.g. to apply a batch atomically.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }
}

impl<T: OrderedSet> SharedTree<T> {
    /// Add `key`; `false` if it was already present.
    pub fn insert(&self, key: T::Key) -> bool {
        self.inner.write().insert(key)
    }

    /// Remove `key`.
    ///
    /// # Errors
    /// `Error::NotFound` if the key is absent.
    pub fn delete(&self, key: &T::Key) -> Result<()> {
        self.inner.write().delete(key)
    }

    /// Membership test.
    pub fn search(&self, key: &T::Key) -> bool {
        self.inner.read().search(key)
    }

    /// Remove every key.
    pub fn clear(&self) {
        self.inner.write().clear()
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// True if the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// All keys in ascending order.
    pub fn to_vec(&self) -> Vec<T::Key> {
        self.inner.read().to_vec()
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> std::result::Result<(), InvariantViolation> {
        self.inner.read().validate()
    }

    /// Snapshot of the structural counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.read().stats()
    }
}

impl<T> Clone for SharedTree<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::index::{BPlusTree, BTree};
    use std::thread;

    #[test]
    fn test_concurrent_inserts_btree() {
        let tree = SharedTree::new(BTree::<u32>::new(2).unwrap());

        let handles: Vec<_> = (0..4u32)
            .map(|i| {
                let tree = tree.clone();
                thread::spawn(move || {
                    for key in (0..250u32).map(|k| k * 4 + i) {
                        assert!(tree.insert(key));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tree.len(), 1000);
        assert_eq!(tree.to_vec(), (0..1000).collect::<Vec<u32>>());
        tree.validate().unwrap();
    }

    #[test]
    fn test_concurrent_mixed_bplus() {
        let tree = SharedTree::new(BPlusTree::<u32>::new(3).unwrap());
        for key in 0..500u32 {
            tree.insert(key);
        }

        let writer = {
            let tree = tree.clone();
            thread::spawn(move || {
                for key in (0..500u32).filter(|k| k % 2 == 0) {
                    tree.delete(&key).unwrap();
                }
            })
        };
        let reader = {
            let tree = tree.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    // Every snapshot is a consistent tree
                    tree.validate().unwrap();
                    assert!(tree.search(&499u32));
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();

        assert_eq!(tree.len(), 250);
        assert_eq!(tree.delete(&0u32), Err(Error::NotFound));
        tree.validate().unwrap();
    }

    #[test]
    fn test_read_and_write_closures() {
        let tree = SharedTree::new(BPlusTree::<char>::new(2).unwrap());
        tree.write(|t| t.extend('A'..='G'));

        let chain: String = tree.read(|t| t.iter().collect());
        assert_eq!(chain, "ABCDEFG");

        let height = tree.read(|t| t.height());
        assert!(height >= 2);

        tree.clear();
        assert!(tree.is_empty());
    }
}
