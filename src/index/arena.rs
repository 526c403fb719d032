//! Slot arena holding B+-tree nodes by stable handle.

use std::ops::{Index, IndexMut};

use crate::common::NodeId;

/// Owns every node of one tree; nodes refer to each other by [`NodeId`].
///
/// # Architecture
/// ```text
/// ┌───────────────────────────────────────────────┐
/// │                   Arena<T>                    │
/// │  slots: [Some(n0)] [None] [Some(n2)] ...      │
/// │  free_list: [1]  (LIFO, reused by alloc)      │
/// └───────────────────────────────────────────────┘
/// ```
///
/// Handles stay valid until the node is freed. Reading through a freed
/// handle is a bug in the caller and panics.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    /// Node storage; `None` marks a free slot.
    slots: Vec<Option<T>>,

    /// Stack of free slot IDs (LIFO for cache locality).
    free_list: Vec<NodeId>,
}

impl<T> Arena<T> {
    /// Create an empty arena.
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Store `value` and return its handle, reusing a freed slot if any.
    pub(crate) fn alloc(&mut self, value: T) -> NodeId {
        match self.free_list.pop() {
            Some(id) => {
                debug_assert!(self.slots[id.0].is_none(), "{id} is still live");
                self.slots[id.0] = Some(value);
                id
            }
            None => {
                self.slots.push(Some(value));
                NodeId::new(self.slots.len() - 1)
            }
        }
    }

    /// Remove the node behind `id` and hand it back to the caller.
    ///
    /// # Panics
    /// Panics if `id` was already freed.
    pub(crate) fn free(&mut self, id: NodeId) -> T {
        let value = self.slots[id.0]
            .take()
            .unwrap_or_else(|| panic!("double free of {id}"));
        self.free_list.push(id);
        value
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Drop every node and forget all handles.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        self.slots[id.0]
            .as_ref()
            .unwrap_or_else(|| panic!("stale handle {id}"))
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.slots[id.0]
            .as_mut()
            .unwrap_or_else(|| panic!("stale handle {id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_index() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");

        assert_eq!(arena[a], "a");
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 2);

        arena[a] = "z";
        assert_eq!(arena[a], "z");
    }

    #[test]
    fn test_free_recycles_slot() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        let _b = arena.alloc(2);

        assert_eq!(arena.free(a), 1);
        assert_eq!(arena.len(), 1);

        // LIFO: the freed slot comes back first
        let c = arena.alloc(3);
        assert_eq!(c, a);
        assert_eq!(arena[c], 3);
    }

    #[test]
    #[should_panic(expected = "stale handle")]
    fn test_stale_handle_panics() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        arena.free(a);
        let _ = arena[a];
    }

    #[test]
    fn test_clear() {
        let mut arena = Arena::new();
        arena.alloc(1);
        arena.alloc(2);
        arena.clear();
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.alloc(7), NodeId::new(0));
    }
}
