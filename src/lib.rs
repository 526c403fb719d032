//! InterchangeTree - B-tree and B+-tree ordered sets with strict occupancy
//! invariants.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        InterchangeTree                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Presentation layer (out of crate)                 │   │
//! │  │   layout / rendering via NodeView, leaf-chain walks      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Concurrency (concurrency/)                     │   │
//! │  │         SharedTree: one RwLock per tree                  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Index Layer (index/)  [OrderedSet trait]          │   │
//! │  │              BTree  ←─OR─→  BPlusTree                    │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  owned Node hierarchy  |  Arena + NodeId links  │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  │      tree counters + invariant checker + NodeView        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (Order, NodeId, Error, config)
//! - [`index`] - The two tree variants and their traversal contract
//! - [`concurrency`] - Lock wrapper for sharing a tree between threads
//!
//! # Quick Start
//! ```
//! use interchangetree::{BPlusTree, BTree, Error};
//!
//! let mut classic = BTree::new(2).unwrap();
//! let mut plus = BPlusTree::new(2).unwrap();
//! for key in ['A', 'B', 'C', 'D', 'E'] {
//!     classic.insert(key);
//!     plus.insert(key);
//! }
//!
//! assert!(classic.search(&'C'));
//! assert_eq!(plus.delete(&'Z'), Err(Error::NotFound));
//! assert!(BTree::<char>::new(1).is_err());
//! ```

pub mod common;
pub mod concurrency;
pub mod index;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_ORDER, MIN_ORDER};
pub use common::{Error, NodeId, Order, Result};

pub use concurrency::SharedTree;
pub use index::{
    BPlusTree, BTree, InvariantViolation, Node, NodeRef, NodeView, OrderedSet, StatsSnapshot,
};
