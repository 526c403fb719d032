//! Sharing a tree between threads.
//!
//! The trees are plain single-writer structures. [`SharedTree`] supplies the
//! one-lock-per-tree exclusivity they need when several threads use the
//! same instance.

mod shared_tree;

pub use shared_tree::SharedTree;
