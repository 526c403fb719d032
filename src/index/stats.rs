//! Structural statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the structural operations a tree performs.
///
/// All fields are atomic so the counters can be bumped through `&self`
/// while the tree itself is being mutated through a different field.
///
/// # Memory Ordering
/// We use `Ordering::Relaxed` for all operations because:
/// - We only need atomicity (no partial updates)
/// - We don't need synchronization between different counters
///
/// Trees keep these private and hand out [`StatsSnapshot`]s.
#[derive(Debug)]
pub(crate) struct TreeStats {
    /// Number of node splits (including root splits).
    splits: AtomicU64,

    /// Number of sibling merges.
    merges: AtomicU64,

    /// Number of keys borrowed from a sibling.
    borrows: AtomicU64,

    /// Number of times the tree grew a level (root split).
    height_grows: AtomicU64,

    /// Number of times an empty internal root collapsed into its child.
    height_shrinks: AtomicU64,
}

impl TreeStats {
    /// Create a new stats tracker with all counters at zero.
    pub(crate) fn new() -> Self {
        Self {
            splits: AtomicU64::new(0),
            merges: AtomicU64::new(0),
            borrows: AtomicU64::new(0),
            height_grows: AtomicU64::new(0),
            height_shrinks: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_split(&self) {
        self.splits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_merge(&self) {
        self.merges.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_borrow(&self) {
        self.borrows.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_grow(&self) {
        self.height_grows.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_shrink(&self) {
        self.height_shrinks.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            splits: self.splits.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            borrows: self.borrows.load(Ordering::Relaxed),
            height_grows: self.height_grows.load(Ordering::Relaxed),
            height_shrinks: self.height_shrinks.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub(crate) fn reset(&self) {
        self.splits.store(0, Ordering::Relaxed);
        self.merges.store(0, Ordering::Relaxed);
        self.borrows.store(0, Ordering::Relaxed);
        self.height_grows.store(0, Ordering::Relaxed);
        self.height_shrinks.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of a tree's structural counters.
///
/// Unlike the live counters, this is not atomic and can be safely
/// printed, compared, etc.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub splits: u64,
    pub merges: u64,
    pub borrows: u64,
    pub height_grows: u64,
    pub height_shrinks: u64,
}

impl StatsSnapshot {
    /// Net change in height since the counters were last reset.
    pub fn net_height(&self) -> i64 {
        self.height_grows as i64 - self.height_shrinks as i64
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ splits: {}, merges: {}, borrows: {}, grows: {}, shrinks: {} }}",
            self.splits, self.merges, self.borrows, self.height_grows, self.height_shrinks
        )
    }
}
