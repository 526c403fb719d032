//! Configuration constants for InterchangeTree.

/// Smallest legal minimum degree `t`.
///
/// With `t = 2` every node holds 1..=3 keys, which is the classic 2-3-4 tree.
/// Anything smaller cannot satisfy the "non-root nodes hold at least
/// `t - 1` keys" rule with a non-empty node.
pub const MIN_ORDER: usize = 2;

/// Minimum degree used by the `Default` constructors.
///
/// Nodes hold between 2 and 5 keys, small enough that a rendered tree still
/// fits on one screen after a few dozen inserts.
pub const DEFAULT_ORDER: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_is_legal() {
        assert!(DEFAULT_ORDER >= MIN_ORDER);
    }
}
