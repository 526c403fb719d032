//! Structural invariant checker.
//!
//! Walks any [`NodeView`] tree and reports the first broken invariant. The
//! trees call this from their `validate()` methods; tests call it after every
//! mutation.

use std::fmt::Debug;

use thiserror::Error;

use crate::common::{NodeId, Order};
use crate::index::view::NodeView;

/// A structural invariant that does not hold.
///
/// Seeing one of these means the tree code has a bug; none of them can be
/// caused by caller input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("node at depth {depth} holds {count} keys, allowed {min}..={max}")]
    Occupancy {
        depth: usize,
        count: usize,
        min: usize,
        max: usize,
    },

    #[error("internal node at depth {depth} has {children} children for {keys} keys")]
    ChildCount {
        depth: usize,
        keys: usize,
        children: usize,
    },

    #[error("keys not strictly ascending at depth {depth}: {keys}")]
    Unordered { depth: usize, keys: String },

    #[error("key {key} at depth {depth} lies outside its separator bounds")]
    OutOfBounds { depth: usize, key: String },

    #[error("leaves found at depths {first} and {other}")]
    UnevenDepth { first: usize, other: usize },

    #[error("leaf chain diverges from tree order: {0}")]
    LeafChain(String),

    #[error("parent link of {child} is {found:?}, expected {expected:?}")]
    ParentLink {
        child: NodeId,
        expected: Option<NodeId>,
        found: Option<NodeId>,
    },

    #[error("tree reports {reported} keys but holds {actual}")]
    Length { reported: usize, actual: usize },
}

/// How separator keys bound the keys of the children on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorRule {
    /// Classic B-tree: `child[i] < keys[i] < child[i + 1]`.
    Strict,
    /// B+-tree: `child[i] < keys[i] <= child[i + 1]`; the separator is a copy
    /// of (or stands in for) the first key of the right subtree.
    Copied,
}

/// Check occupancy, ordering, separator bounds and uniform leaf depth.
///
/// Returns the number of authoritative keys: every key for
/// [`SeparatorRule::Strict`], leaf keys only for [`SeparatorRule::Copied`].
pub fn check_structure<'a, K, N>(
    root: N,
    order: Order,
    rule: SeparatorRule,
) -> Result<usize, InvariantViolation>
where
    K: Ord + Debug + 'a,
    N: NodeView<'a, K>,
{
    let mut checker = Checker {
        order,
        rule,
        leaf_depth: None,
        count: 0,
    };
    checker.visit(root, 0, None, None)?;
    Ok(checker.count)
}

struct Checker {
    order: Order,
    rule: SeparatorRule,
    leaf_depth: Option<usize>,
    count: usize,
}

impl Checker {
    fn visit<'a, K, N>(
        &mut self,
        node: N,
        depth: usize,
        lower: Option<&'a K>,
        upper: Option<&'a K>,
    ) -> Result<(), InvariantViolation>
    where
        K: Ord + Debug + 'a,
        N: NodeView<'a, K>,
    {
        let keys = node.keys();

        // The root may run below minimum; an internal root still needs a key.
        let min = match (depth, node.is_leaf()) {
            (0, true) => 0,
            (0, false) => 1,
            _ => self.order.min_keys(),
        };
        let max = self.order.max_keys();
        if keys.len() < min || keys.len() > max {
            return Err(InvariantViolation::Occupancy {
                depth,
                count: keys.len(),
                min,
                max,
            });
        }

        if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(InvariantViolation::Unordered {
                depth,
                keys: format!("{:?}", keys),
            });
        }

        for key in keys {
            let above_lower = match (lower, self.rule) {
                (None, _) => true,
                (Some(lo), SeparatorRule::Strict) => lo < key,
                (Some(lo), SeparatorRule::Copied) => lo <= key,
            };
            let below_upper = upper.map_or(true, |hi| key < hi);
            if !above_lower || !below_upper {
                return Err(InvariantViolation::OutOfBounds {
                    depth,
                    key: format!("{:?}", key),
                });
            }
        }

        if node.is_leaf() {
            match self.leaf_depth {
                None => self.leaf_depth = Some(depth),
                Some(first) if first != depth => {
                    return Err(InvariantViolation::UnevenDepth {
                        first,
                        other: depth,
                    })
                }
                Some(_) => {}
            }
            self.count += keys.len();
            return Ok(());
        }

        let children = node.children();
        if children.len() != keys.len() + 1 {
            return Err(InvariantViolation::ChildCount {
                depth,
                keys: keys.len(),
                children: children.len(),
            });
        }
        if self.rule == SeparatorRule::Strict {
            self.count += keys.len();
        }

        for (i, child) in children.into_iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(&keys[i - 1]) };
            let hi = if i == keys.len() { upper } else { Some(&keys[i]) };
            self.visit(child, depth + 1, lo, hi)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal owned node for exercising the checker directly.
    struct Fixture {
        keys: Vec<u32>,
        children: Vec<Fixture>,
    }

    fn leaf(keys: &[u32]) -> Fixture {
        Fixture {
            keys: keys.to_vec(),
            children: Vec::new(),
        }
    }

    fn internal(keys: &[u32], children: Vec<Fixture>) -> Fixture {
        Fixture {
            keys: keys.to_vec(),
            children,
        }
    }

    impl<'a> NodeView<'a, u32> for &'a Fixture {
        fn is_leaf(&self) -> bool {
            self.children.is_empty()
        }

        fn keys(&self) -> &'a [u32] {
            let node: &'a Fixture = *self;
            &node.keys
        }

        fn children(&self) -> Vec<Self> {
            let node: &'a Fixture = *self;
            node.children.iter().collect()
        }
    }

    fn order2() -> Order {
        Order::new(2).unwrap()
    }

    #[test]
    fn test_valid_classic_tree() {
        let root = internal(&[10], vec![leaf(&[1, 5]), leaf(&[20])]);
        assert_eq!(
            check_structure(&root, order2(), SeparatorRule::Strict),
            Ok(4)
        );
    }

    #[test]
    fn test_copied_separator_rule() {
        let root = internal(&[10], vec![leaf(&[1, 5]), leaf(&[10, 20])]);

        // Separator duplicated in the right leaf: fine for B+, not for classic
        assert_eq!(
            check_structure(&root, order2(), SeparatorRule::Copied),
            Ok(4)
        );
        assert!(matches!(
            check_structure(&root, order2(), SeparatorRule::Strict),
            Err(InvariantViolation::OutOfBounds { depth: 1, .. })
        ));
    }

    #[test]
    fn test_detects_underfull_node() {
        let root = internal(&[10], vec![leaf(&[]), leaf(&[20])]);
        assert!(matches!(
            check_structure(&root, order2(), SeparatorRule::Strict),
            Err(InvariantViolation::Occupancy { count: 0, .. })
        ));
    }

    #[test]
    fn test_detects_unordered_keys() {
        let root = leaf(&[3, 2]);
        assert!(matches!(
            check_structure(&root, order2(), SeparatorRule::Strict),
            Err(InvariantViolation::Unordered { .. })
        ));
    }

    #[test]
    fn test_detects_child_count_mismatch() {
        let root = internal(&[10, 20], vec![leaf(&[1]), leaf(&[15])]);
        assert!(matches!(
            check_structure(&root, order2(), SeparatorRule::Strict),
            Err(InvariantViolation::ChildCount { children: 2, .. })
        ));
    }

    #[test]
    fn test_detects_uneven_depth() {
        let root = internal(
            &[10],
            vec![leaf(&[1]), internal(&[30], vec![leaf(&[20]), leaf(&[40])])],
        );
        assert!(matches!(
            check_structure(&root, order2(), SeparatorRule::Strict),
            Err(InvariantViolation::UnevenDepth { first: 1, other: 2 })
        ));
    }

    #[test]
    fn test_empty_leaf_root_is_valid() {
        let root = leaf(&[]);
        assert_eq!(
            check_structure(&root, order2(), SeparatorRule::Copied),
            Ok(0)
        );
    }
}
