//! Minimum degree of a tree.

use std::fmt;

use crate::common::config::{DEFAULT_ORDER, MIN_ORDER};
use crate::common::{Error, Result};

/// The minimum degree `t` of a tree, validated at construction.
///
/// Every node holds at most `2t - 1` keys; every node except the root holds
/// at least `t - 1`. Internal nodes have one more child than keys.
///
/// # Example
/// ```
/// use interchangetree::Order;
///
/// let order = Order::new(3).unwrap();
/// assert_eq!(order.min_keys(), 2);
/// assert_eq!(order.max_keys(), 5);
/// assert!(Order::new(1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Order(usize);

impl Order {
    /// The order used by `Default` constructors.
    pub const DEFAULT: Order = Order(DEFAULT_ORDER);

    /// Validate `t` and wrap it.
    ///
    /// # Errors
    /// `Error::InvalidConfiguration` if `t < MIN_ORDER`.
    pub fn new(t: usize) -> Result<Self> {
        if t < MIN_ORDER {
            return Err(Error::invalid_order(t));
        }
        Ok(Order(t))
    }

    /// The raw minimum degree `t`.
    #[inline]
    pub fn min_degree(&self) -> usize {
        self.0
    }

    /// Fewest keys a non-root node may hold (`t - 1`).
    #[inline]
    pub fn min_keys(&self) -> usize {
        self.0 - 1
    }

    /// Most keys any node may hold (`2t - 1`).
    #[inline]
    pub fn max_keys(&self) -> usize {
        2 * self.0 - 1
    }

    /// Most children an internal node may have (`2t`).
    #[inline]
    pub fn max_children(&self) -> usize {
        2 * self.0
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_bounds() {
        let order = Order::new(2).unwrap();
        assert_eq!(order.min_degree(), 2);
        assert_eq!(order.min_keys(), 1);
        assert_eq!(order.max_keys(), 3);
        assert_eq!(order.max_children(), 4);
    }

    #[test]
    fn test_order_rejects_small_degree() {
        assert_eq!(
            Order::new(1),
            Err(Error::InvalidConfiguration { order: 1, min: 2 })
        );
        assert!(Order::new(0).is_err());
    }

    #[test]
    fn test_default_order() {
        assert_eq!(Order::DEFAULT, Order::new(DEFAULT_ORDER).unwrap());
    }

    #[test]
    fn test_order_display() {
        assert_eq!(format!("{}", Order::new(4).unwrap()), "t=4");
    }
}
