//! Error types for InterchangeTree.

use thiserror::Error;

use crate::common::config::MIN_ORDER;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All recoverable errors raised by the trees.
///
/// Inserting a key that is already present is not an error: `insert`
/// returns `false` and leaves the tree untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested minimum degree is below [`MIN_ORDER`].
    ///
    /// Only the failing constructor call is affected.
    #[error("invalid order {order}: minimum degree must be at least {min}")]
    InvalidConfiguration { order: usize, min: usize },

    /// `delete` was asked to remove a key the tree does not hold.
    #[error("key not found")]
    NotFound,
}

impl Error {
    pub(crate) fn invalid_order(order: usize) -> Self {
        Error::InvalidConfiguration {
            order,
            min: MIN_ORDER,
        }
    }
}
