//! Common types and utilities shared across InterchangeTree.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - The validated minimum degree ([`Order`])
//! - Arena handles ([`NodeId`])

pub mod config;
pub mod error;
mod node_id;
mod order;

pub use error::{Error, Result};
pub use node_id::NodeId;
pub use order::Order;
