// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! SwiftBot Shared Types
//!
//! This crate contains the account, subscription and team types shared across
//! the SwiftBot billing library and the account API client.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
