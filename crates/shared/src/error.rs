//! Error types shared across SwiftBot crates

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SharedError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connections must be between {min} and {max}, got {got}")]
    ConnectionsOutOfRange { min: u8, max: u8, got: i64 },

    #[error("Invalid billing period: {0}")]
    InvalidBillingPeriod(String),
}
