//! Error types for stripcrate

use crate::polygon::PoolId;
use thiserror::Error;

/// Main error type for stripcrate operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown vertex pool: {0}")]
    UnknownPool(PoolId),
}

/// Result type alias for stripcrate operations
pub type Result<T> = std::result::Result<T, Error>;
