//! Error types for network parameter parsing.

use thiserror::Error;

/// Result type alias for network operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while interpreting network parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Invalid block hash: {0}")]
    InvalidBlockHash(String),
}
