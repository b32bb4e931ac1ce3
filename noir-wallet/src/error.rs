//! Error types for the wallet engine

use thiserror::Error;

use crate::hash_types::Txid;

/// Result type alias for wallet operations
pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors that can occur in wallet operations.
///
/// Caller mistakes and unfundable requests land here. Conditions that are expected
/// while the chain is still syncing (an input whose source transaction is not known
/// yet) are reported through sentinel values such as [`FEE_UNKNOWN`](crate::fee::FEE_UNKNOWN)
/// instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        available: u64,
        required: u64,
    },

    #[error("Transaction too large: {0} bytes")]
    TransactionTooLarge(usize),

    #[error("No output above the dust threshold")]
    DustOutputs,

    #[error("No unused change address available")]
    NoChangeAddress,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Signing failed for input {input}: {reason}")]
    SigningFailed {
        input: usize,
        reason: String,
    },

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(Txid),

    #[error("Wallet lock poisoned")]
    LockPoisoned,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),

    #[error("Network error: {0}")]
    Network(#[from] noir_network::Error),
}

/// Logging-specific errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize subscriber: {0}")]
    SubscriberInit(String),
}

/// Type alias for logging operation results.
pub type LoggingResult<T> = std::result::Result<T, LoggingError>;
