//! Noir Wallet Library
//!
//! An SPV wallet ledger engine: deterministic receive and change address chains,
//! a registry of wallet transactions, the UTXO set and balances derived from it,
//! transaction status classification, coin selection, fee estimation and signing.
//!
//! The engine does no networking and no persistence. The sync layer feeds it
//! transactions and block metadata; the application restores it from whatever
//! it stored through [`WalletBuilder`].

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

pub mod address;
pub mod address_chain;
pub mod asset;
pub mod balance;
pub mod classification;
pub mod coin_selection;
pub mod config;
pub mod currency;
pub mod error;
pub mod fee;
pub mod hash_types;
pub mod keys;
pub mod logging;
pub mod notifications;
pub mod registry;
pub mod script;
pub mod shared;
pub mod transaction;
pub mod transaction_builder;
pub mod transaction_record;
pub mod utxo;
pub mod wallet;

pub use noir_network::{self, Network};

pub use address::{Address, AddressType};
pub use address_chain::AddressChain;
pub use asset::{AssetData, AssetOperation};
pub use balance::WalletBalance;
pub use classification::{PendingReason, TxStatus};
pub use config::WalletConfig;
pub use error::{LoggingError, LoggingResult, Result, WalletError};
pub use fee::FeeRate;
pub use hash_types::Txid;
pub use keys::{Bip32Signer, ChainKind, MasterPubKey, PublicKeySource, SigningKeySource};
pub use logging::{init_console_logging, init_logging, LoggingConfig};
pub use notifications::{WalletEvent, WalletListener};
pub use shared::SharedWallet;
pub use transaction::{OutPoint, Transaction, TxIn, TxOut};
pub use transaction_record::{TransactionRecord, TX_UNCONFIRMED};
pub use utxo::{Utxo, UtxoLedger};
pub use wallet::{Wallet, WalletBuilder};
