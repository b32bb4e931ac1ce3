//! Thread-safe wallet handle
//!
//! Queries take a shared lock and may run concurrently; mutations take the
//! exclusive lock, so readers only ever see a wallet between mutations.
//! Listener callbacks run while the exclusive lock is held and must not call
//! back into the handle.

use std::sync::{Arc, RwLock};

use crate::error::{Result, WalletError};
use crate::wallet::Wallet;

/// Cloneable, thread-safe handle to a [`Wallet`]
#[derive(Debug, Clone)]
pub struct SharedWallet {
    inner: Arc<RwLock<Wallet>>,
}

impl SharedWallet {
    pub fn new(wallet: Wallet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(wallet)),
        }
    }

    /// Run a query under the shared lock
    pub fn read<R>(&self, f: impl FnOnce(&Wallet) -> R) -> Result<R> {
        let guard = self.inner.read().map_err(|_| WalletError::LockPoisoned)?;
        Ok(f(&guard))
    }

    /// Run a mutation under the exclusive lock
    pub fn write<R>(&self, f: impl FnOnce(&mut Wallet) -> R) -> Result<R> {
        let mut guard = self.inner.write().map_err(|_| WalletError::LockPoisoned)?;
        Ok(f(&mut guard))
    }

    pub fn balance(&self) -> Result<u64> {
        self.read(Wallet::balance)
    }
}

impl From<Wallet> for SharedWallet {
    fn from(wallet: Wallet) -> Self {
        Self::new(wallet)
    }
}
