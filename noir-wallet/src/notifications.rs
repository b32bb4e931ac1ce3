//! Wallet change notifications
//!
//! A listener is installed once, when the wallet is built, and is called
//! synchronously on the thread performing the mutation. For every mutation the
//! structural event (added, updated, deleted) fires before `balance_changed`.

use std::sync::Arc;

use crate::hash_types::Txid;
use crate::transaction_record::TransactionRecord;

/// Callbacks for wallet events
///
/// Implement this trait to be notified of wallet changes. Every method defaults
/// to doing nothing.
pub trait WalletListener: Send + Sync {
    /// Called after the balance changed, with the new balance
    fn balance_changed(&self, _balance: u64) {}

    /// Called when a transaction was registered
    fn tx_added(&self, _record: &TransactionRecord) {}

    /// Called when the block height and timestamp of transactions changed
    fn tx_updated(&self, _txids: &[Txid], _height: u32, _timestamp: u32) {}

    /// Called for each removed transaction.
    ///
    /// `notify_user` is set when the transaction sent wallet funds and was valid;
    /// `recommend_rescan` when its effects may have been reversed without the
    /// wallet seeing why.
    fn tx_deleted(&self, _txid: &Txid, _notify_user: bool, _recommend_rescan: bool) {}
}

impl<L: WalletListener + ?Sized> WalletListener for Arc<L> {
    fn balance_changed(&self, balance: u64) {
        (**self).balance_changed(balance)
    }

    fn tx_added(&self, record: &TransactionRecord) {
        (**self).tx_added(record)
    }

    fn tx_updated(&self, txids: &[Txid], height: u32, timestamp: u32) {
        (**self).tx_updated(txids, height, timestamp)
    }

    fn tx_deleted(&self, txid: &Txid, notify_user: bool, recommend_rescan: bool) {
        (**self).tx_deleted(txid, notify_user, recommend_rescan)
    }
}

/// A single wallet notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The balance changed.
    BalanceChanged {
        /// New balance
        balance: u64,
    },

    /// A transaction was registered.
    TxAdded {
        /// The new record
        record: Box<TransactionRecord>,
    },

    /// Block metadata of transactions changed.
    TxUpdated {
        txids: Vec<Txid>,
        height: u32,
        timestamp: u32,
    },

    /// A transaction was removed.
    TxDeleted {
        txid: Txid,
        notify_user: bool,
        recommend_rescan: bool,
    },
}

impl WalletEvent {
    /// Deliver the event to `listener`
    pub fn dispatch(&self, listener: &dyn WalletListener) {
        match self {
            WalletEvent::BalanceChanged {
                balance,
            } => listener.balance_changed(*balance),
            WalletEvent::TxAdded {
                record,
            } => listener.tx_added(record),
            WalletEvent::TxUpdated {
                txids,
                height,
                timestamp,
            } => listener.tx_updated(txids, *height, *timestamp),
            WalletEvent::TxDeleted {
                txid,
                notify_user,
                recommend_rescan,
            } => listener.tx_deleted(txid, *notify_user, *recommend_rescan),
        }
    }

    /// Short description for logs
    pub fn description(&self) -> String {
        match self {
            WalletEvent::BalanceChanged {
                balance,
            } => format!("BalanceChanged({})", balance),
            WalletEvent::TxAdded {
                record,
            } => format!("TxAdded({})", record.txid),
            WalletEvent::TxUpdated {
                txids,
                height,
                ..
            } => format!("TxUpdated({} txs, height {})", txids.len(), height),
            WalletEvent::TxDeleted {
                txid,
                notify_user,
                recommend_rescan,
            } => format!("TxDeleted({}, notify: {}, rescan: {})", txid, notify_user, recommend_rescan),
        }
    }
}
