//! Transaction records owned by the registry

use crate::hash_types::Txid;
use crate::transaction::Transaction;

/// Block height of a transaction that is not in a block
pub const TX_UNCONFIRMED: u32 = i32::MAX as u32;

/// A transaction plus its wallet-local confirmation metadata
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransactionRecord {
    /// The transaction body
    pub tx: Transaction,
    /// Cached id of `tx`
    pub txid: Txid,
    /// Containing block height, or [`TX_UNCONFIRMED`]
    pub height: u32,
    /// Block or first-seen time; 0 marks the transaction unverified
    pub timestamp: u32,
}

impl TransactionRecord {
    /// Unconfirmed, unverified record
    pub fn new(tx: Transaction) -> Self {
        let txid = tx.txid();
        Self {
            tx,
            txid,
            height: TX_UNCONFIRMED,
            timestamp: 0,
        }
    }

    /// Record confirmed in a block
    pub fn confirmed(tx: Transaction, height: u32, timestamp: u32) -> Self {
        Self::new(tx).with_block(height, timestamp)
    }

    pub fn with_block(mut self, height: u32, timestamp: u32) -> Self {
        self.height = height;
        self.timestamp = timestamp;
        self
    }

    pub fn is_confirmed(&self) -> bool {
        self.height != TX_UNCONFIRMED
    }

    /// Confirmations at `tip_height`, 0 when unconfirmed
    pub fn confirmations(&self, tip_height: u32) -> u32 {
        if !self.is_confirmed() || tip_height < self.height {
            0
        } else {
            tip_height - self.height + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;
    use crate::transaction::TxOut;

    #[test]
    fn test_record_confirmation() {
        let mut tx = Transaction::new();
        tx.output.push(TxOut::new(1000, Script::new_p2pkh(&[1; 20])));
        let record = TransactionRecord::new(tx.clone());
        assert!(!record.is_confirmed());
        assert_eq!(record.txid, tx.txid());
        assert_eq!(record.confirmations(100), 0);

        let record = TransactionRecord::confirmed(tx, 100, 1_600_000_000);
        assert!(record.is_confirmed());
        assert_eq!(record.confirmations(100), 1);
        assert_eq!(record.confirmations(105), 6);
        assert_eq!(record.confirmations(50), 0);
    }
}
