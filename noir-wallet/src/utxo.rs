//! UTXO ledger
//!
//! The ledger is derived state: it is rebuilt by the balance engine from the
//! transaction registry after every mutation and never edited by callers.

use std::collections::HashMap;

use crate::address::Address;
use crate::transaction::OutPoint;
use crate::transaction_record::TX_UNCONFIRMED;

/// Unspent transaction output owned by the wallet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Utxo {
    /// The outpoint (txid + vout)
    pub outpoint: OutPoint,
    /// Output value
    pub value: u64,
    /// The wallet address this output pays
    pub address: Address,
    /// Height of the owning transaction, or `TX_UNCONFIRMED`
    pub height: u32,
    /// Whether the owning transaction is currently pending
    pub is_pending: bool,
}

impl Utxo {
    pub fn is_confirmed(&self) -> bool {
        self.height != TX_UNCONFIRMED
    }

    /// Selection tier: confirmed first, then unconfirmed, then pending
    pub(crate) fn selection_rank(&self) -> u8 {
        if self.is_confirmed() {
            0
        } else if !self.is_pending {
            1
        } else {
            2
        }
    }
}

/// Wallet-owned unspent outputs in the order they were created
#[derive(Debug, Clone, Default)]
pub struct UtxoLedger {
    utxos: Vec<Utxo>,
    index: HashMap<OutPoint, usize>,
}

impl UtxoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, utxo: Utxo) {
        if self.index.contains_key(&utxo.outpoint) {
            return;
        }
        self.index.insert(utxo.outpoint, self.utxos.len());
        self.utxos.push(utxo);
    }

    /// Drop every output matching `spent`, returning the total value removed
    pub(crate) fn remove_where(&mut self, spent: impl Fn(&OutPoint) -> bool) -> u64 {
        let mut removed = 0u64;
        self.utxos.retain(|utxo| {
            if spent(&utxo.outpoint) {
                removed = removed.saturating_add(utxo.value);
                false
            } else {
                true
            }
        });
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, utxo) in self.utxos.iter().enumerate() {
            self.index.insert(utxo.outpoint, i);
        }
    }

    /// All outputs, oldest first
    pub fn list(&self) -> &[Utxo] {
        &self.utxos
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&Utxo> {
        self.index.get(outpoint).map(|&i| &self.utxos[i])
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.index.contains_key(outpoint)
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Sum of all output values
    pub fn total_value(&self) -> u64 {
        self.utxos.iter().fold(0u64, |total, u| total.saturating_add(u.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_types::Txid;
    use bitcoin_hashes::{hash160, Hash};
    use noir_network::Network;

    fn utxo(seed: u8, vout: u32, value: u64, height: u32) -> Utxo {
        Utxo {
            outpoint: OutPoint::new(Txid([seed; 32]), vout),
            value,
            address: Address::p2sh(hash160::Hash::hash(&[seed]), Network::Testnet),
            height,
            is_pending: false,
        }
    }

    #[test]
    fn test_add_and_lookup() {
        let mut ledger = UtxoLedger::new();
        ledger.add(utxo(1, 0, 1000, 10));
        ledger.add(utxo(1, 1, 2000, 10));
        ledger.add(utxo(1, 1, 2000, 10));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.total_value(), 3000);
        assert_eq!(ledger.get(&OutPoint::new(Txid([1; 32]), 1)).map(|u| u.value), Some(2000));
        assert!(!ledger.contains(&OutPoint::new(Txid([2; 32]), 0)));
    }

    #[test]
    fn test_remove_keeps_order_and_index() {
        let mut ledger = UtxoLedger::new();
        for i in 0..5 {
            ledger.add(utxo(i, 0, 100 * (i as u64 + 1), 10));
        }
        let removed = ledger.remove_where(|op| op.txid == Txid([1; 32]) || op.txid == Txid([3; 32]));
        assert_eq!(removed, 200 + 400);
        let seeds: Vec<u8> = ledger.list().iter().map(|u| u.outpoint.txid.0[0]).collect();
        assert_eq!(seeds, vec![0, 2, 4]);
        assert_eq!(ledger.get(&OutPoint::new(Txid([4; 32]), 0)).map(|u| u.value), Some(500));
    }

    #[test]
    fn test_selection_rank() {
        let confirmed = utxo(1, 0, 1, 10);
        let mut unconfirmed = utxo(2, 0, 1, TX_UNCONFIRMED);
        assert_eq!(confirmed.selection_rank(), 0);
        assert_eq!(unconfirmed.selection_rank(), 1);
        unconfirmed.is_pending = true;
        assert_eq!(unconfirmed.selection_rank(), 2);
    }
}
