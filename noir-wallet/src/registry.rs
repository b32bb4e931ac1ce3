//! Transaction registry
//!
//! Owns every registered transaction record, keyed by txid, plus the wallet's
//! canonical ordering: lower block height first, a transaction after anything it
//! (transitively) spends, ties broken by change address index.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::hash_types::Txid;
use crate::keys::ChainKind;
use crate::transaction::Transaction;
use crate::transaction_record::TransactionRecord;

/// Index of the first output paying an address on the given chain
pub type ChainIndexFn<'a> = dyn Fn(&Transaction, ChainKind) -> Option<u32> + 'a;

#[derive(Debug, Clone, Default)]
pub struct TransactionRegistry {
    records: HashMap<Txid, TransactionRecord>,
    order: Vec<Txid>,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, txid: &Txid) -> bool {
        self.records.contains_key(txid)
    }

    pub fn get(&self, txid: &Txid) -> Option<&TransactionRecord> {
        self.records.get(txid)
    }

    pub(crate) fn get_mut(&mut self, txid: &Txid) -> Option<&mut TransactionRecord> {
        self.records.get_mut(txid)
    }

    /// Records in canonical order, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TransactionRecord> + '_ {
        self.order.iter().filter_map(move |txid| self.records.get(txid))
    }

    /// Position of `txid` in canonical order
    pub fn position(&self, txid: &Txid) -> Option<usize> {
        self.order.iter().position(|t| t == txid)
    }

    /// Registered transactions spent by `tx`'s inputs
    pub fn parents<'a>(&'a self, tx: &'a Transaction) -> impl Iterator<Item = &'a TransactionRecord> {
        tx.input.iter().filter_map(move |input| self.records.get(&input.previous_output.txid))
    }

    /// True if `a` belongs after `b`: higher height, or it spends `b` directly or
    /// through an ancestor at the same height.
    pub fn is_ascending(&self, a: &TransactionRecord, b: &TransactionRecord) -> bool {
        if a.height != b.height {
            return a.height > b.height;
        }
        let spends = |tx: &TransactionRecord, parent: &Txid| {
            tx.tx.input.iter().any(|input| &input.previous_output.txid == parent)
        };
        if spends(a, &b.txid) {
            return true;
        }
        if spends(b, &a.txid) {
            return false;
        }

        let mut visited = HashSet::new();
        let mut stack: Vec<&TransactionRecord> = self.parents(&a.tx).collect();
        while let Some(tx) = stack.pop() {
            if !visited.insert(tx.txid) {
                continue;
            }
            if tx.height > b.height {
                return true;
            }
            if tx.height < b.height || spends(b, &tx.txid) {
                continue;
            }
            if spends(tx, &b.txid) {
                return true;
            }
            stack.extend(self.parents(&tx.tx));
        }
        false
    }

    fn compare(
        &self,
        a: &TransactionRecord,
        b: &TransactionRecord,
        chain_index: &ChainIndexFn<'_>,
    ) -> Ordering {
        if self.is_ascending(a, b) {
            return Ordering::Greater;
        }
        if self.is_ascending(b, a) {
            return Ordering::Less;
        }

        let mut i = chain_index(&a.tx, ChainKind::Internal);
        let mut j = chain_index(&b.tx, ChainKind::Internal);
        if i.is_none() || j.is_none() {
            i = chain_index(&a.tx, ChainKind::External);
            j = chain_index(&b.tx, ChainKind::External);
        }
        match (i, j) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => Ordering::Equal,
        }
    }

    /// Insert a new record at its canonical position. Returns false if already present.
    pub(crate) fn insert(&mut self, record: TransactionRecord, chain_index: &ChainIndexFn<'_>) -> bool {
        if self.records.contains_key(&record.txid) {
            return false;
        }
        let mut i = self.order.len();
        while i > 0 {
            let Some(previous) = self.records.get(&self.order[i - 1]) else {
                break;
            };
            if self.compare(previous, &record, chain_index) != Ordering::Greater {
                break;
            }
            i -= 1;
        }
        self.order.insert(i, record.txid);
        self.records.insert(record.txid, record);
        true
    }

    pub(crate) fn remove(&mut self, txid: &Txid) -> Option<TransactionRecord> {
        let record = self.records.remove(txid)?;
        self.order.retain(|t| t != txid);
        Some(record)
    }

    /// Re-establish canonical order after heights changed
    pub(crate) fn resort(&mut self, chain_index: &ChainIndexFn<'_>) {
        let mut order = std::mem::take(&mut self.order);
        for k in 1..order.len() {
            let mut i = k;
            while i > 0 {
                let (Some(a), Some(b)) = (self.records.get(&order[i - 1]), self.records.get(&order[i]))
                else {
                    break;
                };
                if self.compare(a, b, chain_index) != Ordering::Greater {
                    break;
                }
                order.swap(i - 1, i);
                i -= 1;
            }
        }
        self.order = order;
    }

    /// Every registered transaction that spends an output of `txid`, directly or
    /// transitively, latest in canonical order first.
    pub fn dependents(&self, txid: &Txid) -> Vec<Txid> {
        let mut spenders: HashMap<Txid, Vec<Txid>> = HashMap::new();
        for record in self.records.values() {
            for input in &record.tx.input {
                let parent = input.previous_output.txid;
                if parent != record.txid {
                    spenders.entry(parent).or_default().push(record.txid);
                }
            }
        }

        let mut found = HashSet::new();
        let mut queue = VecDeque::from([*txid]);
        while let Some(current) = queue.pop_front() {
            for child in spenders.get(&current).into_iter().flatten() {
                if child != txid && found.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }

        self.order.iter().rev().filter(|t| found.contains(*t)).copied().collect()
    }

    /// Records with height at or above `height`, unconfirmed ones included
    pub fn unconfirmed_before(&self, height: u32) -> Vec<&TransactionRecord> {
        self.iter().filter(|record| record.height >= height).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;
    use crate::transaction::{OutPoint, TxIn, TxOut};
    use crate::transaction_record::TX_UNCONFIRMED;

    fn no_index(_: &Transaction, _: ChainKind) -> Option<u32> {
        None
    }

    fn record(parents: &[Txid], tag: u8, height: u32) -> TransactionRecord {
        let mut tx = Transaction::new();
        for parent in parents {
            let mut input = TxIn::new(OutPoint::new(*parent, 0));
            input.script_sig = Script::from_bytes(vec![0x01, tag]);
            tx.input.push(input);
        }
        if parents.is_empty() {
            let mut input = TxIn::new(OutPoint::new(Txid([tag; 32]), 9));
            input.script_sig = Script::from_bytes(vec![0x01, tag]);
            tx.input.push(input);
        }
        tx.output.push(TxOut::new(1000, Script::new_p2pkh(&[tag; 20])));
        TransactionRecord::new(tx).with_block(height, 0)
    }

    #[test]
    fn test_order_by_height() {
        let mut registry = TransactionRegistry::new();
        let a = record(&[], 1, 200);
        let b = record(&[], 2, 100);
        let c = record(&[], 3, TX_UNCONFIRMED);
        registry.insert(c.clone(), &no_index);
        registry.insert(a.clone(), &no_index);
        registry.insert(b.clone(), &no_index);
        let order: Vec<Txid> = registry.iter().map(|r| r.txid).collect();
        assert_eq!(order, vec![b.txid, a.txid, c.txid]);
        assert!(!registry.insert(a, &no_index));
    }

    #[test]
    fn test_child_sorts_after_parent_at_same_height() {
        let mut registry = TransactionRegistry::new();
        let parent = record(&[], 1, TX_UNCONFIRMED);
        let child = record(&[parent.txid], 2, TX_UNCONFIRMED);
        let grandchild = record(&[child.txid], 3, TX_UNCONFIRMED);

        registry.insert(grandchild.clone(), &no_index);
        registry.insert(parent.clone(), &no_index);
        registry.insert(child.clone(), &no_index);
        let order: Vec<Txid> = registry.iter().map(|r| r.txid).collect();
        assert_eq!(order, vec![parent.txid, child.txid, grandchild.txid]);
        assert!(registry.is_ascending(&grandchild, &parent));
        assert!(!registry.is_ascending(&parent, &grandchild));
    }

    #[test]
    fn test_dependents_closure() {
        let mut registry = TransactionRegistry::new();
        let root = record(&[], 1, TX_UNCONFIRMED);
        let a = record(&[root.txid], 2, TX_UNCONFIRMED);
        let b = record(&[a.txid], 3, TX_UNCONFIRMED);
        let unrelated = record(&[], 4, TX_UNCONFIRMED);
        for r in [&root, &a, &b, &unrelated] {
            registry.insert(r.clone(), &no_index);
        }
        assert_eq!(registry.dependents(&root.txid), vec![b.txid, a.txid]);
        assert!(registry.dependents(&b.txid).is_empty());
    }

    #[test]
    fn test_resort_after_height_change() {
        let mut registry = TransactionRegistry::new();
        let a = record(&[], 1, 100);
        let b = record(&[], 2, 200);
        registry.insert(a.clone(), &no_index);
        registry.insert(b.clone(), &no_index);
        registry.get_mut(&a.txid).unwrap().height = 300;
        registry.resort(&no_index);
        assert_eq!(registry.position(&a.txid), Some(1));
        assert_eq!(registry.unconfirmed_before(250).len(), 1);
    }

    #[test]
    fn test_tie_break_by_chain_index() {
        let mut registry = TransactionRegistry::new();
        let a = record(&[], 1, 100);
        let b = record(&[], 2, 100);
        let index = |tx: &Transaction, _: ChainKind| -> Option<u32> {
            // tag byte in the output script decides the index: higher tag, lower index
            Some(10 - tx.output[0].script_pubkey.as_bytes()[3] as u32)
        };
        registry.insert(a.clone(), &index);
        registry.insert(b.clone(), &index);
        let order: Vec<Txid> = registry.iter().map(|r| r.txid).collect();
        assert_eq!(order, vec![b.txid, a.txid]);
        assert!(registry.remove(&a.txid).is_some());
        assert_eq!(registry.len(), 1);
    }
}
