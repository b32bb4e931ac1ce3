//! Fixtures shared by unit and integration tests

use std::sync::{Arc, Mutex};

use bitcoin_hashes::{hash160, Hash};
use noir_network::Network;

use crate::address::Address;
use crate::config::WalletConfig;
use crate::hash_types::Txid;
use crate::keys::{ChainKind, MasterPubKey, PublicKeySource};
use crate::notifications::{WalletEvent, WalletListener};
use crate::script::Script;
use crate::transaction::{OutPoint, Transaction, TxIn, TxOut};
use crate::transaction_record::TransactionRecord;
use crate::wallet::{Wallet, WalletBuilder};

pub const TEST_SEED: &[u8] = b"noir wallet test seed 0123456789";

pub fn test_keys() -> MasterPubKey {
    MasterPubKey::from_seed(TEST_SEED).expect("test seed derives")
}

pub fn test_config() -> WalletConfig {
    WalletConfig::new(Network::Testnet)
}

/// Address at `index` on `chain` of the test key
pub fn wallet_address(chain: ChainKind, index: u32) -> Address {
    let key = test_keys().public_key(chain, index).expect("test key derives");
    Address::p2pkh(&key, Network::Testnet)
}

/// Address no test wallet owns
pub fn foreign_address(id: u8) -> Address {
    Address::p2sh(hash160::Hash::hash(&[0xf0, id]), Network::Testnet)
}

/// Placeholder script-sig; the engine never verifies signatures
pub fn dummy_script_sig(id: u8) -> Script {
    Script::from_pushes(&[&[0x30; 71][..], &[0x02; 33][..], &[id][..]])
}

pub fn test_wallet() -> Wallet {
    WalletBuilder::new(test_config(), test_keys()).build().expect("test wallet builds")
}

pub fn test_wallet_with_listener(listener: Arc<dyn WalletListener>) -> Wallet {
    WalletBuilder::new(test_config(), test_keys())
        .with_listener(listener)
        .build()
        .expect("test wallet builds")
}

/// Signed transaction moving foreign funds into `outputs`
pub fn funding_tx(id: u8, outputs: &[(Address, u64)]) -> Transaction {
    let mut input = TxIn::new(OutPoint::new(Txid([id; 32]), 0));
    input.script_sig = dummy_script_sig(id);
    Transaction {
        input: vec![input],
        output: outputs.iter().map(|(address, value)| TxOut::new(*value, address.script_pubkey())).collect(),
        ..Transaction::new()
    }
}

/// Signed transaction spending `inputs` into `outputs`
pub fn spending_tx(inputs: &[OutPoint], outputs: &[(Address, u64)]) -> Transaction {
    Transaction {
        input: inputs
            .iter()
            .enumerate()
            .map(|(i, outpoint)| {
                let mut input = TxIn::new(*outpoint);
                input.script_sig = dummy_script_sig(i as u8);
                input
            })
            .collect(),
        output: outputs.iter().map(|(address, value)| TxOut::new(*value, address.script_pubkey())).collect(),
        ..Transaction::new()
    }
}

/// Confirmed record of a transaction paying `value` to receive address `index`
pub fn confirmed_payment(id: u8, index: u32, value: u64, height: u32) -> TransactionRecord {
    let tx = funding_tx(id, &[(wallet_address(ChainKind::External, index), value)]);
    TransactionRecord::confirmed(tx, height, 1_600_000_000 + height)
}

/// Listener recording every event in delivery order
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<WalletEvent>>,
}

impl EventRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<WalletEvent> {
        self.events.lock().expect("recorder lock").clone()
    }

    pub fn take(&self) -> Vec<WalletEvent> {
        std::mem::take(&mut *self.events.lock().expect("recorder lock"))
    }

    fn push(&self, event: WalletEvent) {
        self.events.lock().expect("recorder lock").push(event);
    }
}

impl WalletListener for EventRecorder {
    fn balance_changed(&self, balance: u64) {
        self.push(WalletEvent::BalanceChanged {
            balance,
        });
    }

    fn tx_added(&self, record: &TransactionRecord) {
        self.push(WalletEvent::TxAdded {
            record: Box::new(record.clone()),
        });
    }

    fn tx_updated(&self, txids: &[Txid], height: u32, timestamp: u32) {
        self.push(WalletEvent::TxUpdated {
            txids: txids.to_vec(),
            height,
            timestamp,
        });
    }

    fn tx_deleted(&self, txid: &Txid, notify_user: bool, recommend_rescan: bool) {
        self.push(WalletEvent::TxDeleted {
            txid: *txid,
            notify_user,
            recommend_rescan,
        });
    }
}
