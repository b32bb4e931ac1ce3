//! Balance engine
//!
//! Everything in here is derived. [`LedgerState::rebuild`] walks the registry in
//! canonical order and produces the UTXO ledger, the spent-output set, per
//! transaction classification and the running totals in one pass, so the balance
//! can never drift from the transactions it is computed from.

use std::collections::{HashMap, HashSet};
use std::fmt;

use noir_network::Network;
use tracing::{trace, warn};

use crate::address::Address;
use crate::classification::{direct_pending_reason, PendingReason};
use crate::fee::FEE_UNKNOWN;
use crate::hash_types::Txid;
use crate::registry::TransactionRegistry;
use crate::transaction::{OutPoint, Transaction, TxIn};
use crate::utxo::{Utxo, UtxoLedger};

/// Wallet balance breakdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WalletBalance {
    /// Outputs of confirmed transactions
    pub confirmed: u64,
    /// Outputs of unconfirmed, non-pending transactions
    pub unconfirmed: u64,
    /// Outputs of pending transactions
    pub pending: u64,
}

impl WalletBalance {
    /// Get the total balance.
    pub fn total(&self) -> u64 {
        self.confirmed + self.unconfirmed + self.pending
    }
}

impl fmt::Display for WalletBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Confirmed: {}, Unconfirmed: {}, Pending: {}, Total: {}",
            self.confirmed,
            self.unconfirmed,
            self.pending,
            self.total()
        )
    }
}

/// How the balance engine sees the wallet
pub(crate) struct LedgerContext<'a> {
    pub network: Network,
    pub is_wallet_address: &'a dyn Fn(&Address) -> bool,
    pub block_height: u32,
    pub now: u32,
}

impl LedgerContext<'_> {
    fn wallet_address(&self, script: &crate::script::Script) -> Option<Address> {
        Address::from_script(script, self.network).filter(|address| (self.is_wallet_address)(address))
    }
}

/// State derived from the registry
#[derive(Debug, Clone, Default)]
pub(crate) struct LedgerState {
    pub utxos: UtxoLedger,
    pub spent_outputs: HashSet<OutPoint>,
    pub invalid: HashSet<Txid>,
    pub pending: HashMap<Txid, PendingReason>,
    pub verified: HashSet<Txid>,
    pub used_addresses: HashSet<Address>,
    pub balance: u64,
    /// Wallet balance right after each registered transaction
    pub history: HashMap<Txid, u64>,
    pub total_sent: u64,
    pub total_received: u64,
}

impl LedgerState {
    pub fn rebuild(registry: &TransactionRegistry, ctx: &LedgerContext<'_>) -> Self {
        let mut state = LedgerState::default();

        for record in registry.iter() {
            let tx = &record.tx;
            let txid = record.txid;

            for output in &tx.output {
                if let Some(address) = Address::from_script(&output.script_pubkey, ctx.network) {
                    state.used_addresses.insert(address);
                }
            }
            for input in &tx.input {
                if let Some(address) = input_address(registry, input, ctx.network) {
                    state.used_addresses.insert(address);
                }
            }

            // an unconfirmed transaction conflicting with anything earlier loses
            if !record.is_confirmed()
                && tx.input.iter().any(|input| {
                    state.spent_outputs.contains(&input.previous_output)
                        || state.invalid.contains(&input.previous_output.txid)
                })
            {
                state.invalid.insert(txid);
                state.history.insert(txid, state.balance);
                continue;
            }

            state.spent_outputs.extend(tx.input.iter().map(|input| input.previous_output));

            let mut is_pending = false;
            if !record.is_confirmed() {
                let reason = direct_pending_reason(tx, ctx.block_height, ctx.now).or_else(|| {
                    tx.input
                        .iter()
                        .any(|input| state.pending.contains_key(&input.previous_output.txid))
                        .then_some(PendingReason::PendingAncestor)
                });
                if let Some(reason) = reason {
                    state.pending.insert(txid, reason);
                    is_pending = true;
                }
            }

            if record.is_confirmed()
                || (record.timestamp != 0
                    && !is_pending
                    && tx.input.iter().all(|input| {
                        !registry.contains(&input.previous_output.txid)
                            || state.verified.contains(&input.previous_output.txid)
                    }))
            {
                state.verified.insert(txid);
            }

            let previous = state.balance;
            for (vout, output) in tx.output.iter().enumerate() {
                if let Some(address) = ctx.wallet_address(&output.script_pubkey) {
                    state.utxos.add(Utxo {
                        outpoint: OutPoint::new(txid, vout as u32),
                        value: output.value,
                        address,
                        height: record.height,
                        is_pending,
                    });
                    state.balance = state.balance.checked_add(output.value).unwrap_or_else(|| {
                        warn!(txid = %txid, vout, value = output.value, "wallet balance saturated");
                        u64::MAX
                    });
                }
            }

            // registry order does not guarantee spends come after what they spend
            let spent = &state.spent_outputs;
            let removed = state.utxos.remove_where(|outpoint| spent.contains(outpoint));
            state.balance = state.balance.saturating_sub(removed);

            if state.balance > previous {
                state.total_received = state.total_received.saturating_add(state.balance - previous);
            } else {
                state.total_sent = state.total_sent.saturating_add(previous - state.balance);
            }
            state.history.insert(txid, state.balance);
        }

        trace!(
            transactions = registry.len(),
            utxos = state.utxos.len(),
            balance = state.balance,
            invalid = state.invalid.len(),
            pending = state.pending.len(),
            "rebuilt ledger state"
        );
        state
    }

    pub fn breakdown(&self) -> WalletBalance {
        let mut balance = WalletBalance::default();
        for utxo in self.utxos.list() {
            match utxo.selection_rank() {
                0 => balance.confirmed = balance.confirmed.saturating_add(utxo.value),
                1 => balance.unconfirmed = balance.unconfirmed.saturating_add(utxo.value),
                _ => balance.pending = balance.pending.saturating_add(utxo.value),
            }
        }
        balance
    }
}

/// Address an input spends from: the attached spent script, then the known
/// source output, then whatever the script-sig reveals.
pub(crate) fn input_address(
    registry: &TransactionRegistry,
    input: &TxIn,
    network: Network,
) -> Option<Address> {
    if let Some(script) = &input.spent_script {
        return Address::from_script(script, network);
    }
    let outpoint = &input.previous_output;
    if let Some(source) = registry.get(&outpoint.txid) {
        return source
            .tx
            .output
            .get(outpoint.vout as usize)
            .and_then(|output| Address::from_script(&output.script_pubkey, network));
    }
    Address::from_script_sig(&input.script_sig, network)
}

/// Value of the output an input spends, if known
fn spent_value(registry: &TransactionRegistry, input: &TxIn) -> Option<u64> {
    let outpoint = &input.previous_output;
    match registry.get(&outpoint.txid) {
        Some(source) => source.tx.output.get(outpoint.vout as usize).map(|output| output.value),
        None => input.spent_value,
    }
}

/// Sum of outputs paying wallet addresses
pub(crate) fn amount_received(tx: &Transaction, ctx: &LedgerContext<'_>) -> u64 {
    tx.output
        .iter()
        .filter(|output| ctx.wallet_address(&output.script_pubkey).is_some())
        .fold(0u64, |total, output| total.saturating_add(output.value))
}

/// Sum of spent outputs that belonged to the wallet
pub(crate) fn amount_sent(
    registry: &TransactionRegistry,
    tx: &Transaction,
    ctx: &LedgerContext<'_>,
) -> u64 {
    tx.input
        .iter()
        .filter_map(|input| {
            let outpoint = &input.previous_output;
            if let Some(source) = registry.get(&outpoint.txid) {
                let output = source.tx.output.get(outpoint.vout as usize)?;
                return ctx.wallet_address(&output.script_pubkey).map(|_| output.value);
            }
            match (&input.spent_script, input.spent_value) {
                (Some(script), Some(value)) => ctx.wallet_address(script).map(|_| value),
                _ => None,
            }
        })
        .fold(0u64, u64::saturating_add)
}

/// Inputs minus outputs, or [`FEE_UNKNOWN`] when an input's value is not known
pub(crate) fn fee_for_tx(registry: &TransactionRegistry, tx: &Transaction) -> u64 {
    let mut inputs = 0u64;
    for input in &tx.input {
        match spent_value(registry, input) {
            Some(value) => inputs = inputs.saturating_add(value),
            None => return FEE_UNKNOWN,
        }
    }
    inputs.saturating_sub(tx.output_total())
}
