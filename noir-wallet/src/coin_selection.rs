//! Coin selection for transaction building
//!
//! Inputs are taken greedily in the order the caller supplies them (the wallet
//! hands over confirmed outputs first, then unconfirmed, then pending) until
//! they cover the outputs plus a fee that is re-estimated after every input.

use tracing::debug;

use crate::error::{Result, WalletError};
use crate::fee::{FeeRate, TX_INPUT_SIZE, TX_MAX_SIZE, TX_OUTPUT_SIZE};
use crate::script::Script;
use crate::transaction::{varint_size, Transaction, TxIn};
use crate::utxo::Utxo;

/// Parents larger than this, in inputs or outputs, are not sponsored by a child
pub const CPFP_MAX_PARENT_IO: usize = 10;

/// A spendable output offered to the selector
#[derive(Debug, Clone)]
pub struct Candidate {
    pub utxo: Utxo,
    /// Script of the output, needed to sign the spending input
    pub script_pubkey: Script,
    /// Size of the unconfirmed parent whose fee this spend helps pay, 0 if none
    pub cpfp_size: usize,
}

/// Result of UTXO selection
#[derive(Debug, Clone)]
pub struct SelectionResult {
    /// Selected UTXOs
    pub selected: Vec<Utxo>,
    /// Total value of selected UTXOs
    pub total_value: u64,
    /// Target amount (excluding fees)
    pub target_amount: u64,
    /// Fee paid, including change folded into it
    pub fee: u64,
    /// Change output amount, 0 when there is none
    pub change_amount: u64,
    /// Estimated transaction size in bytes, change output included
    pub estimated_size: usize,
}

/// Greedy selector with child-pays-for-parent sizing and fee round-off
#[derive(Debug, Clone, Copy)]
pub struct CoinSelector {
    fee_rate: FeeRate,
    /// Current wallet balance, used to round off what remains after the spend
    wallet_balance: u64,
    min_output_amount: u64,
}

impl CoinSelector {
    pub fn new(fee_rate: FeeRate, wallet_balance: u64) -> Self {
        Self {
            fee_rate,
            wallet_balance,
            min_output_amount: fee_rate.min_output_amount(),
        }
    }

    /// Add inputs to `tx` until they cover its outputs and the fee.
    ///
    /// `tx` holds the requested outputs on entry. On success every selected
    /// output has been added as an unsigned input carrying its script and value;
    /// the change output is left to the caller.
    pub fn select(
        &self,
        tx: &mut Transaction,
        candidates: impl IntoIterator<Item = Candidate>,
    ) -> Result<SelectionResult> {
        let amount = tx
            .checked_output_total()
            .ok_or_else(|| WalletError::InvalidAmount("output amounts overflow".into()))?;
        let required = |fee: u64| {
            amount
                .checked_add(fee)
                .ok_or_else(|| WalletError::InvalidAmount(format!("{amount} plus fee {fee} overflows")))
        };
        let mut selected = Vec::new();
        let mut total = 0u64;
        let mut cpfp_size = 0usize;
        let mut fee = self.fee_rate.fee_for_size(tx.size() + TX_OUTPUT_SIZE);

        for candidate in candidates {
            tx.input.push(
                TxIn::new(candidate.utxo.outpoint)
                    .spending(candidate.script_pubkey, candidate.utxo.value),
            );
            let size = tx.size() + TX_OUTPUT_SIZE;
            if size > TX_MAX_SIZE {
                debug!(size, inputs = tx.input.len(), "selection exceeds maximum transaction size");
                return Err(WalletError::TransactionTooLarge(size));
            }

            total = total.saturating_add(candidate.utxo.value);
            cpfp_size += candidate.cpfp_size;
            selected.push(candidate.utxo);

            fee = self.fee_rate.fee_for_size(size + cpfp_size);
            // leave the remaining balance a multiple of 100
            let needed = required(fee)?;
            if self.wallet_balance > needed {
                fee += (self.wallet_balance - needed) % 100;
            }

            let needed = required(fee)?;
            if total == needed || total >= needed.saturating_add(self.min_output_amount) {
                break;
            }
        }

        let needed = required(fee)?;
        if total < needed {
            return Err(WalletError::InsufficientFunds {
                available: total,
                required: needed,
            });
        }

        let leftover = total - needed;
        let change_amount = if leftover > self.min_output_amount {
            leftover
        } else {
            0
        };

        Ok(SelectionResult {
            selected,
            total_value: total,
            target_amount: amount,
            fee: total - amount - change_amount,
            change_amount,
            estimated_size: tx.size() + TX_OUTPUT_SIZE,
        })
    }
}

/// Largest amount a single transaction could send from `candidates`, after the
/// fee for spending all of them into two outputs.
pub fn max_output_amount<'a>(
    fee_rate: FeeRate,
    candidates: impl IntoIterator<Item = &'a Candidate>,
) -> u64 {
    let mut amount = 0u64;
    let mut cpfp_size = 0usize;
    let mut inputs = 0usize;
    for candidate in candidates {
        amount = amount.saturating_add(candidate.utxo.value);
        cpfp_size += candidate.cpfp_size;
        inputs += 1;
    }

    let size = 8
        + varint_size(inputs as u64)
        + TX_INPUT_SIZE * inputs
        + varint_size(2)
        + TX_OUTPUT_SIZE * 2;
    amount.saturating_sub(fee_rate.fee_for_size(size + cpfp_size))
}
