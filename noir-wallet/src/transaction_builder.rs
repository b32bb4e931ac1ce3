//! Transaction assembly and signing
//!
//! The builder turns a set of requested outputs into an unsigned transaction by
//! running coin selection and adding change. Signing is a separate step that
//! asks a [`SigningKeySource`] for each input's key and only commits the
//! script-sigs once every input has been signed.

use bitcoin_hashes::{hash160, Hash};
use tracing::{debug, warn};

use crate::address::Address;
use crate::coin_selection::{Candidate, CoinSelector, SelectionResult};
use crate::error::{Result, WalletError};
use crate::fee::TX_MIN_OUTPUT_AMOUNT;
use crate::keys::{ChainKind, SigningKeySource};
use crate::script::Script;
use crate::transaction::{Transaction, TxIn, TxOut, SIGHASH_ALL};

/// Builder for unsigned wallet transactions
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    /// Outputs to create
    outputs: Vec<TxOut>,
    /// Change address
    change_address: Option<Address>,
    /// Whether to randomize output order
    shuffle: bool,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuilder {
    /// Create a new transaction builder
    pub fn new() -> Self {
        Self {
            outputs: Vec::new(),
            change_address: None,
            shuffle: true,
        }
    }

    /// Add an output paying `address`
    pub fn add_output(mut self, address: &Address, amount: u64) -> Self {
        self.outputs.push(TxOut::new(amount, address.script_pubkey()));
        self
    }

    /// Add prepared outputs
    pub fn add_outputs(mut self, outputs: impl IntoIterator<Item = TxOut>) -> Self {
        self.outputs.extend(outputs);
        self
    }

    /// Set change address
    pub fn set_change_address(mut self, address: Address) -> Self {
        self.change_address = Some(address);
        self
    }

    /// Keep outputs in the order they were added
    pub fn keep_output_order(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// Select inputs from `candidates` and assemble the unsigned transaction
    pub fn build(
        self,
        selector: &CoinSelector,
        candidates: impl IntoIterator<Item = Candidate>,
    ) -> Result<(Transaction, SelectionResult)> {
        if self.outputs.is_empty() {
            return Err(WalletError::InvalidAmount("no outputs".into()));
        }
        if self.outputs.iter().all(|output| output.value < TX_MIN_OUTPUT_AMOUNT) {
            return Err(WalletError::DustOutputs);
        }

        let mut tx = Transaction {
            output: self.outputs,
            ..Transaction::new()
        };
        let selection = selector.select(&mut tx, candidates)?;

        if selection.change_amount > 0 {
            let change_address = self.change_address.ok_or(WalletError::NoChangeAddress)?;
            tx.output.push(TxOut::new(selection.change_amount, change_address.script_pubkey()));
        }
        if self.shuffle {
            tx.shuffle_outputs();
        }

        debug!(
            inputs = tx.input.len(),
            outputs = tx.output.len(),
            amount = selection.target_amount,
            fee = selection.fee,
            change = selection.change_amount,
            "built unsigned transaction"
        );
        Ok((tx, selection))
    }
}

fn signing_failed(input: usize, reason: impl Into<String>) -> WalletError {
    WalletError::SigningFailed {
        input,
        reason: reason.into(),
    }
}

/// Sign every input of `tx` as a P2PKH spend.
///
/// `key_path` maps an input to the chain and index of the key that can spend it;
/// every input must carry its `spent_script`, and with a non-zero `fork_id` also
/// its `spent_value`. Either all inputs are signed or `tx` is left untouched.
pub fn sign_transaction<S>(
    tx: &mut Transaction,
    fork_id: u32,
    seed: &[u8],
    signer: &S,
    key_path: impl Fn(&TxIn) -> Option<(ChainKind, u32)>,
) -> Result<()>
where
    S: SigningKeySource + ?Sized,
{
    let hash_type = fork_id | SIGHASH_ALL;
    let mut script_sigs = Vec::with_capacity(tx.input.len());

    for (i, input) in tx.input.iter().enumerate() {
        let (chain, index) = key_path(input).ok_or_else(|| signing_failed(i, "not a wallet input"))?;
        let script_code =
            input.spent_script.as_ref().ok_or_else(|| signing_failed(i, "spent script unknown"))?;

        let key = signer.secret_key(seed, chain, index).map_err(|e| signing_failed(i, e.to_string()))?;
        let public_key = signer.public_key_for(&key).serialize();
        if script_code.p2pkh_hash() != Some(hash160::Hash::hash(&public_key).to_byte_array()) {
            return Err(signing_failed(i, "derived key does not match spent script"));
        }

        let digest = if fork_id == 0 {
            tx.legacy_sighash(i, script_code, hash_type)
        } else {
            let value =
                input.spent_value.ok_or_else(|| signing_failed(i, "spent value unknown"))?;
            tx.fork_id_sighash(i, script_code, value, hash_type)
                .ok_or_else(|| signing_failed(i, "input out of range"))?
        };

        let mut signature = signer.sign(&key, digest);
        signature.push(hash_type as u8);
        script_sigs.push(Script::from_pushes(&[&signature[..], &public_key[..]]));
    }

    for (input, script_sig) in tx.input.iter_mut().zip(script_sigs) {
        input.script_sig = script_sig;
    }
    Ok(())
}

/// Like [`sign_transaction`], logging the failing input
pub(crate) fn sign_logged<S>(
    tx: &mut Transaction,
    fork_id: u32,
    seed: &[u8],
    signer: &S,
    key_path: impl Fn(&TxIn) -> Option<(ChainKind, u32)>,
) -> Result<()>
where
    S: SigningKeySource + ?Sized,
{
    sign_transaction(tx, fork_id, seed, signer, key_path).inspect_err(|e| {
        warn!(txid = %tx.txid(), error = %e, "transaction signing failed");
    })
}
