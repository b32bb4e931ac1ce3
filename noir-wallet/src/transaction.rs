//! In-memory transaction model
//!
//! Parsing raw wire data is left to the sync layer. What lives here is the consensus
//! *encoding* the engine itself depends on: transaction ids, serialized size for
//! fee estimation and signature hashing.

use bitcoin_hashes::{sha256d, Hash};
use rand::seq::SliceRandom;

use crate::fee::TX_INPUT_SIZE;
use crate::hash_types::Txid;
use crate::script::Script;

/// Final sequence number; disables lock time for the input
pub const TXIN_SEQUENCE: u32 = u32::MAX;

/// Lock time values below this are block heights, above are unix timestamps
pub const TX_MAX_LOCK_HEIGHT: u32 = 500_000_000;

/// Signature hash type committing to all inputs and outputs
pub const SIGHASH_ALL: u32 = 0x01;

/// Reference to an output of a previous transaction
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutPoint {
    pub txid: Txid,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Txid, vout: u32) -> Self {
        Self {
            txid,
            vout,
        }
    }
}

impl std::hash::Hash for OutPoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // FNV-style mix of the leading txid word and the index
        state.write_u32((self.txid.first_word() ^ self.vout).wrapping_mul(0x0100_0193));
    }
}

/// Transaction input.
///
/// `spent_script` and `spent_value` describe the output being spent when the
/// caller knows it. They are not part of the serialized form.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
    pub spent_script: Option<Script>,
    pub spent_value: Option<u64>,
}

impl TxIn {
    /// Unsigned input with a final sequence number
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            script_sig: Script::new(),
            sequence: TXIN_SEQUENCE,
            spent_script: None,
            spent_value: None,
        }
    }

    /// Attach the script and value of the output being spent
    pub fn spending(mut self, script: Script, value: u64) -> Self {
        self.spent_script = Some(script);
        self.spent_value = Some(value);
        self
    }

    pub fn is_signed(&self) -> bool {
        !self.script_sig.is_empty()
    }
}

/// Transaction output
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(value: u64, script_pubkey: Script) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }
}

/// A transaction body
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
    pub version: i32,
    pub input: Vec<TxIn>,
    pub output: Vec<TxOut>,
    pub lock_time: u32,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            version: 1,
            input: Vec::new(),
            output: Vec::new(),
            lock_time: 0,
        }
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consensus serialization
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut buf, self.input.len() as u64);
        for input in &self.input {
            write_outpoint(&mut buf, &input.previous_output);
            write_script(&mut buf, &input.script_sig);
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_outputs(&mut buf, &self.output);
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf
    }

    pub fn txid(&self) -> Txid {
        Txid::hash(&self.serialize())
    }

    /// Serialized size, counting each unsigned input at the typical signed size
    pub fn size(&self) -> usize {
        let inputs: usize = self
            .input
            .iter()
            .map(|input| {
                if input.is_signed() {
                    32 + 4 + varint_size(input.script_sig.len() as u64) + input.script_sig.len() + 4
                } else {
                    TX_INPUT_SIZE
                }
            })
            .sum();
        let outputs: usize = self
            .output
            .iter()
            .map(|output| {
                8 + varint_size(output.script_pubkey.len() as u64) + output.script_pubkey.len()
            })
            .sum();
        8 + varint_size(self.input.len() as u64)
            + varint_size(self.output.len() as u64)
            + inputs
            + outputs
    }

    /// True when every input carries a script-sig
    pub fn is_signed(&self) -> bool {
        self.input.iter().all(TxIn::is_signed)
    }

    /// Randomize output order so change is not identifiable by position
    pub fn shuffle_outputs(&mut self) {
        self.output.shuffle(&mut rand::thread_rng());
    }

    /// Sum of output values, saturating at `u64::MAX`
    pub fn output_total(&self) -> u64 {
        self.output.iter().fold(0u64, |total, o| total.saturating_add(o.value))
    }

    /// Sum of output values, or `None` if it does not fit in a `u64`
    pub fn checked_output_total(&self) -> Option<u64> {
        self.output.iter().try_fold(0u64, |total, o| total.checked_add(o.value))
    }

    /// Legacy signature hash of input `index`, with `script_code` in place of its script-sig
    pub fn legacy_sighash(&self, index: usize, script_code: &Script, hash_type: u32) -> [u8; 32] {
        let mut buf = Vec::with_capacity(self.size() + 4);
        buf.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut buf, self.input.len() as u64);
        for (i, input) in self.input.iter().enumerate() {
            write_outpoint(&mut buf, &input.previous_output);
            if i == index {
                write_script(&mut buf, script_code);
            } else {
                write_varint(&mut buf, 0);
            }
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_outputs(&mut buf, &self.output);
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf.extend_from_slice(&hash_type.to_le_bytes());
        sha256d::Hash::hash(&buf).to_byte_array()
    }

    /// Fork-id signature hash (BIP143 layout) of input `index` spending `value`
    pub fn fork_id_sighash(
        &self,
        index: usize,
        script_code: &Script,
        value: u64,
        hash_type: u32,
    ) -> Option<[u8; 32]> {
        let input = self.input.get(index)?;

        let mut prevouts = Vec::with_capacity(36 * self.input.len());
        let mut sequences = Vec::with_capacity(4 * self.input.len());
        for txin in &self.input {
            write_outpoint(&mut prevouts, &txin.previous_output);
            sequences.extend_from_slice(&txin.sequence.to_le_bytes());
        }
        let mut outputs = Vec::new();
        for output in &self.output {
            outputs.extend_from_slice(&output.value.to_le_bytes());
            write_script(&mut outputs, &output.script_pubkey);
        }

        let mut buf = Vec::with_capacity(160 + script_code.len());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(sha256d::Hash::hash(&prevouts).as_byte_array());
        buf.extend_from_slice(sha256d::Hash::hash(&sequences).as_byte_array());
        write_outpoint(&mut buf, &input.previous_output);
        write_script(&mut buf, script_code);
        buf.extend_from_slice(&value.to_le_bytes());
        buf.extend_from_slice(&input.sequence.to_le_bytes());
        buf.extend_from_slice(sha256d::Hash::hash(&outputs).as_byte_array());
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf.extend_from_slice(&hash_type.to_le_bytes());
        Some(sha256d::Hash::hash(&buf).to_byte_array())
    }
}

/// Encoded length of a compact size integer
pub fn varint_size(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffff_ffff => 5,
        _ => 9,
    }
}

fn write_varint(buf: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
}

fn write_outpoint(buf: &mut Vec<u8>, outpoint: &OutPoint) {
    buf.extend_from_slice(outpoint.txid.as_bytes());
    buf.extend_from_slice(&outpoint.vout.to_le_bytes());
}

fn write_script(buf: &mut Vec<u8>, script: &Script) {
    write_varint(buf, script.len() as u64);
    buf.extend_from_slice(script.as_bytes());
}

fn write_outputs(buf: &mut Vec<u8>, outputs: &[TxOut]) {
    write_varint(buf, outputs.len() as u64);
    for output in outputs {
        buf.extend_from_slice(&output.value.to_le_bytes());
        write_script(buf, &output.script_pubkey);
    }
}
