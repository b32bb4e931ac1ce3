//! Transaction status classification
//!
//! Validity, pending state and zero-confirmation safety are never stored on a
//! record. The balance engine derives them from registry order on every rebuild
//! and the wallet answers status queries from that derived state.

use std::fmt;

use bitflags::bitflags;

use crate::fee::{TX_MAX_SIZE, TX_MIN_OUTPUT_AMOUNT};
use crate::transaction::{Transaction, TX_MAX_LOCK_HEIGHT, TXIN_SEQUENCE};

/// Why an unconfirmed transaction is pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PendingReason {
    /// Larger than the largest standard transaction
    Oversized,
    /// Creates an output below the dust threshold
    DustOutput,
    /// An input signals replace-by-fee
    ReplaceByFee,
    /// Lock time not yet reached
    LockTime,
    /// Spends an output of a pending transaction
    PendingAncestor,
}

impl fmt::Display for PendingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PendingReason::Oversized => "oversized",
            PendingReason::DustOutput => "dust output",
            PendingReason::ReplaceByFee => "replace-by-fee",
            PendingReason::LockTime => "lock time",
            PendingReason::PendingAncestor => "pending ancestor",
        };
        f.write_str(s)
    }
}

bitflags! {
    /// Status of a transaction relative to the current wallet state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TxStatus: u8 {
        /// Conflicts with an earlier transaction or descends from one that does
        const INVALID = 0b0000_0001;
        /// Could still be replaced or is not yet final
        const PENDING = 0b0000_0010;
        /// Safe to treat as settled without confirmations
        const VERIFIED = 0b0000_0100;
    }
}

/// Pending conditions a transaction triggers on its own, ignoring ancestors.
///
/// Replace-by-fee signalling and unsatisfied lock times are reported as separate
/// reasons even though either makes the transaction pending.
pub fn direct_pending_reason(tx: &Transaction, block_height: u32, now: u32) -> Option<PendingReason> {
    if tx.size() > TX_MAX_SIZE {
        return Some(PendingReason::Oversized);
    }

    if tx
        .output
        .iter()
        .any(|output| output.value < TX_MIN_OUTPUT_AMOUNT && !output.script_pubkey.is_op_return())
    {
        return Some(PendingReason::DustOutput);
    }

    for input in &tx.input {
        if input.sequence < TXIN_SEQUENCE - 1 {
            return Some(PendingReason::ReplaceByFee);
        }
        if input.sequence < TXIN_SEQUENCE
            && tx.lock_time < TX_MAX_LOCK_HEIGHT
            && tx.lock_time > block_height.saturating_add(1)
        {
            return Some(PendingReason::LockTime);
        }
        if input.sequence < TXIN_SEQUENCE && tx.lock_time > now {
            return Some(PendingReason::LockTime);
        }
    }

    None
}
