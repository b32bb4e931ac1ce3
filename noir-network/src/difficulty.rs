//! Per-network block difficulty predicates
//!
//! The wallet core never calls these. They are selected per network and handed to
//! the header sync layer through [`ChainParams`](crate::ChainParams).

use crate::checkpoints::BlockHash;

/// Compact target of the easiest block the production chain accepts.
pub const MAINNET_POW_LIMIT: u32 = 0x1e0f_fff0;

/// The header fields a difficulty check needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockSummary {
    pub hash: BlockHash,
    pub prev_block: BlockHash,
    pub height: u32,
    pub timestamp: u32,
    /// Compact difficulty target ("bits")
    pub target: u32,
}

/// `verify_difficulty(block, previous, transition_time)`
pub type DifficultyVerifier = fn(&BlockSummary, Option<&BlockSummary>, u32) -> bool;

/// Expand a compact target into a 256-bit big-endian integer.
///
/// Returns `None` for negative or overflowing encodings.
pub fn compact_to_target(bits: u32) -> Option<[u8; 32]> {
    let exponent = (bits >> 24) as usize;
    let mut mantissa = bits & 0x007f_ffff;
    if bits & 0x0080_0000 != 0 && mantissa != 0 {
        return None;
    }

    let mut target = [0u8; 32];
    if exponent <= 3 {
        mantissa >>= 8 * (3 - exponent);
        target[29..].copy_from_slice(&mantissa.to_be_bytes()[1..]);
        return Some(target);
    }

    for (i, byte) in mantissa.to_be_bytes()[1..].iter().enumerate() {
        let pos = 32 + i as isize - exponent as isize;
        if pos < 0 {
            if *byte != 0 {
                return None;
            }
            continue;
        }
        target[pos as usize] = *byte;
    }
    Some(target)
}

fn links_to(block: &BlockSummary, previous: Option<&BlockSummary>) -> bool {
    match previous {
        Some(previous) => {
            block.prev_block == previous.hash && block.height == previous.height + 1
        }
        None => false,
    }
}

/// Test chain: only the header linkage is checked.
pub fn testnet_verify_difficulty(
    block: &BlockSummary,
    previous: Option<&BlockSummary>,
    _transition_time: u32,
) -> bool {
    links_to(block, previous)
}

/// Production chain: linkage plus a target no easier than the proof-of-work limit.
pub fn mainnet_verify_difficulty(
    block: &BlockSummary,
    previous: Option<&BlockSummary>,
    _transition_time: u32,
) -> bool {
    if !links_to(block, previous) {
        return false;
    }
    match (compact_to_target(block.target), compact_to_target(MAINNET_POW_LIMIT)) {
        (Some(target), Some(limit)) => target != [0u8; 32] && target <= limit,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(height: u32, hash: u8, prev: u8, target: u32) -> BlockSummary {
        BlockSummary {
            hash: BlockHash([hash; 32]),
            prev_block: BlockHash([prev; 32]),
            height,
            timestamp: 1_600_000_000 + height,
            target,
        }
    }

    #[test]
    fn test_compact_to_target() {
        let target = compact_to_target(0x1d00ffff).unwrap();
        assert_eq!(&target[..4], &[0, 0, 0, 0]);
        assert_eq!(&target[4..6], &[0xff, 0xff]);
        assert!(target[6..].iter().all(|b| *b == 0));

        let small = compact_to_target(0x03123456).unwrap();
        assert_eq!(&small[29..], &[0x12, 0x34, 0x56]);

        let shifted = compact_to_target(0x02123456).unwrap();
        assert_eq!(&shifted[30..], &[0x12, 0x34]);

        assert!(compact_to_target(0x04923456).is_none());
        assert!(compact_to_target(0xff123456).is_none());
    }

    #[test]
    fn test_testnet_linkage() {
        let prev = block(10, 1, 0, 0x1e0ffff0);
        assert!(testnet_verify_difficulty(&block(11, 2, 1, 0x207fffff), Some(&prev), 0));
        assert!(!testnet_verify_difficulty(&block(12, 2, 1, 0x1e0ffff0), Some(&prev), 0));
        assert!(!testnet_verify_difficulty(&block(11, 2, 9, 0x1e0ffff0), Some(&prev), 0));
        assert!(!testnet_verify_difficulty(&block(11, 2, 1, 0x1e0ffff0), None, 0));
    }

    #[test]
    fn test_mainnet_pow_limit() {
        let prev = block(10, 1, 0, MAINNET_POW_LIMIT);
        assert!(mainnet_verify_difficulty(&block(11, 2, 1, MAINNET_POW_LIMIT), Some(&prev), 0));
        assert!(mainnet_verify_difficulty(&block(11, 2, 1, 0x1c01f271), Some(&prev), 0));
        assert!(!mainnet_verify_difficulty(&block(11, 2, 1, 0x207fffff), Some(&prev), 0));
        assert!(!mainnet_verify_difficulty(&block(11, 2, 1, 0), Some(&prev), 0));
    }
}
