//! Static chain parameters

use crate::checkpoints::{Checkpoint, MAINNET_CHECKPOINTS, TESTNET_CHECKPOINTS};
use crate::difficulty::{mainnet_verify_difficulty, testnet_verify_difficulty, DifficultyVerifier};

/// Everything the sync layer needs to join and validate a chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainParams {
    /// DNS seeds used for peer discovery
    pub dns_seeds: &'static [&'static str],
    /// Default peer-to-peer port
    pub standard_port: u16,
    /// Message header magic
    pub magic_number: u32,
    /// Service bits we advertise
    pub services: u64,
    /// Difficulty predicate for new headers
    pub verify_difficulty: DifficultyVerifier,
    /// Checkpoints, ordered by height
    pub checkpoints: &'static [Checkpoint],
}

impl ChainParams {
    /// Height of the newest checkpoint
    pub fn last_checkpoint_height(&self) -> u32 {
        self.checkpoints.last().map(|c| c.height).unwrap_or(0)
    }
}

pub(crate) static MAINNET_PARAMS: ChainParams = ChainParams {
    dns_seeds: &["flo071.com"],
    standard_port: 6022,
    magic_number: 0x72696f4e,
    services: 0,
    verify_difficulty: mainnet_verify_difficulty,
    checkpoints: &MAINNET_CHECKPOINTS,
};

pub(crate) static TESTNET_PARAMS: ChainParams = ChainParams {
    dns_seeds: &[],
    standard_port: 12025,
    magic_number: 0xdab6c3fa,
    services: 0,
    verify_difficulty: testnet_verify_difficulty,
    checkpoints: &TESTNET_CHECKPOINTS,
};
