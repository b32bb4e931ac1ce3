//! Noir network types shared across the wallet crates
//!
//! This crate carries everything the wallet and the sync layer need to know about
//! a network without touching it: magic numbers, ports, DNS seeds, address
//! version bytes, checkpoint tables and the per-network difficulty predicate.

use std::fmt;
use std::str::FromStr;

pub mod checkpoints;
pub mod difficulty;
pub mod error;
pub mod params;

pub use checkpoints::{BlockHash, Checkpoint};
pub use difficulty::{BlockSummary, DifficultyVerifier};
pub use error::{Error, Result};
pub use params::ChainParams;

/// The cryptocurrency network to act on.
#[derive(Copy, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Network {
    /// Production chain
    Mainnet,
    /// Public test chain
    Testnet,
}

impl Network {
    /// Creates a `Network` from the magic bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use noir_network::Network;
    ///
    /// assert_eq!(Some(Network::Mainnet), Network::from_magic(0x72696f4e));
    /// assert_eq!(None, Network::from_magic(0xFFFFFFFF));
    /// ```
    pub fn from_magic(magic: u32) -> Option<Network> {
        // Note: any new entries here must be added to `magic` below
        match magic {
            0x72696f4e => Some(Network::Mainnet),
            0xdab6c3fa => Some(Network::Testnet),
            _ => None,
        }
    }

    /// Return the network magic bytes, which should be encoded little-endian
    /// at the start of every message
    pub fn magic(self) -> u32 {
        self.params().magic_number
    }

    /// Default peer-to-peer port
    pub fn standard_port(self) -> u16 {
        self.params().standard_port
    }

    /// Version byte of pay-to-pubkey-hash addresses
    pub fn p2pkh_version(self) -> u8 {
        match self {
            Network::Mainnet => 30,  // 'D' prefix
            Network::Testnet => 126, // 't' prefix
        }
    }

    /// Version byte of pay-to-script-hash addresses
    pub fn p2sh_version(self) -> u8 {
        match self {
            Network::Mainnet => 63,  // 'S' prefix
            Network::Testnet => 140, // 'y' prefix
        }
    }

    /// Static chain parameters for this network
    pub fn params(self) -> &'static ChainParams {
        match self {
            Network::Mainnet => &params::MAINNET_PARAMS,
            Network::Testnet => &params::TESTNET_PARAMS,
        }
    }

    /// Checkpoint table, ordered by height
    pub fn checkpoints(self) -> &'static [Checkpoint] {
        self.params().checkpoints
    }

    /// The most recent checkpoint whose timestamp is not after `timestamp`.
    ///
    /// The sync layer starts partial header downloads from here. Falls back to the
    /// first checkpoint when `timestamp` predates all of them.
    pub fn last_checkpoint_before(self, timestamp: u32) -> &'static Checkpoint {
        let checkpoints = self.checkpoints();
        checkpoints
            .iter()
            .rev()
            .find(|checkpoint| checkpoint.timestamp <= timestamp)
            .unwrap_or(&checkpoints[0])
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            _ => Err(Error::UnknownNetwork(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_magic_roundtrip() {
        for network in [Network::Mainnet, Network::Testnet] {
            assert_eq!(Network::from_magic(network.magic()), Some(network));
        }
    }

    #[test]
    fn test_ports() {
        assert_eq!(Network::Mainnet.standard_port(), 6022);
        assert_eq!(Network::Testnet.standard_port(), 12025);
    }

    #[test]
    fn test_parse_network() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("test".parse::<Network>().unwrap(), Network::Testnet);
        assert_matches!("regtest".parse::<Network>(), Err(Error::UnknownNetwork(_)));
        assert_eq!(Network::Testnet.to_string(), "testnet");
    }

    #[test]
    fn test_last_checkpoint_before() {
        let network = Network::Testnet;
        assert_eq!(network.last_checkpoint_before(0).height, 145000);
        assert_eq!(network.last_checkpoint_before(1460001303).height, 2149922);
        assert_eq!(network.last_checkpoint_before(u32::MAX).height, 4444444);
        assert_eq!(Network::Mainnet.last_checkpoint_before(u32::MAX).height, 0);
    }
}
