//! Blockchain checkpoints
//!
//! Checkpoints are also used as starting points for partial chain downloads, so they
//! must sit on difficulty transition boundaries in order to verify the block
//! difficulty at the immediately following transition.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A block hash in internal (little-endian) byte order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    /// Parse a block hash from its conventional big-endian hex rendering
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| Error::InvalidBlockHash(e.to_string()))?;
        bytes.reverse();
        Ok(BlockHash(bytes))
    }

    /// Raw bytes in internal order
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0;
        bytes.reverse();
        write!(f, "{}", hex::encode(bytes))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self)
    }
}

impl FromStr for BlockHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BlockHash::from_hex(s)
    }
}

/// A trusted block known ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// Block height
    pub height: u32,
    /// Block hash as big-endian hex
    pub hash: &'static str,
    /// Block timestamp
    pub timestamp: u32,
    /// Compact difficulty target
    pub target: u32,
}

impl Checkpoint {
    /// Parsed block hash of this checkpoint
    pub fn block_hash(&self) -> Result<BlockHash> {
        BlockHash::from_hex(self.hash)
    }
}

pub(crate) static MAINNET_CHECKPOINTS: [Checkpoint; 1] = [Checkpoint {
    height: 0,
    hash: "000006a09dc95e0eb30c677e1c8a01080e2c49d1dd22ad1479492c61ffde9177",
    timestamp: 1609599446,
    target: 0x1e0ffff0,
}];

pub(crate) static TESTNET_CHECKPOINTS: [Checkpoint; 4] = [
    Checkpoint {
        height: 145000,
        hash: "f8d650dda836d5e3809b928b8523f050891c3bb9fa2c201bb04824a8a2fe7df6",
        timestamp: 1409596362,
        target: 0x1c01f271,
    },
    Checkpoint {
        height: 1800000,
        hash: "72f46e1fff56518dce7e540b407260ea827cb1c4652f24eb1d1917f54b95d65a",
        timestamp: 1454769372,
        target: 0x1c021355,
    },
    Checkpoint {
        height: 2149922,
        hash: "557846763a5f1eb3205d175724bd26ba7123c17c49eaaadf20b67c7e20e3118a",
        timestamp: 1460001303,
        target: 0x1c012a26,
    },
    Checkpoint {
        height: 4444444,
        hash: "0000000000000114de2ba1462056d2a9bd9ccfbd406cd2dfedaaef2c12910659",
        timestamp: 1494132592,
        target: 0x1a01152f,
    },
];
