//! Hash newtypes

use std::fmt;
use std::str::FromStr;

use bitcoin_hashes::{sha256d, Hash};

use crate::error::WalletError;

/// A transaction id: double SHA-256 of the serialized transaction, in internal byte order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Txid(pub [u8; 32]);

impl Txid {
    /// Hash raw serialized transaction bytes
    pub fn hash(data: &[u8]) -> Self {
        Txid(sha256d::Hash::hash(data).to_byte_array())
    }

    /// Parse the conventional reversed-hex rendering
    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| WalletError::InvalidHex(format!("{}: {}", s, e)))?;
        bytes.reverse();
        Ok(Txid(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First little-endian word, used for cheap hashing of outpoints
    pub(crate) fn first_word(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0;
        bytes.reverse();
        write!(f, "{}", hex::encode(bytes))
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", self)
    }
}

impl FromStr for Txid {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Txid::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txid_hex_roundtrip() {
        let s = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
        let txid: Txid = s.parse().unwrap();
        assert_eq!(txid.to_string(), s);
        assert_eq!(txid.0[0], 0x3b);
    }

    #[test]
    fn test_sha256d() {
        // double SHA-256 of the empty string
        let txid = Txid::hash(&[]);
        assert_eq!(
            hex::encode(txid.0),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }
}
