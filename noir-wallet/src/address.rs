//! Address generation and encoding

use std::fmt;
use std::str::FromStr;

use bitcoin_hashes::{hash160, Hash};
use noir_network::Network;
use secp256k1::PublicKey;

use crate::error::{Result, WalletError};
use crate::script::Script;

/// Address types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressType {
    /// Pay to public key hash (P2PKH)
    P2PKH,
    /// Pay to script hash (P2SH)
    P2SH,
}

/// A base58check address bound to a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// The network this address is valid for
    pub network: Network,
    /// The type of address
    pub address_type: AddressType,
    /// The hash160 of the public key or script
    pub hash: hash160::Hash,
}

impl Address {
    /// Create a P2PKH address from a compressed public key
    pub fn p2pkh(pubkey: &PublicKey, network: Network) -> Self {
        Self::p2pkh_from_bytes(&pubkey.serialize(), network)
    }

    /// Create a P2PKH address from serialized public key bytes (compressed or not)
    pub fn p2pkh_from_bytes(pubkey: &[u8], network: Network) -> Self {
        Self {
            network,
            address_type: AddressType::P2PKH,
            hash: hash160::Hash::hash(pubkey),
        }
    }

    /// Create a P2SH address from a script hash
    pub fn p2sh(script_hash: hash160::Hash, network: Network) -> Self {
        Self {
            network,
            address_type: AddressType::P2SH,
            hash: script_hash,
        }
    }

    /// The address paid by an output script, if it is a standard template
    pub fn from_script(script: &Script, network: Network) -> Option<Self> {
        if let Some(hash) = script.p2pkh_hash() {
            return Some(Self {
                network,
                address_type: AddressType::P2PKH,
                hash: hash160::Hash::from_byte_array(hash),
            });
        }
        script.p2sh_hash().map(|hash| Self::p2sh(hash160::Hash::from_byte_array(hash), network))
    }

    /// The address that signed an input, recovered from its script-sig.
    ///
    /// `<sig> <pubkey>` yields the P2PKH address of the key; `OP_0 ... <redeem script>`
    /// yields the P2SH address of the redeem script.
    pub fn from_script_sig(script_sig: &Script, network: Network) -> Option<Self> {
        let pushes = script_sig.push_elements()?;
        match pushes.as_slice() {
            [_sig, pubkey] if pubkey.len() == 33 || pubkey.len() == 65 => {
                Some(Self::p2pkh_from_bytes(pubkey, network))
            }
            [first, .., redeem] if first.is_empty() && !redeem.is_empty() => {
                Some(Self::p2sh(hash160::Hash::hash(redeem), network))
            }
            _ => None,
        }
    }

    /// Get the script pubkey for this address
    pub fn script_pubkey(&self) -> Script {
        let hash = self.hash.to_byte_array();
        match self.address_type {
            AddressType::P2PKH => Script::new_p2pkh(&hash),
            AddressType::P2SH => Script::new_p2sh(&hash),
        }
    }

    /// Parse an address, requiring it to belong to `network`
    pub fn from_str_checked(s: &str, network: Network) -> Result<Self> {
        let address: Address = s.parse()?;
        if address.network != network {
            return Err(WalletError::InvalidAddress(format!(
                "{} is a {} address, expected {}",
                s, address.network, network
            )));
        }
        Ok(address)
    }

    fn version(&self) -> u8 {
        match self.address_type {
            AddressType::P2PKH => self.network.p2pkh_version(),
            AddressType::P2SH => self.network.p2sh_version(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = Vec::with_capacity(21);
        data.push(self.version());
        data.extend_from_slice(self.hash.as_byte_array());
        write!(f, "{}", base58ck::encode_check(&data))
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let data = base58ck::decode_check(s)
            .map_err(|_| WalletError::InvalidAddress("Invalid base58 encoding".into()))?;

        if data.len() != 21 {
            return Err(WalletError::InvalidAddress("Invalid address length".into()));
        }

        let version = data[0];
        let hash = hash160::Hash::from_slice(&data[1..])
            .map_err(|_| WalletError::InvalidAddress("Invalid hash".into()))?;

        for network in [Network::Mainnet, Network::Testnet] {
            if version == network.p2pkh_version() {
                return Ok(Self {
                    network,
                    address_type: AddressType::P2PKH,
                    hash,
                });
            }
            if version == network.p2sh_version() {
                return Ok(Self::p2sh(hash, network));
            }
        }
        Err(WalletError::InvalidAddress(format!("Invalid version byte {}", version)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn test_pubkey() -> PublicKey {
        PublicKey::from_slice(&[
            0x02, 0x50, 0x86, 0x3a, 0xd6, 0x4a, 0x87, 0xae, 0x8a, 0x2f, 0xe8, 0x3c, 0x1a, 0xf1,
            0xa8, 0x40, 0x3c, 0xb5, 0x3f, 0x53, 0xe4, 0x86, 0xd8, 0x51, 0x1d, 0xad, 0x8a, 0x04,
            0x88, 0x7e, 0x5b, 0x23, 0x52,
        ])
        .unwrap()
    }

    #[test]
    fn test_p2pkh_roundtrip() {
        for network in [Network::Mainnet, Network::Testnet] {
            let address = Address::p2pkh(&test_pubkey(), network);
            let encoded = address.to_string();
            let decoded: Address = encoded.parse().unwrap();
            assert_eq!(decoded, address);
            assert_eq!(Address::from_script(&address.script_pubkey(), network), Some(address));
        }
    }

    #[test]
    fn test_mainnet_prefix() {
        let address = Address::p2pkh(&test_pubkey(), Network::Mainnet);
        assert!(address.to_string().starts_with('D'));
        let address = Address::p2sh(hash160::Hash::hash(b"script"), Network::Mainnet);
        assert!(address.to_string().starts_with('S'));
    }

    #[test]
    fn test_network_mismatch() {
        let address = Address::p2pkh(&test_pubkey(), Network::Testnet).to_string();
        assert_matches!(
            Address::from_str_checked(&address, Network::Mainnet),
            Err(WalletError::InvalidAddress(_))
        );
        assert!(Address::from_str_checked(&address, Network::Testnet).is_ok());
    }

    #[test]
    fn test_invalid_strings() {
        assert_matches!("".parse::<Address>(), Err(WalletError::InvalidAddress(_)));
        assert_matches!("not-an-address".parse::<Address>(), Err(WalletError::InvalidAddress(_)));
        // valid checksum, unknown version byte
        let foreign = base58ck::encode_check(&[0u8; 21]);
        assert_matches!(foreign.parse::<Address>(), Err(WalletError::InvalidAddress(_)));
    }

    #[test]
    fn test_from_script_sig() {
        let pubkey = test_pubkey().serialize();
        let script_sig = Script::from_pushes(&[&[0x30u8; 71][..], &pubkey[..]]);
        let address = Address::from_script_sig(&script_sig, Network::Testnet).unwrap();
        assert_eq!(address, Address::p2pkh(&test_pubkey(), Network::Testnet));

        let redeem = [0x51u8, 0x21];
        let script_sig = Script::from_pushes(&[&[][..], &[0x30u8; 71][..], &redeem[..]]);
        let address = Address::from_script_sig(&script_sig, Network::Testnet).unwrap();
        assert_eq!(address.address_type, AddressType::P2SH);

        assert_eq!(Address::from_script_sig(&Script::new(), Network::Testnet), None);
    }
}
