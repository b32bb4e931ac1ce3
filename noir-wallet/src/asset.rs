//! DigiAssets classification
//!
//! An asset transaction carries an `OP_RETURN` marker output whose data starts
//! with `"DA"`, a protocol version byte and an operation byte. The operation
//! byte's high nibble says what happens to the asset, the low nibble how its
//! metadata is referenced. Outputs carrying the asset itself are small dust
//! outputs next to the marker; spending them as plain coins would destroy the
//! asset, so they are held back from coin selection.

use crate::script::{Instruction, Script, OP_RETURN};
use crate::transaction::{Transaction, TxOut};

/// Marker prefix of a DigiAssets `OP_RETURN` payload
pub const ASSET_MARKER_PREFIX: &[u8; 2] = b"DA";

/// Value of the dust outputs that carry assets
pub const ASSET_DUST_AMOUNT: u64 = 700;

/// What an asset transaction does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssetOperation {
    Undefined,
    Issuance,
    Transfer,
    Burn,
}

impl AssetOperation {
    /// Classify an operation byte.
    ///
    /// High nibble zero with a non-zero low nibble is an issuance; otherwise bit
    /// `0x10` marks a transfer and bit `0x20` a burn.
    pub fn from_byte(byte: u8) -> Self {
        if byte & 0xf0 == 0 && byte & 0x0f != 0 {
            AssetOperation::Issuance
        } else if byte & 0x10 != 0 {
            AssetOperation::Transfer
        } else if byte & 0x20 != 0 {
            AssetOperation::Burn
        } else {
            AssetOperation::Undefined
        }
    }
}

/// How the metadata of an asset operation is referenced (low nibble of the operation byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssetMarker {
    /// SHA-1 info hash and SHA-256 metadata hash inline
    Sha1MetaSha256,
    /// SHA-1 inline, SHA-256 in a 1-of-2 multisig output
    Sha1Multisig12,
    /// SHA-1 inline, SHA-256 in a 1-of-3 multisig output
    Sha1Multisig13,
    /// SHA-1 info hash only
    Sha1Meta,
    /// No metadata, supply locked
    NoMetaLocked,
    /// No metadata, supply unlocked
    NoMetaUnlocked,
}

impl AssetMarker {
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble & 0x0f {
            0x01 => Some(AssetMarker::Sha1MetaSha256),
            0x02 => Some(AssetMarker::Sha1Multisig12),
            0x03 => Some(AssetMarker::Sha1Multisig13),
            0x04 => Some(AssetMarker::Sha1Meta),
            0x05 => Some(AssetMarker::NoMetaLocked),
            0x06 => Some(AssetMarker::NoMetaUnlocked),
            _ => None,
        }
    }

    fn has_info_hash(self) -> bool {
        !matches!(self, AssetMarker::NoMetaLocked | AssetMarker::NoMetaUnlocked)
    }
}

/// Parsed asset marker
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetData {
    pub version: u8,
    pub operation: AssetOperation,
    pub marker: Option<AssetMarker>,
    /// SHA-1 of the asset info, when inline
    pub info_hash: Option<[u8; 20]>,
    /// SHA-256 of the asset metadata, when inline
    pub metadata: Option<[u8; 32]>,
    pub locked: bool,
}

impl AssetData {
    /// Parse the payload of a marker output script
    pub fn from_script(script: &Script) -> Option<Self> {
        let mut instructions = script.instructions();
        if instructions.next() != Some(Instruction::Op(OP_RETURN)) {
            return None;
        }
        let Some(Instruction::Push(data)) = instructions.next() else {
            return None;
        };
        Self::from_payload(data)
    }

    fn from_payload(data: &[u8]) -> Option<Self> {
        if data.len() < 4 || &data[..2] != ASSET_MARKER_PREFIX {
            return None;
        }
        let version = data[2];
        let op = data[3];
        let marker = AssetMarker::from_nibble(op);
        let rest = &data[4..];

        let info_hash = match marker {
            Some(m) if m.has_info_hash() && rest.len() >= 20 => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&rest[..20]);
                Some(hash)
            }
            _ => None,
        };
        let metadata = match marker {
            Some(AssetMarker::Sha1MetaSha256) if rest.len() >= 52 => {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&rest[20..52]);
                Some(hash)
            }
            _ => None,
        };

        Some(Self {
            version,
            operation: AssetOperation::from_byte(op),
            marker,
            info_hash,
            metadata,
            locked: marker == Some(AssetMarker::NoMetaLocked),
        })
    }
}

/// The asset marker of a set of outputs, if any
pub fn asset_data(outputs: &[TxOut]) -> Option<AssetData> {
    outputs
        .iter()
        .filter(|output| output.script_pubkey.is_op_return())
        .find_map(|output| AssetData::from_script(&output.script_pubkey))
}

/// True if the outputs include a DigiAssets marker
pub fn contains_asset(outputs: &[TxOut]) -> bool {
    asset_data(outputs).is_some()
}

/// True if the transaction includes a DigiAssets marker
pub fn tx_contains_asset(tx: &Transaction) -> bool {
    contains_asset(&tx.output)
}

/// Operation performed by the transaction, `Undefined` when it carries no marker
pub fn classify(tx: &Transaction) -> AssetOperation {
    asset_data(&tx.output).map(|data| data.operation).unwrap_or(AssetOperation::Undefined)
}

/// True if `output` is an asset-carrying dust output
pub fn output_is_asset(output: &TxOut) -> bool {
    !output.script_pubkey.is_op_return() && output.value <= ASSET_DUST_AMOUNT
}

/// True if output `vout` of `tx` carries an asset
pub fn tx_output_is_asset(tx: &Transaction, vout: u32) -> bool {
    tx_contains_asset(tx) && tx.output.get(vout as usize).is_some_and(output_is_asset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(op: u8, extra: &[u8]) -> TxOut {
        let mut data = b"DA".to_vec();
        data.push(0x02);
        data.push(op);
        data.extend_from_slice(extra);
        TxOut::new(0, Script::new_op_return(&data))
    }

    #[test]
    fn test_operation_nibbles() {
        assert_eq!(AssetOperation::from_byte(0x01), AssetOperation::Issuance);
        assert_eq!(AssetOperation::from_byte(0x04), AssetOperation::Issuance);
        assert_eq!(AssetOperation::from_byte(0x06), AssetOperation::Issuance);
        assert_eq!(AssetOperation::from_byte(0x15), AssetOperation::Transfer);
        assert_eq!(AssetOperation::from_byte(0x25), AssetOperation::Burn);
        assert_eq!(AssetOperation::from_byte(0x00), AssetOperation::Undefined);
        assert_eq!(AssetOperation::from_byte(0x40), AssetOperation::Undefined);
    }

    #[test]
    fn test_issuance_with_info_hash() {
        let out = marker(0x04, &[0xaa; 20]);
        let data = AssetData::from_script(&out.script_pubkey).unwrap();
        assert_eq!(data.version, 0x02);
        assert_eq!(data.operation, AssetOperation::Issuance);
        assert_eq!(data.marker, Some(AssetMarker::Sha1Meta));
        assert_eq!(data.info_hash, Some([0xaa; 20]));
        assert_eq!(data.metadata, None);
        assert!(!data.locked);
    }

    #[test]
    fn test_full_metadata_and_lock() {
        let mut extra = vec![0x11; 20];
        extra.extend_from_slice(&[0x22; 32]);
        let data = AssetData::from_script(&marker(0x01, &extra).script_pubkey).unwrap();
        assert_eq!(data.metadata, Some([0x22; 32]));

        let data = AssetData::from_script(&marker(0x05, &[]).script_pubkey).unwrap();
        assert!(data.locked);
        assert_eq!(data.info_hash, None);
    }

    #[test]
    fn test_non_asset_op_return() {
        let out = TxOut::new(0, Script::new_op_return(b"hello world"));
        assert!(!contains_asset(&[out]));
        let out = TxOut::new(0, Script::new_op_return(b"DA"));
        assert!(!contains_asset(&[out]));
    }

    #[test]
    fn test_asset_outputs() {
        let mut tx = Transaction::new();
        tx.output.push(TxOut::new(ASSET_DUST_AMOUNT, Script::new_p2pkh(&[1; 20])));
        tx.output.push(TxOut::new(50_000, Script::new_p2pkh(&[2; 20])));
        assert!(!tx_output_is_asset(&tx, 0));

        tx.output.push(marker(0x04, &[0xaa; 20]));
        assert_eq!(classify(&tx), AssetOperation::Issuance);
        assert!(tx_output_is_asset(&tx, 0));
        assert!(!tx_output_is_asset(&tx, 1));
        assert!(!tx_output_is_asset(&tx, 2));
        assert!(!tx_output_is_asset(&tx, 9));
    }
}
