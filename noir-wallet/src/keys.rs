//! Key derivation collaborators
//!
//! The engine only needs two capabilities: public keys for address generation and,
//! during signing, private keys derived from a seed. Both are traits so a hardware
//! or remote signer can stand in; the BIP32 implementation below is the default.
//!
//! Derivation layout: the master public key is `m/0'`, receive addresses live under
//! `m/0'/0/i` and change addresses under `m/0'/1/i`.

use std::fmt;

use bitcoin_hashes::{hash160, hmac, sha512, Hash, HashEngine};
use secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};

use crate::error::{Result, WalletError};

const BIP32_SEED_KEY: &[u8] = b"Bitcoin seed";
const BIP32_HARDENED: u32 = 0x8000_0000;

/// Which address chain a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChainKind {
    /// Receive addresses (`m/0'/0`)
    External,
    /// Change addresses (`m/0'/1`)
    Internal,
}

impl ChainKind {
    /// BIP32 child index of the chain under the account key
    pub fn index(self) -> u32 {
        match self {
            ChainKind::External => 0,
            ChainKind::Internal => 1,
        }
    }
}

/// Source of public keys for address generation
pub trait PublicKeySource: Send + Sync {
    /// Public key at `index` on `chain`
    fn public_key(&self, chain: ChainKind, index: u32) -> Result<PublicKey>;
}

/// Source of private keys and signatures, consulted only while signing
pub trait SigningKeySource {
    /// Private key at `index` on `chain`, derived from `seed`
    fn secret_key(&self, seed: &[u8], chain: ChainKind, index: u32) -> Result<SecretKey>;

    /// DER-encoded ECDSA signature over `digest`
    fn sign(&self, key: &SecretKey, digest: [u8; 32]) -> Vec<u8>;

    /// Public key matching `key`
    fn public_key_for(&self, key: &SecretKey) -> PublicKey;
}

fn hmac_sha512(key: &[u8], data: &[&[u8]]) -> [u8; 64] {
    let mut engine = hmac::HmacEngine::<sha512::Hash>::new(key);
    for part in data {
        engine.input(part);
    }
    hmac::Hmac::<sha512::Hash>::from_engine(engine).to_byte_array()
}

fn split(i: [u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&i[..32]);
    right.copy_from_slice(&i[32..]);
    (left, right)
}

fn tweak(il: [u8; 32]) -> Result<Scalar> {
    Scalar::from_be_bytes(il).map_err(|_| WalletError::KeyDerivation("tweak out of range".into()))
}

/// Extended private key
#[derive(Clone, Copy)]
struct ExtendedPrivKey {
    secret: SecretKey,
    chain_code: [u8; 32],
}

impl ExtendedPrivKey {
    fn master(seed: &[u8]) -> Result<Self> {
        if seed.is_empty() {
            return Err(WalletError::KeyDerivation("empty seed".into()));
        }
        let (il, ir) = split(hmac_sha512(BIP32_SEED_KEY, &[seed]));
        let secret = SecretKey::from_slice(&il)
            .map_err(|e| WalletError::KeyDerivation(format!("invalid master key: {}", e)))?;
        Ok(Self {
            secret,
            chain_code: ir,
        })
    }

    fn child(&self, secp: &Secp256k1<All>, index: u32) -> Result<Self> {
        let index_bytes = index.to_be_bytes();
        let i = if index >= BIP32_HARDENED {
            hmac_sha512(
                &self.chain_code,
                &[&[0u8][..], &self.secret.secret_bytes()[..], &index_bytes[..]],
            )
        } else {
            let public = PublicKey::from_secret_key(secp, &self.secret).serialize();
            hmac_sha512(&self.chain_code, &[&public[..], &index_bytes[..]])
        };
        let (il, ir) = split(i);
        let secret = self.secret.add_tweak(&tweak(il)?)?;
        Ok(Self {
            secret,
            chain_code: ir,
        })
    }

    fn public(&self, secp: &Secp256k1<All>) -> ExtendedPubKey {
        ExtendedPubKey {
            public: PublicKey::from_secret_key(secp, &self.secret),
            chain_code: self.chain_code,
        }
    }
}

/// Extended public key
#[derive(Clone, Copy, PartialEq, Eq)]
struct ExtendedPubKey {
    public: PublicKey,
    chain_code: [u8; 32],
}

impl ExtendedPubKey {
    fn child(&self, secp: &Secp256k1<All>, index: u32) -> Result<Self> {
        if index >= BIP32_HARDENED {
            return Err(WalletError::KeyDerivation(
                "hardened derivation needs a private key".into(),
            ));
        }
        let public = self.public.serialize();
        let i = hmac_sha512(&self.chain_code, &[&public[..], &index.to_be_bytes()[..]]);
        let (il, ir) = split(i);
        let public = self.public.add_exp_tweak(secp, &tweak(il)?)?;
        Ok(Self {
            public,
            chain_code: ir,
        })
    }
}

/// The wallet's account-level public key (`m/0'`).
///
/// Holds no private material; safe to keep for the wallet's lifetime.
#[derive(Clone)]
pub struct MasterPubKey {
    fingerprint: u32,
    account: ExtendedPubKey,
    secp: Secp256k1<All>,
}

impl MasterPubKey {
    /// Derive the account public key from a wallet seed
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let secp = Secp256k1::new();
        let master = ExtendedPrivKey::master(seed)?;
        let master_public = PublicKey::from_secret_key(&secp, &master.secret).serialize();
        let id = hash160::Hash::hash(&master_public);
        let bytes = id.as_byte_array();
        let fingerprint = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let account = master.child(&secp, BIP32_HARDENED)?.public(&secp);
        Ok(Self {
            fingerprint,
            account,
            secp,
        })
    }

    /// Build from serialized account public key and chain code
    pub fn from_parts(fingerprint: u32, chain_code: [u8; 32], public_key: &[u8]) -> Result<Self> {
        let public = PublicKey::from_slice(public_key)?;
        Ok(Self {
            fingerprint,
            account: ExtendedPubKey {
                public,
                chain_code,
            },
            secp: Secp256k1::new(),
        })
    }

    /// Fingerprint of the master key this account descends from
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    pub fn chain_code(&self) -> [u8; 32] {
        self.account.chain_code
    }

    pub fn account_public_key(&self) -> PublicKey {
        self.account.public
    }

    /// Extended public key of one address chain (`m/0'/chain`)
    pub fn chain_public_key(&self, chain: ChainKind) -> Result<PublicKey> {
        Ok(self.account.child(&self.secp, chain.index())?.public)
    }
}

impl PartialEq for MasterPubKey {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint && self.account == other.account
    }
}

impl fmt::Debug for MasterPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterPubKey")
            .field("fingerprint", &format_args!("{:08x}", self.fingerprint))
            .field("public_key", &self.account.public)
            .finish()
    }
}

impl PublicKeySource for MasterPubKey {
    fn public_key(&self, chain: ChainKind, index: u32) -> Result<PublicKey> {
        let chain_key = self.account.child(&self.secp, chain.index())?;
        Ok(chain_key.child(&self.secp, index)?.public)
    }
}

/// BIP32 signer deriving `m/0'/chain/index` from the seed on every call
pub struct Bip32Signer {
    secp: Secp256k1<All>,
}

impl Bip32Signer {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }
}

impl Default for Bip32Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl SigningKeySource for Bip32Signer {
    fn secret_key(&self, seed: &[u8], chain: ChainKind, index: u32) -> Result<SecretKey> {
        let key = ExtendedPrivKey::master(seed)?
            .child(&self.secp, BIP32_HARDENED)?
            .child(&self.secp, chain.index())?
            .child(&self.secp, index)?;
        Ok(key.secret)
    }

    fn sign(&self, key: &SecretKey, digest: [u8; 32]) -> Vec<u8> {
        let message = secp256k1::Message::from_digest(digest);
        self.secp.sign_ecdsa(&message, key).serialize_der().to_vec()
    }

    fn public_key_for(&self, key: &SecretKey) -> PublicKey {
        PublicKey::from_secret_key(&self.secp, key)
    }
}
