//! Deterministic address chains with gap limit tracking
//!
//! Each chain is a generation-ordered list of addresses derived from consecutive
//! indices. The chain is only ever extended, never trimmed, so an index once handed
//! out keeps resolving to the same address.

use std::collections::HashMap;

use noir_network::Network;
use tracing::trace;

use crate::address::Address;
use crate::error::Result;
use crate::keys::{ChainKind, PublicKeySource};

/// Standard gap limit for external (receive) addresses
pub const DEFAULT_EXTERNAL_GAP_LIMIT: u32 = 10;

/// Standard gap limit for internal (change) addresses
pub const DEFAULT_INTERNAL_GAP_LIMIT: u32 = 5;

/// Maximum gap limit to prevent excessive address generation
pub const MAX_GAP_LIMIT: u32 = 1000;

/// One derivation chain of addresses
#[derive(Debug, Clone)]
pub struct AddressChain {
    kind: ChainKind,
    network: Network,
    addresses: Vec<Address>,
    indices: HashMap<Address, u32>,
}

impl AddressChain {
    /// Create an empty chain
    pub fn new(kind: ChainKind, network: Network) -> Self {
        Self {
            kind,
            network,
            addresses: Vec::new(),
            indices: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ChainKind {
        self.kind
    }

    /// Every address generated so far, in index order
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.indices.contains_key(address)
    }

    /// Derivation index of `address` on this chain
    pub fn index_of(&self, address: &Address) -> Option<u32> {
        self.indices.get(address).copied()
    }

    /// Start of the trailing run of unused addresses.
    ///
    /// Everything at or past this index is unused; the address just before it, if
    /// any, is the highest used one.
    pub fn frontier(&self, is_used: impl Fn(&Address) -> bool) -> usize {
        let mut i = self.addresses.len();
        while i > 0 && !is_used(&self.addresses[i - 1]) {
            i -= 1;
        }
        i
    }

    /// First address past the highest used one, without generating anything
    pub fn first_unused(&self, is_used: impl Fn(&Address) -> bool) -> Option<&Address> {
        self.addresses.get(self.frontier(is_used))
    }

    /// The `gap_limit` addresses following the highest used one, generating any
    /// that do not exist yet.
    ///
    /// Returns the requested window and the number of newly generated addresses.
    /// Nothing is committed if a key cannot be derived.
    pub fn unused_addresses(
        &mut self,
        keys: &dyn PublicKeySource,
        gap_limit: u32,
        is_used: impl Fn(&Address) -> bool,
    ) -> Result<(Vec<Address>, usize)> {
        let gap_limit = gap_limit as usize;
        let mut start = self.frontier(&is_used);
        let mut generated = Vec::new();
        let mut count = self.addresses.len();

        while start + gap_limit > count {
            let public_key = keys.public_key(self.kind, count as u32)?;
            let address = Address::p2pkh(&public_key, self.network);
            count += 1;
            // a fresh address that is already used moves the window past it
            if is_used(&address) {
                start = count;
            }
            generated.push(address);
        }

        let new_count = generated.len();
        for address in generated {
            let index = self.addresses.len() as u32;
            self.indices.insert(address, index);
            self.addresses.push(address);
        }
        if new_count > 0 {
            trace!(chain = ?self.kind, new_count, total = self.addresses.len(), "extended address chain");
        }

        Ok((self.addresses[start..start + gap_limit].to_vec(), new_count))
    }
}
