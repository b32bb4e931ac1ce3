//! Wallet configuration
//!
//! This module defines the configuration options for wallets.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use noir_network::Network;

use crate::address_chain::{DEFAULT_EXTERNAL_GAP_LIMIT, DEFAULT_INTERNAL_GAP_LIMIT, MAX_GAP_LIMIT};
use crate::error::{Result, WalletError};
use crate::fee::DEFAULT_FEE_PER_KB;

/// Wallet configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WalletConfig {
    /// Network addresses are encoded for
    pub network: Network,
    /// Unused receive addresses kept past the highest used one
    pub external_gap_limit: u32,
    /// Unused change addresses kept past the highest used one
    pub internal_gap_limit: u32,
    /// Initial fee rate; clamped into the accepted range when applied
    pub fee_per_kb: u64,
    /// Let coin selection spend asset-carrying outputs
    pub allow_asset_spend: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            external_gap_limit: DEFAULT_EXTERNAL_GAP_LIMIT,
            internal_gap_limit: DEFAULT_INTERNAL_GAP_LIMIT,
            fee_per_kb: DEFAULT_FEE_PER_KB,
            allow_asset_spend: false,
        }
    }
}

impl WalletConfig {
    /// Create a new wallet configuration with default values
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Set the external gap limit
    pub fn with_external_gap_limit(mut self, limit: u32) -> Self {
        self.external_gap_limit = limit;
        self
    }

    /// Set the internal gap limit
    pub fn with_internal_gap_limit(mut self, limit: u32) -> Self {
        self.internal_gap_limit = limit;
        self
    }

    /// Set both gap limits
    pub fn with_gap_limits(mut self, external: u32, internal: u32) -> Self {
        self.external_gap_limit = external;
        self.internal_gap_limit = internal;
        self
    }

    /// Set the initial fee rate
    pub fn with_fee_per_kb(mut self, fee_per_kb: u64) -> Self {
        self.fee_per_kb = fee_per_kb;
        self
    }

    /// Allow asset-carrying outputs to be spent as plain coins
    pub fn with_asset_spend(mut self, allow: bool) -> Self {
        self.allow_asset_spend = allow;
        self
    }

    /// Check the gap limits are usable
    pub fn validate(&self) -> Result<()> {
        for (name, limit) in
            [("external", self.external_gap_limit), ("internal", self.internal_gap_limit)]
        {
            if limit == 0 {
                return Err(WalletError::InvalidConfig(format!("{} gap limit must be positive", name)));
            }
            if limit > MAX_GAP_LIMIT {
                return Err(WalletError::InvalidConfig(format!(
                    "{} gap limit {} exceeds maximum {}",
                    name, limit, MAX_GAP_LIMIT
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults() {
        let config = WalletConfig::new(Network::Testnet);
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.external_gap_limit, 10);
        assert_eq!(config.internal_gap_limit, 5);
        assert_eq!(config.fee_per_kb, DEFAULT_FEE_PER_KB);
        assert!(!config.allow_asset_spend);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = WalletConfig::default()
            .with_gap_limits(20, 8)
            .with_fee_per_kb(10_000)
            .with_asset_spend(true);
        assert_eq!(config.external_gap_limit, 20);
        assert_eq!(config.internal_gap_limit, 8);
        assert_eq!(config.fee_per_kb, 10_000);
        assert!(config.allow_asset_spend);
    }

    #[test]
    fn test_validate_rejects_bad_gap_limits() {
        assert_matches!(
            WalletConfig::default().with_external_gap_limit(0).validate(),
            Err(WalletError::InvalidConfig(_))
        );
        assert_matches!(
            WalletConfig::default().with_internal_gap_limit(MAX_GAP_LIMIT + 1).validate(),
            Err(WalletError::InvalidConfig(_))
        );
        assert!(WalletConfig::default().with_internal_gap_limit(MAX_GAP_LIMIT).validate().is_ok());
    }
}
