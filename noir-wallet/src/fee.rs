//! Fee model
//!
//! Pure functions of transaction size and the configured fee rate.

/// Minimum relay fee rate, per kilobyte of transaction size
pub const TX_FEE_PER_KB: u64 = 1000;

/// Estimated size of a typical P2PKH output
pub const TX_OUTPUT_SIZE: usize = 34;

/// Estimated size of a typical compressed-key P2PKH input
pub const TX_INPUT_SIZE: usize = 148;

/// No output may be below this amount: three times the cost of creating and spending it
pub const TX_MIN_OUTPUT_AMOUNT: u64 =
    TX_FEE_PER_KB * 3 * (TX_OUTPUT_SIZE + TX_INPUT_SIZE) as u64 / 1000;

/// Largest transaction the wallet builds or treats as non-pending
pub const TX_MAX_SIZE: usize = 100_000;

/// Default fee rate of a new wallet
pub const DEFAULT_FEE_PER_KB: u64 = 50_000;

/// Lowest fee rate a wallet accepts
pub const MIN_FEE_PER_KB: u64 = 5_236;

/// Highest fee rate a wallet accepts
pub const MAX_FEE_PER_KB: u64 = 5_236_126;

/// Sentinel returned when a fee cannot be computed because an input's source is unknown
pub const FEE_UNKNOWN: u64 = u64::MAX;

/// Fee rate in base units per kilobyte, always within `[MIN_FEE_PER_KB, MAX_FEE_PER_KB]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeeRate {
    per_kb: u64,
}

impl Default for FeeRate {
    fn default() -> Self {
        Self {
            per_kb: DEFAULT_FEE_PER_KB,
        }
    }
}

impl FeeRate {
    /// Create a fee rate, clamped into the accepted range
    pub fn new(per_kb: u64) -> Self {
        Self {
            per_kb: per_kb.clamp(MIN_FEE_PER_KB, MAX_FEE_PER_KB),
        }
    }

    pub fn per_kb(&self) -> u64 {
        self.per_kb
    }

    /// `ceil(size / 1000) * rate`
    pub fn fee_for_size(&self, size: usize) -> u64 {
        (size as u64).div_ceil(1000).saturating_mul(self.per_kb)
    }

    /// Smallest output worth creating at this rate.
    ///
    /// Scales the absolute minimum output by how far the rate sits above the floor,
    /// rounding up.
    pub fn min_output_amount(&self) -> u64 {
        let amount = (TX_MIN_OUTPUT_AMOUNT * self.per_kb).div_ceil(MIN_FEE_PER_KB);
        amount.max(TX_MIN_OUTPUT_AMOUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_output_constant() {
        assert_eq!(TX_MIN_OUTPUT_AMOUNT, 546);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(FeeRate::new(0).per_kb(), MIN_FEE_PER_KB);
        assert_eq!(FeeRate::new(u64::MAX).per_kb(), MAX_FEE_PER_KB);
        assert_eq!(FeeRate::new(10_000).per_kb(), 10_000);
        assert_eq!(FeeRate::default().per_kb(), DEFAULT_FEE_PER_KB);
    }

    #[test]
    fn test_fee_rounds_up_per_kb() {
        let rate = FeeRate::new(10_000);
        assert_eq!(rate.fee_for_size(0), 0);
        assert_eq!(rate.fee_for_size(1), 10_000);
        assert_eq!(rate.fee_for_size(1000), 10_000);
        assert_eq!(rate.fee_for_size(1001), 20_000);
    }

    #[test]
    fn test_fee_monotonic() {
        for per_kb in [MIN_FEE_PER_KB, DEFAULT_FEE_PER_KB, MAX_FEE_PER_KB] {
            let rate = FeeRate::new(per_kb);
            let mut last = 0;
            for size in (0..5000).step_by(37) {
                let fee = rate.fee_for_size(size);
                assert!(fee >= last);
                last = fee;
            }
        }
    }

    #[test]
    fn test_min_output_amount() {
        assert_eq!(FeeRate::new(MIN_FEE_PER_KB).min_output_amount(), 546);
        // 546 * 50000 / 5236 = 5213.9..., rounded up
        assert_eq!(FeeRate::new(DEFAULT_FEE_PER_KB).min_output_amount(), 5214);
    }
}
