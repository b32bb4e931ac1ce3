//! Conversion between base units and local currency units

/// Base units per coin
pub const COIN: i64 = 100_000_000;

/// Largest amount [`coin_amount`] returns
pub const MAX_MONEY: i64 = 21_000_000 * COIN;

/// `amount` base units in local currency units (cents, pence, ...), where `price`
/// is local units per coin.
///
/// A non-zero amount too small to show in local units becomes the smallest
/// non-zero local amount.
pub fn local_amount(amount: i64, price: f64) -> i64 {
    let local = (amount.unsigned_abs() as f64 * price / COIN as f64) as i64;
    let local = if local == 0 && amount != 0 {
        1
    } else {
        local
    };
    if amount < 0 {
        -local
    } else {
        local
    }
}

/// `local` currency units in base units, where `price` is local units per coin.
///
/// Picks the roundest amount that still converts back to `local`.
pub fn coin_amount(local: i64, price: f64) -> i64 {
    let mut lamt = local.unsigned_abs().min(i64::MAX as u64) as i64;
    let mut amount = 0i64;

    if lamt != 0 && price > 0.0 {
        let mut overflow_bits = 0;
        while lamt >= i64::MAX / COIN {
            lamt /= 2;
            overflow_bits += 1;
        }

        let mut min = ((lamt * COIN) as f64 / price) as i64;
        let max = (((lamt + 1) * COIN) as f64 / price) as i64 - 1;
        amount = (min + max) / 2;
        for _ in 0..overflow_bits {
            min = min.saturating_mul(2);
            amount = amount.saturating_mul(2);
        }

        if amount >= MAX_MONEY {
            return if local < 0 {
                -MAX_MONEY
            } else {
                MAX_MONEY
            };
        }

        let mut p = 10i64;
        while (amount / p) * p >= min && p <= i64::MAX / 10 {
            p *= 10;
        }
        p /= 10;
        amount = (amount / p) * p;
    }

    if local < 0 {
        -amount
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_amount() {
        assert_eq!(local_amount(COIN, 5000.0), 5000);
        assert_eq!(local_amount(-2 * COIN, 100.0), -200);
        assert_eq!(local_amount(0, 100.0), 0);
        // too small to show, still non-zero
        assert_eq!(local_amount(1, 5000.0), 1);
        assert_eq!(local_amount(-1, 5000.0), -1);
    }

    #[test]
    fn test_coin_amount_rounds_to_lowest_precision() {
        assert_eq!(coin_amount(5000, 5000.0), COIN);
        assert_eq!(coin_amount(-5000, 5000.0), -COIN);
        assert_eq!(local_amount(coin_amount(1234, 5000.0), 5000.0), 1234);
    }

    #[test]
    fn test_coin_amount_degenerate_inputs() {
        assert_eq!(coin_amount(0, 5000.0), 0);
        assert_eq!(coin_amount(5000, 0.0), 0);
        assert_eq!(coin_amount(1_000_000_000_000_000, 1.0), MAX_MONEY);
        assert_eq!(coin_amount(-1_000_000_000_000_000, 1.0), -MAX_MONEY);
    }
}
