/// Routing budgets are expressed in parts per million of the payout.
pub const PARTS_PER_MILLION: u64 = 1_000_000;

/// Maximum routing fee in satoshis the platform will pay for a payout,
/// rounded down.
pub fn fee_limit_sat(amount_sat: u64, budget_ppm: u64) -> u64 {
    let limit = amount_sat as u128 * budget_ppm as u128 / PARTS_PER_MILLION as u128;
    u64::try_from(limit).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_limit() {
        assert_eq!(fee_limit_sat(100_000, 1_000), 100);
        assert_eq!(fee_limit_sat(100_000, 0), 0);
    }

    #[test]
    fn test_fee_limit_rounds_down() {
        assert_eq!(fee_limit_sat(999, 1_000), 0);
        assert_eq!(fee_limit_sat(1_999, 1_000), 1);
    }

    #[test]
    fn test_fee_limit_does_not_overflow() {
        assert_eq!(fee_limit_sat(u64::MAX, PARTS_PER_MILLION), u64::MAX);
    }
}
