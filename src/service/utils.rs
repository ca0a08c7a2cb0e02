//! U256 arithmetic helpers and human-readable balance formatting for the
//! flow reports.

use std::str::FromStr;

use alloy::primitives::{U256, U512};
use rust_decimal::Decimal;

use super::ServiceResult;
use super::error::OrchestratorError;

/// `floor(a * b / denominator)` with a 512-bit intermediate, so the product
/// cannot overflow. Errors on a zero denominator or a result that does not
/// fit back into 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> ServiceResult<U256> {
    if denominator.is_zero() {
        return Err(OrchestratorError::InvalidTradeParameters(
            "division by zero in quote math".to_string(),
        ));
    }

    let product = U512::from(a) * U512::from(b);
    let quotient = product / U512::from(denominator);

    let limbs = quotient.as_limbs();
    if limbs[4..].iter().any(|l| *l != 0) {
        return Err(OrchestratorError::InvalidTradeParameters(
            "quote math overflowed 256 bits".to_string(),
        ));
    }

    let mut low = [0u64; 4];
    low.copy_from_slice(&limbs[..4]);
    Ok(U256::from_limbs(low))
}

/// Converts a raw token amount to a `Decimal` scaled by the token's
/// decimals, for logging only. Amounts beyond Decimal's 96-bit mantissa,
/// or a decimals value past Decimal's supported scale, fall back to the
/// raw integer string.
pub fn u256_to_decimal(value: U256, decimals: u8) -> Option<Decimal> {
    let mut decimal = Decimal::from_str(&value.to_string()).ok()?;
    decimal.set_scale(decimals as u32).ok()?;
    Some(decimal.normalize())
}

/// Formats a raw balance as a human-readable decimal string.
pub fn format_balance(balance: U256, decimals: u8) -> String {
    match u256_to_decimal(balance, decimals) {
        Some(d) => d.to_string(),
        None => balance.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_basic() {
        let result = mul_div(U256::from(1000u64), U256::from(9950u64), U256::from(10000u64))
            .expect("should divide");
        assert_eq!(result, U256::from(995u64));
    }

    #[test]
    fn test_mul_div_floor_rounding() {
        // 7 * 3 / 2 = 10.5 -> 10
        let result =
            mul_div(U256::from(7u64), U256::from(3u64), U256::from(2u64)).expect("should divide");
        assert_eq!(result, U256::from(10u64));
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // a * b overflows U256 but the quotient fits.
        let a = U256::MAX;
        let b = U256::from(10u64);
        let result = mul_div(a, b, U256::from(20u64)).expect("should divide");
        assert_eq!(result, U256::MAX / U256::from(2u64));
    }

    #[test]
    fn test_mul_div_zero_denominator_fails() {
        let result = mul_div(U256::from(1u64), U256::from(1u64), U256::ZERO);
        assert!(matches!(
            result,
            Err(OrchestratorError::InvalidTradeParameters(_))
        ));
    }

    #[test]
    fn test_mul_div_overflow_fails() {
        let result = mul_div(U256::MAX, U256::MAX, U256::from(1u64));
        assert!(matches!(
            result,
            Err(OrchestratorError::InvalidTradeParameters(_))
        ));
    }

    #[test]
    fn test_format_balance_eth() {
        let wei = U256::from_str("1500000000000000000").unwrap();
        assert_eq!(format_balance(wei, 18), "1.5");
    }

    #[test]
    fn test_format_balance_usdc() {
        let raw = U256::from(1000500000u64);
        assert_eq!(format_balance(raw, 6), "1000.5");
    }

    #[test]
    fn test_format_balance_high_decimals() {
        // Tokens reporting decimals past u64's 10^19 range must not panic.
        let raw = U256::from_str("500000000000000000000").unwrap();
        assert_eq!(format_balance(raw, 20), "5");
    }

    #[test]
    fn test_format_balance_decimals_beyond_scale_falls_back_to_raw() {
        let raw = U256::from(1500u64);
        assert_eq!(format_balance(raw, 30), "1500");
    }

    #[test]
    fn test_format_balance_whole_number() {
        let wei = U256::from_str("1000000000000000000").unwrap();
        assert_eq!(format_balance(wei, 18), "1");
    }
}
