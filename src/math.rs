//! Fixed-point arithmetic primitives.
//!
//! ## Overview
//!
//! All amounts in the engine are raw `u128` base units (an asset with 18
//! decimals stores `1.0` as `10^18`). Every proportional computation goes
//! through [`mul_div`] so the rounding policy lives in exactly one place.
//!
//! ## Rounding Policy
//!
//! [`mul_div`] truncates toward zero. Reward-per-token and fee amounts are
//! always computed with it, which biases sub-unit remainders in favor of the
//! pool: a user may receive up to one base unit less than the ideal
//! continuous value, never more. The single deliberate exception is
//! [`mul_div_ceil`], used for the amount a filler must pay on an
//! exact-output fill.
//!
//! ## Why No Floating Point?
//!
//! Floating-point arithmetic can produce different results on different
//! hardware, breaking determinism. Integer fixed-point ensures identical
//! results everywhere.

use crate::error::{Error, Result};
use crate::types::Amount;

/// Scaling factor for reward-per-token accumulators: 10^18
///
/// Chosen so that one base unit of stake earns with 18 decimal places of
/// sub-unit precision.
pub const WAD: Amount = 1_000_000_000_000_000_000;

/// Basis-point denominator (10000 bps = 1.0x / 100%)
pub const BPS_DENOMINATOR: Amount = 10_000;

/// Highest fee the exchange accepts, in basis points
pub const MAX_FEE_BPS: u32 = 10_000;

/// Compute `a * b / denominator`, flooring the quotient.
///
/// # Errors
///
/// * [`Error::DivisionByZero`] - `denominator` is 0
/// * [`Error::ArithmeticOverflow`] - `a * b` exceeds 128 bits
///
/// # Example
///
/// ```
/// use fundswap_core::math::mul_div;
///
/// // 100e18 * 10200 / 10000 = 102e18
/// let weighted = mul_div(100_000_000_000_000_000_000, 10_200, 10_000).unwrap();
/// assert_eq!(weighted, 102_000_000_000_000_000_000);
/// ```
pub fn mul_div(a: Amount, b: Amount, denominator: Amount) -> Result<Amount> {
    if denominator == 0 {
        return Err(Error::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(Error::ArithmeticOverflow)?;
    Ok(product / denominator)
}

/// Compute `a * b / denominator`, rounding the quotient up.
///
/// Used where the payer must never underpay (exact-output fills).
///
/// # Errors
///
/// Same conditions as [`mul_div`].
pub fn mul_div_ceil(a: Amount, b: Amount, denominator: Amount) -> Result<Amount> {
    if denominator == 0 {
        return Err(Error::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(Error::ArithmeticOverflow)?;
    let floored = product / denominator;
    if product % denominator == 0 {
        Ok(floored)
    } else {
        floored.checked_add(1).ok_or(Error::ArithmeticOverflow)
    }
}

/// Rescale an amount between assets with different decimal counts.
///
/// Multiplies by `10^(to - from)` when scaling up, divides (flooring) when
/// scaling down. `scale_convert(x, d, d)` is the identity.
///
/// # Example
///
/// ```
/// use fundswap_core::math::scale_convert;
///
/// // 1.5 tokens from 18 decimals to 6 decimals
/// assert_eq!(
///     scale_convert(1_500_000_000_000_000_000, 18, 6).unwrap(),
///     1_500_000,
/// );
/// ```
pub fn scale_convert(amount: Amount, from_decimals: u32, to_decimals: u32) -> Result<Amount> {
    if from_decimals == to_decimals {
        return Ok(amount);
    }
    if to_decimals > from_decimals {
        let factor = pow10(to_decimals - from_decimals)?;
        amount.checked_mul(factor).ok_or(Error::ArithmeticOverflow)
    } else {
        let factor = pow10(from_decimals - to_decimals)?;
        Ok(amount / factor)
    }
}

/// `10^exp` as an [`Amount`], failing on overflow
pub fn pow10(exp: u32) -> Result<Amount> {
    10u128.checked_pow(exp).ok_or(Error::ArithmeticOverflow)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_floors() {
        // 10 * 10 / 3 = 33.33.. -> 33
        assert_eq!(mul_div(10, 10, 3).unwrap(), 33);
        assert_eq!(mul_div(0, 10, 3).unwrap(), 0);
    }

    #[test]
    fn test_mul_div_exact() {
        assert_eq!(mul_div(6, 7, 21).unwrap(), 2);
    }

    #[test]
    fn test_mul_div_division_by_zero() {
        assert_eq!(mul_div(1, 1, 0), Err(Error::DivisionByZero));
        assert_eq!(mul_div_ceil(1, 1, 0), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_mul_div_overflow() {
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(Error::ArithmeticOverflow));
    }

    #[test]
    fn test_mul_div_ceil_rounds_up() {
        assert_eq!(mul_div_ceil(10, 10, 3).unwrap(), 34);
        // exact quotients are not bumped
        assert_eq!(mul_div_ceil(10, 9, 3).unwrap(), 30);
    }

    #[test]
    fn test_mul_div_ceil_at_most_one_above_floor() {
        for a in [1u128, 7, 999, 1_000_000_000_000_000_001] {
            for d in [3u128, 7, 10_000] {
                let lo = mul_div(a, 13, d).unwrap();
                let hi = mul_div_ceil(a, 13, d).unwrap();
                assert!(hi == lo || hi == lo + 1);
            }
        }
    }

    #[test]
    fn test_weighted_amount_modifier() {
        // 100e18 at 10200 bps = 102e18 exactly
        let principal: Amount = 100 * WAD;
        let weighted = mul_div(principal, 10_200, BPS_DENOMINATOR).unwrap();
        assert_eq!(weighted, 102 * WAD);
    }

    #[test]
    fn test_scale_convert_up_down() {
        assert_eq!(scale_convert(1_000_000, 6, 18).unwrap(), WAD);
        assert_eq!(scale_convert(WAD, 18, 6).unwrap(), 1_000_000);
        assert_eq!(scale_convert(123, 6, 6).unwrap(), 123);
    }

    #[test]
    fn test_scale_convert_floors_downward() {
        // 1.0000019 in 7 decimals -> 1.000001 in 6 decimals
        assert_eq!(scale_convert(10_000_019, 7, 6).unwrap(), 1_000_001);
    }

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0).unwrap(), 1);
        assert_eq!(pow10(18).unwrap(), WAD);
        assert!(pow10(40).is_err());
    }
}
