//! Decimal-string conversion for asset base units.
//!
//! ## Overview
//!
//! Engine state never leaves base units. These helpers exist only at the
//! human boundary (tests, logs, the demo binary) to convert between decimal
//! strings and [`Amount`] values for an asset with a known decimal count.
//!
//! ## Examples
//!
//! ```
//! use fundswap_core::types::units::{to_base_units, from_base_units};
//!
//! // 1.5 of an 18-decimal asset
//! assert_eq!(to_base_units("1.5", 18), Some(1_500_000_000_000_000_000));
//!
//! // 100 of a 6-decimal asset
//! assert_eq!(to_base_units("100", 6), Some(100_000_000));
//!
//! assert_eq!(from_base_units(1_500_000_000_000_000_000, 18), "1.5");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::types::Amount;

/// Parse a decimal string into base units for an asset with `decimals`.
///
/// Returns `None` for negative values, unparsable strings, fractional parts
/// finer than the asset supports, or values out of range.
pub fn to_base_units(s: &str, decimals: u32) -> Option<Amount> {
    let value = Decimal::from_str(s).ok()?;
    if value.is_sign_negative() {
        return None;
    }
    let factor = Decimal::from(10u64.checked_pow(decimals)?);
    let scaled = value.checked_mul(factor)?;
    if scaled.fract() != Decimal::ZERO {
        return None;
    }
    scaled.to_u128()
}

/// Render base units as a decimal string with trailing zeros trimmed.
///
/// Pure integer formatting, so any `u128` amount is representable.
pub fn from_base_units(amount: Amount, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let factor = 10u128.pow(decimals);
    let integer = amount / factor;
    let fraction = amount % factor;
    if fraction == 0 {
        return integer.to_string();
    }
    let digits = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", integer, digits.trim_end_matches('0'))
}

// ============================================================================
// Unit Tests
// ============================================================================
