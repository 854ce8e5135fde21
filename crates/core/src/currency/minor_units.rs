//! Conversion between human decimal amounts and integer minor units.
//!
//! CRITICAL: Never use floating-point for money.
//! - Parsing and scaling go through `rust_decimal::Decimal`, so `12.34` is exact
//! - Stored values are `i64` counts of the currency's smallest unit
//! - Rendering uses banker's rounding (round half to even) to the currency's exponent

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

/// Largest exponent whose scale factor (10^exponent) fits in an `i64`.
pub const MAX_EXPONENT: u32 = 18;

/// Errors produced by amount conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Text is not a plain non-negative decimal with at most `exponent` fractional digits.
    #[error("Malformed amount: {0:?}")]
    Malformed(String),

    /// Amount is zero.
    #[error("Amount must be positive")]
    NonPositive,

    /// Scaled amount does not fit in an `i64`.
    #[error("Amount is too large")]
    Overflow,

    /// Exponent cannot be represented with `i64` minor units.
    #[error("Currency exponent {0} exceeds the supported maximum of {MAX_EXPONENT}")]
    UnsupportedExponent(u32),
}

/// Converts decimal text into minor units.
///
/// Accepts `.` or `,` as the decimal separator and ignores surrounding
/// whitespace. The amount must be strictly positive and carry no more than
/// `exponent` fractional digits, so the result is always exact.
///
/// ```
/// use coffer_core::currency::to_minor_units;
///
/// assert_eq!(to_minor_units("12,34", 2), Ok(1234));
/// assert!(to_minor_units("12.345", 2).is_err());
/// ```
pub fn to_minor_units(text: &str, exponent: u32) -> Result<i64, AmountError> {
    check_exponent(exponent)?;

    let trimmed = text.trim();
    let normalized = normalize(trimmed, exponent)?;

    // The shape is already validated, so the only way left to fail is a
    // mantissa wider than Decimal's 96 bits.
    let amount = Decimal::from_str_exact(&normalized).map_err(|_| AmountError::Overflow)?;
    if amount.is_zero() {
        return Err(AmountError::NonPositive);
    }

    amount
        .checked_mul(scale_factor(exponent))
        .and_then(|scaled| scaled.trunc().to_i64())
        .ok_or(AmountError::Overflow)
}

/// Renders minor units as decimal text with exactly `exponent` fractional digits.
///
/// ```
/// use coffer_core::currency::from_minor_units;
///
/// assert_eq!(from_minor_units(1234, 2).unwrap(), "12.34");
/// assert_eq!(from_minor_units(0, 2).unwrap(), "0.00");
/// ```
pub fn from_minor_units(minor: i64, exponent: u32) -> Result<String, AmountError> {
    check_exponent(exponent)?;

    let value = Decimal::from(minor) / scale_factor(exponent);
    let mut rounded = value.round_dp_with_strategy(exponent, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(exponent);
    Ok(rounded.to_string())
}

fn check_exponent(exponent: u32) -> Result<(), AmountError> {
    if exponent > MAX_EXPONENT {
        return Err(AmountError::UnsupportedExponent(exponent));
    }
    Ok(())
}

fn scale_factor(exponent: u32) -> Decimal {
    Decimal::from(10_i64.pow(exponent))
}

/// Validates `digits[(.|,)digits]` and rewrites the separator to `.`.
fn normalize(text: &str, exponent: u32) -> Result<String, AmountError> {
    let malformed = || AmountError::Malformed(text.to_string());

    let (whole, fraction) = match text.find(['.', ',']) {
        Some(pos) => (&text[..pos], Some(&text[pos + 1..])),
        None => (text, None),
    };

    if !is_digits(whole) {
        return Err(malformed());
    }

    match fraction {
        None => Ok(whole.to_string()),
        Some(fraction) if is_digits(fraction) && fraction.len() <= exponent as usize => {
            Ok(format!("{whole}.{fraction}"))
        }
        Some(_) => Err(malformed()),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
