//! Property-based tests for minor-unit conversion.
//!
//! - Round trip: rendering then parsing minor units is the identity
//! - Decimal round trip: parsing then rendering preserves the numeric value
//! - Separator independence: `,` and `.` parse identically

use std::str::FromStr;

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::minor_units::{MAX_EXPONENT, from_minor_units, to_minor_units};

/// Strategy for currency exponents the converter supports.
fn exponent() -> impl Strategy<Value = u32> {
    0u32..=MAX_EXPONENT
}

/// Strategy for a positive decimal written with at most `exponent` fractional digits.
fn amount_with_exponent() -> impl Strategy<Value = (Decimal, u32)> {
    (0u32..=6).prop_flat_map(|exp| {
        (0u32..=exp, 1i64..1_000_000_000_000i64)
            .prop_map(move |(scale, mantissa)| (Decimal::new(mantissa, scale), exp))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// *For any* positive minor amount, rendering and re-parsing returns it unchanged.
    #[test]
    fn prop_minor_units_round_trip(minor in 1i64..=i64::MAX, exp in exponent()) {
        let text = from_minor_units(minor, exp).unwrap();
        prop_assert_eq!(to_minor_units(&text, exp).unwrap(), minor);
    }

    /// *For any* amount with at most `e` fractional digits, the value survives a round trip.
    #[test]
    fn prop_decimal_round_trip((amount, exp) in amount_with_exponent()) {
        let minor = to_minor_units(&amount.to_string(), exp).unwrap();
        let rendered = from_minor_units(minor, exp).unwrap();
        prop_assert_eq!(Decimal::from_str(&rendered).unwrap(), amount);
    }

    /// Rendered text always carries exactly `exponent` fractional digits.
    #[test]
    fn prop_rendered_scale_matches_exponent(minor in 0i64..=i64::MAX, exp in exponent()) {
        let text = from_minor_units(minor, exp).unwrap();
        let fraction_len = text.split_once('.').map_or(0, |(_, f)| f.len());
        prop_assert_eq!(fraction_len, exp as usize);
    }

    /// Comma and dot separators are interchangeable.
    #[test]
    fn prop_comma_equals_dot((amount, exp) in amount_with_exponent()) {
        let dotted = amount.to_string();
        let comma = dotted.replace('.', ",");
        prop_assert_eq!(to_minor_units(&comma, exp), to_minor_units(&dotted, exp));
    }

    /// More fractional digits than the exponent allows is never accepted.
    #[test]
    fn prop_excess_precision_rejected(whole in 0u32..100_000, exp in 0u32..=6) {
        let text = format!("{whole}.{}", "1".repeat(exp as usize + 1));
        prop_assert!(to_minor_units(&text, exp).is_err());
    }
}
