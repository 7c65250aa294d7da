//! Lenient numeric fields.
//!
//! Project records arrive from stores and forms that do not always hold
//! numbers where numbers belong: quantities typed as strings, `null` prices,
//! missing fields. Every numeric field of the data model deserializes through
//! [`lenient_f64`], which never fails and coerces anything unusable to `0`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a number leniently.
///
/// Accepts JSON numbers, numeric strings (surrounding whitespace ignored),
/// `null`, and any other value. Anything that is not a finite number becomes
/// `0.0`.
///
/// # Errors
///
/// Only propagates errors from the underlying deserializer itself; the value
/// shape never causes an error.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(0.0, coerce_value))
}

/// Coerce an arbitrary JSON value to a finite `f64`, defaulting to `0.0`.
#[must_use]
pub fn coerce_value(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.map_or(0.0, finite_or_zero)
}

/// Replace NaN and infinities with `0.0`.
#[must_use]
pub const fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Contracted quantities and unit prices are non-negative; anything else is
/// treated as zero.
#[must_use]
pub fn non_negative(value: f64) -> f64 {
    let value = finite_or_zero(value);
    if value > 0.0 { value } else { 0.0 }
}

/// Relative slack, scaled by the contract quantity, below which two
/// quantities count as equal when checking what an item has left.
pub const QUANTITY_TOLERANCE: f64 = 1e-9;

/// Decimal places used when quantities are shown to an operator.
pub const QUANTITY_DECIMALS: usize = 6;

/// Returns `true` if `quantity` is more than `left` by a margin the
/// tolerance does not absorb. Residue from summing decimal quantities, such
/// as `3.3 - (1.1 + 1.1)`, does not count.
#[must_use]
pub fn exceeds(quantity: f64, left: f64, contract: f64) -> bool {
    quantity - left > QUANTITY_TOLERANCE * contract.abs().max(1.0)
}

/// Largest amount `<= wanted` such that `used + amount <= cap` holds when
/// evaluated in `f64`, the way cumulative sums are evaluated.
#[must_use]
pub fn fit_under(used: f64, wanted: f64, cap: f64) -> f64 {
    let mut amount = wanted.min(cap - used);
    while amount > 0.0 && used + amount > cap {
        amount = f64::from_bits(amount.to_bits() - 1);
    }
    amount.max(0.0)
}

/// Render a quantity at [`QUANTITY_DECIMALS`] places without trailing zeros.
#[must_use]
pub fn format_quantity(value: f64) -> String {
    let fixed = format!("{value:.prec$}", prec = QUANTITY_DECIMALS);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "lenient_f64")]
        value: f64,
    }

    fn parse(json: &str) -> f64 {
        serde_json::from_str::<Row>(json).expect("lenient parse").value
    }

    #[test]
    fn accepts_plain_numbers() {
        assert!((parse(r#"{"value": 12.5}"#) - 12.5).abs() < f64::EPSILON);
        assert!((parse(r#"{"value": 3}"#) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn accepts_numeric_strings() {
        assert!((parse(r#"{"value": " 42.25 "}"#) - 42.25).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_values_coerce_to_zero() {
        assert!(parse(r#"{"value": "abc"}"#).abs() < f64::EPSILON);
        assert!(parse(r#"{"value": null}"#).abs() < f64::EPSILON);
        assert!(parse(r#"{"value": [1, 2]}"#).abs() < f64::EPSILON);
        assert!(parse(r#"{"value": true}"#).abs() < f64::EPSILON);
        assert!(parse("{}").abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_strings_coerce_to_zero() {
        assert!(parse(r#"{"value": "NaN"}"#).abs() < f64::EPSILON);
        assert!(parse(r#"{"value": "inf"}"#).abs() < f64::EPSILON);
    }

    #[test]
    fn non_negative_clamps() {
        assert!(non_negative(-4.0).abs() < f64::EPSILON);
        assert!(non_negative(f64::NAN).abs() < f64::EPSILON);
        assert!((non_negative(7.0) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summing_residue_does_not_exceed() {
        let left = 3.3 - (1.1 + 1.1);
        assert!(left < 1.1);
        assert!(!exceeds(1.1, left, 3.3));
        assert!(!exceeds(5.07, 5.1 - (0.01 + 0.02), 5.1));
        assert!(exceeds(1.11, left, 3.3));
        assert!(exceeds(0.001, 0.0, 1.0));
    }

    #[test]
    fn fit_under_keeps_the_sum_within_cap() {
        let used = 1.1 + 1.1;
        let amount = fit_under(used, 1.1, 3.3);
        assert!(used + amount <= 3.3);
        assert!((amount - 1.1).abs() < 1e-12);

        let cap = 1.0 + 3.0 / 7.0;
        let used = 0.3;
        assert!(used + fit_under(used, 1e6, cap) <= cap);

        assert!(fit_under(5.0, 2.0, 5.0).abs() < f64::EPSILON);
        assert!((fit_under(60.0, 40.0, 100.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn quantities_render_without_float_noise() {
        assert_eq!(format_quantity(3.3 - (1.1 + 1.1)), "1.1");
        assert_eq!(format_quantity(60.0), "60");
        assert_eq!(format_quantity(0.125), "0.125");
        assert_eq!(format_quantity(-0.000_000_01), "0");
    }
}
