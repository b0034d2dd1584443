//! Lenient parsing of monetary amounts sent by clients.
//!
//! Amounts that are missing or cannot be read as a number are stored as zero
//! rather than rejected.
//!
//! Only JSON numbers and strings are read. Arrays are never unwrapped, so
//! `[5]` becomes zero rather than 5. `"Infinity"` is not a number here either,
//! and a string that overflows (`"1e999"`) becomes zero, so every stored
//! amount is finite.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Read an amount from an arbitrary JSON value, falling back to zero.
///
/// Numbers are used as-is. Strings are read up to the end of their leading
/// number, so `"12.5 NZD"` becomes 12.5. Anything else, including `null`,
/// booleans and non-finite results, becomes zero.
pub fn coerce_amount(value: &Value) -> f64 {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_leading_float(text),
        _ => None,
    };

    normalize_amount(amount.unwrap_or(0.0))
}

/// Replace non-finite values with zero and collapse negative zero.
pub fn normalize_amount(amount: f64) -> f64 {
    if amount.is_finite() && amount != 0.0 {
        amount
    } else {
        0.0
    }
}

/// A serde `deserialize_with` helper for amount fields.
///
/// Pair with `#[serde(default)]` so that absent fields also become zero.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    Ok(coerce_amount(&value))
}

/// Parse the longest prefix of `text` (after leading whitespace) that forms a
/// decimal number with an optional sign, fraction and exponent.
fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let count_digits = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count()
    };

    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let integer_digits = count_digits(end);
    end += integer_digits;
    let mut mantissa_digits = integer_digits;

    if bytes.get(end) == Some(&b'.') {
        let fraction_digits = count_digits(end + 1);
        mantissa_digits += fraction_digits;

        if mantissa_digits > 0 {
            end += 1 + fraction_digits;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;

        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }

        let exponent_digits = count_digits(exponent_end);

        // A dangling `e` is not part of the number.
        if exponent_digits > 0 {
            end = exponent_end + exponent_digits;
        }
    }

    text[..end].parse().ok()
}
