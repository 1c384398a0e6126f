// 🔢 Numeric Coercion - one rule for every loosely-typed input
//
// Vehicles and pricing arrive from form fields, CSV cells and JSON written by
// different clients. Numbers can be real numbers, strings with a comma decimal
// separator ("18,5"), strings with thousands spacing ("249 900") or garbage.
// Every numeric field in the crate goes through `to_num`, so a bad value
// degrades to the field's default instead of producing NaN.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a human-entered number.
///
/// Strips ordinary and non-breaking spaces, accepts `,` as decimal separator.
/// Returns `None` for empty, unparseable or non-finite input.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00A0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Coerce a JSON value to a finite number, falling back to `default`.
pub fn to_num(value: &Value, default: f64) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()).unwrap_or(default),
        Value::String(s) => parse_number(s).unwrap_or(default),
        _ => default,
    }
}

/// Like [`to_num`] but distinguishes "not provided" from "provided".
///
/// `null` and blank strings count as not provided. Anything else is provided
/// and coerces to a number, with unparseable input becoming 0.
pub fn to_opt_num(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(to_num(other, 0.0)),
    }
}

/// Clamp a number to be non-negative (NaN becomes 0).
pub fn non_negative(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        0.0
    } else {
        x
    }
}

/// Round to whole currency units (half away from zero).
pub fn round_currency(x: f64) -> f64 {
    let r = x.round();
    if r == 0.0 {
        0.0 // normalise -0.0
    } else {
        r
    }
}

// ============================================================================
// SERDE HELPERS
// Used with #[serde(deserialize_with = "...")] on record fields
// ============================================================================

/// Deserialize any value into a finite `f64`, defaulting to 0.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let n = match &raw {
        Value::Null => 0.0,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => parse_number(s).unwrap_or_else(|| {
            tracing::debug!(raw = %s, "non-numeric input coerced to 0");
            0.0
        }),
        Value::Number(_) => to_num(&raw, 0.0),
        other => {
            tracing::debug!(raw = %other, "non-numeric input coerced to 0");
            0.0
        }
    };
    Ok(n)
}

/// Deserialize any value into `Option<f64>` (see [`to_opt_num`]).
pub fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(to_opt_num(&raw))
}

/// Plausible model years; anything outside is treated as a typo
pub const MODEL_YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2200;

/// Deserialize a model year. Unparseable or implausible years become `None`.
pub fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let year = match &raw {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    };
    Ok(year
        .map(|y| y.round() as i32)
        .filter(|y| MODEL_YEAR_RANGE.contains(y)))
}

/// Deserialize a required text field. Numbers keep their text; null and
/// anything else become an empty string.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Deserialize an optional free-text field; blank strings become `None`.
pub fn lenient_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
