//! Lenient value coercion shared by the pipeline stages.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::input::Value;

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

static ISO_DATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());

static CURRENCY_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(kr\.?|nok|sek|dkk|eur|usd|[$€£]|,-$|\.-$)").unwrap());

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a value as a number, tolerating currency tokens, space thousand
/// separators and a decimal comma.
///
/// Returns `None` for booleans, nulls and anything that still fails to parse.
pub fn parse_lenient(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::String(s) => parse_lenient_str(s),
        _ => None,
    }
}

/// String half of [`parse_lenient`].
pub fn parse_lenient_str(raw: &str) -> Option<f64> {
    let stripped = CURRENCY_TOKENS.replace_all(raw.trim(), "");
    let mut cleaned: String = stripped
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}' && *c != '\'')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let has_dot = cleaned.contains('.');
    if commas > 0 && has_dot {
        // Whichever separator comes last is the decimal one.
        let last_comma = cleaned.rfind(',').unwrap_or(0);
        let last_dot = cleaned.rfind('.').unwrap_or(0);
        if last_comma > last_dot {
            cleaned = cleaned.replace('.', "").replace(',', ".");
        } else {
            cleaned = cleaned.replace(',', "");
        }
    } else if commas == 1 {
        cleaned = cleaned.replace(',', ".");
    } else if commas > 1 {
        cleaned = cleaned.replace(',', "");
    }

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Plain numeric parse used by filter and conditional comparisons.
///
/// Unparsable values are treated as 0.
pub fn to_number_or_zero(value: &Value) -> f64 {
    match value {
        Value::Number(n) if n.is_finite() => *n,
        Value::Bool(true) => 1.0,
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Strict numeric view: numbers, and strings that parse as plain numbers.
pub fn as_strict_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// `true`, `1` and `"1"` count as true.
pub fn is_true(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => *n == 1.0,
        Value::String(s) => s == "1",
        Value::Null => false,
    }
}

/// `false`, `0` and `"0"` count as false.
pub fn is_false(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !*b,
        Value::Number(n) => *n == 0.0,
        Value::String(s) => s == "0",
        Value::Null => false,
    }
}

/// Whether a string starts with `YYYY-MM-DD`.
pub fn looks_like_iso_date(raw: &str) -> bool {
    ISO_DATE_PREFIX.is_match(raw.trim())
}

/// Parse an ISO date or timestamp into its wall-clock time.
///
/// Offsets are kept as written: `2024-03-31T23:30:00+02:00` stays on the
/// 31st.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if !looks_like_iso_date(trimmed) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    // Fall back to the date prefix alone (e.g. "2024-01-05Z" or trailing text).
    trimmed
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Milliseconds since the Unix epoch for a date-like value, 0 if unparsable.
pub fn to_epoch_millis(value: &Value) -> i64 {
    match value {
        Value::String(s) => parse_timestamp(s)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or(0),
        _ => 0,
    }
}
