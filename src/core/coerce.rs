//! Coercion of raw extracted values into typed target values
//!
//! Coercion is total: every input has a defined result. Values that cannot
//! be read as the field's kind become `None` (or a [`CoerceError`] from
//! [`try_coerce`] for callers that want to report why).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::core::schema::FieldKind;
use crate::core::value::PayloadExt;

/// A coerced target value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Money(f64),
    Count(i64),
    /// Serialized as `YYYY-MM-DD`
    Date(NaiveDate),
    Text(String),
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Money(v) => write!(f, "{}", v),
            TypedValue::Count(v) => write!(f, "{}", v),
            TypedValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TypedValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A non-blank raw value that could not be read as the field's kind
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot read '{raw}' as {kind}")]
pub struct CoerceError {
    pub kind: FieldKind,
    pub raw: String,
}

/// Coerce a raw value for the named target field
pub fn coerce(field: &str, raw: &Value) -> Option<TypedValue> {
    try_coerce(field, raw).ok().flatten()
}

/// Coerce a raw value, reporting unreadable input as an error
///
/// Null input is `Ok(None)`. Blank strings are `Ok(None)` except for text
/// fields, which keep the empty string.
pub fn try_coerce(field: &str, raw: &Value) -> Result<Option<TypedValue>, CoerceError> {
    let kind = FieldKind::of(field);
    if raw.is_null() || (kind != FieldKind::Text && raw.is_blank()) {
        return Ok(None);
    }

    let typed = match kind {
        FieldKind::Money => parse_money(raw).map(TypedValue::Money),
        FieldKind::Count => parse_count(raw).map(TypedValue::Count),
        FieldKind::Date => parse_date(raw).map(TypedValue::Date),
        FieldKind::Text => Some(TypedValue::Text(text_of(raw).trim().to_string())),
    };

    match typed {
        Some(value) => Ok(Some(value)),
        None => Err(CoerceError {
            kind,
            raw: text_of(raw),
        }),
    }
}

fn text_of(raw: &Value) -> String {
    raw.scalar_text().unwrap_or_else(|| raw.to_string())
}

/// Monetary amount
///
/// Accepts a leading currency symbol and thousands separators, then reads
/// the longest numeric prefix (`"12.50 USD"` is 12.5).
pub fn parse_money(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let s = s.trim();
            let (negative, s) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s),
            };
            let s = s.trim_start_matches(['$', '€', '£']).trim_start();
            let cleaned: String = s.chars().filter(|c| *c != ',').collect();
            let value = float_prefix(&cleaned)?;
            Some(if negative { -value } else { value })
        }
        _ => None,
    }
}

/// Whole-number count; fractional input is truncated
pub fn parse_count(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
                .map(|v| v.trunc() as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                .map(|(i, _)| i)
                .unwrap_or(s.len());
            s[..end].parse::<i64>().ok()
        }
        _ => None,
    }
}

/// Calendar date
///
/// Timestamps with an offset are converted to UTC before the date is taken.
/// Numbers are epoch milliseconds.
pub fn parse_date(raw: &Value) -> Option<NaiveDate> {
    match raw {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|v| v as i64))?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

/// Longest prefix that reads as a decimal number, like JavaScript's
/// `parseFloat`
fn float_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts if digits follow it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
