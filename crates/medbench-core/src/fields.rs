//! Lenient field readers over raw JSON objects.
//!
//! Missing or null fields read as `None`. Defective values (non-numeric,
//! negative, out of range) are reported as `MalformedRecord` warnings and
//! then defaulted or clamped, so one bad field never aborts a document.

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::LeaderboardError;

pub(crate) type Object = Map<String, Value>;

fn malformed(field: &str, reason: String) {
    let defect = LeaderboardError::MalformedRecord {
        field: field.to_string(),
        reason,
    };
    warn!(event = "record.malformed_field", field = %field, error = %defect);
}

fn present<'a>(obj: &'a Object, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Read a non-negative integer count. Negative values clamp to `0`;
/// fractional values round to the nearest integer.
pub(crate) fn count(obj: &Object, key: &str) -> Option<u64> {
    let value = present(obj, key)?;
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(n) if n < 0.0 => {
            malformed(key, format!("negative count {n}"));
            Some(0)
        }
        Some(n) => {
            if n.fract() != 0.0 {
                malformed(key, format!("fractional count {n}"));
            }
            Some(n.round() as u64)
        }
        None => {
            malformed(key, format!("expected a number, got {value}"));
            None
        }
    }
}

/// Read a count that only counts as present when strictly positive.
pub(crate) fn positive_count(obj: &Object, key: &str) -> Option<u64> {
    count(obj, key).filter(|n| *n > 0)
}

/// Read a rate, clamped into `0.0..=1.0`.
pub(crate) fn rate(obj: &Object, key: &str) -> Option<f64> {
    let value = present(obj, key)?;
    match value.as_f64() {
        Some(n) if n.is_nan() => {
            malformed(key, "NaN rate".to_string());
            None
        }
        Some(n) if !(0.0..=1.0).contains(&n) => {
            malformed(key, format!("rate {n} outside [0, 1]"));
            Some(n.clamp(0.0, 1.0))
        }
        Some(n) => Some(n),
        None => {
            malformed(key, format!("expected a number, got {value}"));
            None
        }
    }
}

/// Read a non-negative number with no upper bound (durations).
pub(crate) fn number(obj: &Object, key: &str) -> Option<f64> {
    let value = present(obj, key)?;
    match value.as_f64() {
        Some(n) if n < 0.0 => {
            malformed(key, format!("negative value {n}"));
            Some(0.0)
        }
        Some(n) => Some(n),
        None => {
            malformed(key, format!("expected a number, got {value}"));
            None
        }
    }
}

/// Read a non-empty string.
pub(crate) fn text<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    present(obj, key)?.as_str().filter(|s| !s.is_empty())
}

/// Read a nested object.
pub(crate) fn object<'a>(obj: &'a Object, key: &str) -> Option<&'a Object> {
    present(obj, key)?.as_object()
}

/// Truthiness in the sense evaluation producers use it: null, `false`, zero,
/// empty strings and empty containers are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
