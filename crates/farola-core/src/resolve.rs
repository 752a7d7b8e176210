// ── Field resolution over untyped records ──
//
// Controllers in the field run several firmware generations and reach us
// through more than one ingestion path, so the same reading can live under
// different names and nesting depths. Every canonical field is resolved
// from an ordered list of candidate paths.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Window within which a last-seen timestamp counts as "online".
pub const DEFAULT_RECENCY_WINDOW: Duration = Duration::from_millis(300_000);

// ── Lookup ──────────────────────────────────────────────────────────

/// Walk a dotted path (`"sensores.luz.valor"`) through nested objects.
///
/// Numeric segments index into arrays. `null` is treated the same as a
/// missing key: both yield `None`.
pub fn lookup<'a>(raw: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = raw;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!current.is_null()).then_some(current)
}

/// The value at the first candidate path that is present.
pub fn first_present<'a>(raw: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| lookup(raw, path))
}

// ── Scalar modes ────────────────────────────────────────────────────

/// Numeric resolution: the first present candidate, coerced.
///
/// Only the first present candidate is considered. If it cannot be read
/// as a finite number the default is returned, later candidates are not
/// consulted.
pub fn number(raw: &Value, paths: &[&str], default: f64) -> f64 {
    first_present(raw, paths)
        .and_then(coerce_number)
        .unwrap_or(default)
}

/// String resolution: the first present, non-empty candidate.
pub fn text(raw: &Value, paths: &[&str], default: &str) -> String {
    paths
        .iter()
        .filter_map(|path| lookup(raw, path))
        .find_map(coerce_text)
        .unwrap_or_else(|| default.to_owned())
}

/// `true` when any candidate is present and reads as boolean false.
pub fn explicitly_false(raw: &Value, paths: &[&str]) -> bool {
    paths
        .iter()
        .filter_map(|path| lookup(raw, path))
        .any(|v| coerce_bool(v) == Some(false))
}

// ── Boolean-OR mode ─────────────────────────────────────────────────

/// One weak indication that a boolean property holds.
#[derive(Debug, Clone, Copy)]
pub enum Signal<'a> {
    /// The path holds a truthy boolean-like value.
    Flag(&'a str),
    /// The path holds a string equal (case-insensitively) to the literal.
    Equals(&'a str, &'a str),
    /// The path holds a timestamp no older than the window.
    Recent(&'a str, Duration),
    /// A condition already computed by the caller.
    Derived(bool),
}

impl Signal<'_> {
    fn holds(&self, raw: &Value, now: DateTime<Utc>) -> bool {
        match *self {
            Self::Flag(path) => lookup(raw, path).and_then(coerce_bool) == Some(true),
            Self::Equals(path, expected) => lookup(raw, path)
                .and_then(Value::as_str)
                .is_some_and(|s| s.trim().eq_ignore_ascii_case(expected)),
            Self::Recent(path, window) => lookup(raw, path)
                .and_then(timestamp)
                .is_some_and(|seen| is_recent(seen, now, window)),
            Self::Derived(holds) => holds,
        }
    }
}

/// Boolean-OR resolution.
///
/// Every signal is an independent test; the result is their disjunction.
/// Order carries no meaning.
pub fn any(raw: &Value, signals: &[Signal<'_>], now: DateTime<Utc>) -> bool {
    signals.iter().any(|s| s.holds(raw, now))
}

// ── Coercions ───────────────────────────────────────────────────────

pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub(crate) fn coerce_text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

pub(crate) fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "on" | "si" | "sí" | "yes" => Some(true),
            "false" | "0" | "off" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

// ── Timestamps ──────────────────────────────────────────────────────

/// Decode a timestamp in any of the shapes the ingestion paths produce:
/// RFC 3339 strings, epoch milliseconds (number or numeric string), or a
/// document-store timestamp object with `seconds`/`nanoseconds`.
pub fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis))
        }
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(float_millis))
            .and_then(DateTime::from_timestamp_millis),
        Value::Object(map) => {
            let secs = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            DateTime::from_timestamp(secs, nanos)
        }
        _ => None,
    }
}

/// Whole milliseconds from a float epoch value, if it fits in `i64`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_millis(ms: f64) -> Option<i64> {
    let ms = ms.round();
    (ms.is_finite() && ms >= i64::MIN as f64 && ms < i64::MAX as f64).then_some(ms as i64)
}

/// Future instants (clock skew on the controller) count as recent.
fn is_recent(seen: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    let Ok(window) = chrono::Duration::from_std(window) else {
        return true;
    };
    now.signed_duration_since(seen) <= window
}
