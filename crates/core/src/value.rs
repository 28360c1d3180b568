//! Comparable field values
//!
//! Row fields are read into a closed set of value kinds so that filtering and
//! sorting can dispatch on the kind explicitly instead of guessing at runtime.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date-time layouts recognized in text fields, tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tag for the kind of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    Temporal,
    Text,
}

/// A single field value read from a row
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing or `null` field
    Null,
    Bool(bool),
    Number(f64),
    /// A point in time, keeping the text it was read from for display
    Temporal { at: DateTime<Utc>, text: String },
    Text(String),
}

impl Value {
    /// Build a temporal value from a timestamp, displayed as RFC 3339
    pub fn temporal(at: DateTime<Utc>) -> Self {
        Value::Temporal {
            at,
            text: at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Classify a text field, promoting date and timestamp strings to `Temporal`
    pub fn from_text(text: &str) -> Self {
        match parse_temporal(text) {
            Some(at) => Value::Temporal {
                at,
                text: text.to_string(),
            },
            None => Value::Text(text.to_string()),
        }
    }

    /// Classify a JSON value
    ///
    /// Arrays and objects have no natural ordering and are kept as their
    /// compact JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::from_text(s),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::Temporal { .. } => ValueKind::Temporal,
            Value::Text(_) => ValueKind::Text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Stringify the value the way it is searched, matched and shown
    ///
    /// `Null` becomes the empty string. Integral numbers drop the fractional part.
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Temporal { text, .. } => text.clone(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::temporal(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Parse date and timestamp strings into UTC instants
///
/// Date-only values are anchored at midnight UTC.
pub fn parse_temporal(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    // Every recognized layout starts with a `YYYY-` year.
    let bytes = text.as_bytes();
    if bytes.len() < 10 || !bytes[..4].iter().all(u8::is_ascii_digit) || bytes[4] != b'-' {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
