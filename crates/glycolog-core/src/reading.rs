//! Glycemia readings as mirrored from the remote store.
//!
//! The store is loose about types: ids may be numbers or strings, values may
//! be text or numbers, and the `date` field comes in three encodings. This
//! module turns one raw listing item into a [`Reading`] with a single
//! timestamp representation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, ValidationError};

/// Below this value (mg/dL) a reading is hypoglycemic.
pub const LOW_THRESHOLD: f64 = 70.0;
/// Above this value (mg/dL) a reading is hyperglycemic.
pub const HIGH_THRESHOLD: f64 = 180.0;

/// Naive layouts tried after RFC 3339, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Presentation class of a reading value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Normal,
    High,
}

impl Severity {
    pub fn classify(value: f64) -> Self {
        if value < LOW_THRESHOLD {
            Severity::Low
        } else if value > HIGH_THRESHOLD {
            Severity::High
        } else {
            Severity::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Normal => "normal",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a reading was taken, or the raw date the store sent if it could not
/// be understood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadingTime {
    Valid { at: DateTime<Utc> },
    Invalid { raw: String },
}

impl ReadingTime {
    /// Normalize a raw `date` field.
    ///
    /// Tries the `{_seconds}` wrapper first, then a direct parse of the
    /// field (ISO-8601 text or epoch milliseconds). Never fails: an
    /// unreadable date becomes [`ReadingTime::Invalid`].
    pub fn normalize(raw: Option<&Value>) -> Self {
        let Some(raw) = raw else {
            return ReadingTime::Invalid { raw: String::new() };
        };

        if let Some(at) = from_seconds_wrapper(raw).or_else(|| parse_direct(raw)) {
            return ReadingTime::Valid { at };
        }

        let raw = match raw {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        ReadingTime::Invalid { raw }
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            ReadingTime::Valid { at } => Some(*at),
            ReadingTime::Invalid { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ReadingTime::Valid { .. })
    }
}

fn from_seconds_wrapper(raw: &Value) -> Option<DateTime<Utc>> {
    let secs = raw.get("_seconds")?.as_i64()?;
    let nanos = raw
        .get("_nanoseconds")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);
    DateTime::from_timestamp(secs, nanos)
}

fn parse_direct(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => parse_date_text(s.trim()),
        // A bare number is a native timestamp in milliseconds.
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })?;
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// The measured value, or the raw field the store sent if it is not a
/// finite number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadingValue {
    Valid { mg_dl: f64 },
    Invalid { raw: String },
}

impl ReadingValue {
    fn from_wire(raw: Option<&Value>) -> Self {
        match raw.and_then(wire_value) {
            Some(mg_dl) => ReadingValue::Valid { mg_dl },
            None => ReadingValue::Invalid {
                raw: match raw {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                },
            },
        }
    }

    pub fn mg_dl(&self) -> Option<f64> {
        match self {
            ReadingValue::Valid { mg_dl } => Some(*mg_dl),
            ReadingValue::Invalid { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ReadingValue::Valid { .. })
    }
}

/// One glycemia measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Assigned by the remote store.
    pub id: String,
    pub value: ReadingValue,
    pub note: Option<String>,
    pub timestamp: ReadingTime,
}

impl Reading {
    /// Decode one item of the store's listing.
    ///
    /// Only a missing id is an error: such an item cannot be addressed. An
    /// unreadable value or date is kept and flagged.
    pub fn from_wire(item: &Value) -> Result<Self, StoreError> {
        let id = match item.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(StoreError::Decode(format!("reading without id: {item}"))),
        };

        let note = item
            .get("note")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(Self {
            value: ReadingValue::from_wire(item.get("value")),
            timestamp: ReadingTime::normalize(item.get("date")),
            id,
            note,
        })
    }

    /// `None` when the value could not be read.
    pub fn severity(&self) -> Option<Severity> {
        self.value.mg_dl().map(Severity::classify)
    }
}

fn wire_value(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Normalize a user-typed value before it is sent to the store.
///
/// The input is trimmed and a decimal comma becomes a period. The result
/// must read as a finite number.
pub fn normalize_value_input(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::missing("value"));
    }

    let normalized = trimmed.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(normalized),
        _ => Err(ValidationError::invalid(
            "value",
            format!("'{trimmed}' is not a number"),
        )),
    }
}
