//! Replica-side validation and normalization
//!
//! Every message received from the broker channel passes through
//! [`normalize`] before it is written to the local store. The routine accepts
//! either the full snapshot payload (nested `current` block) or an already
//! normalized flat record, so re-running it on its own output is a no-op.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Canonical timestamp layout used in the local store
pub const CANONICAL_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Hard and soft bounds for normalized fields
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);
pub const TEMPERATURE_RANGE: (f64, f64) = (-100.0, 100.0);
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);

/// Validation failure for an inbound message
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("type mismatch for field: {0}")]
    TypeMismatch(&'static str),

    #[error("value out of range for field: {0}")]
    OutOfRange(&'static str),
}

/// Flat, validated record the replica persists locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub weather: String,
    pub recorded_at: String,
}

/// Validate and normalize one decoded message
///
/// Hard constraints (missing fields, non-coercible types, coordinates out of
/// range) reject the record. Soft constraints (temperature/humidity outside
/// their plausible ranges) log a warning and accept.
pub fn normalize(raw: &Value) -> Result<NormalizedRecord, ValidationError> {
    let city = required_string(raw, "city", None)?;
    let latitude = required_number(raw, "latitude", None)?;
    let longitude = required_number(raw, "longitude", None)?;
    let temperature = required_number(raw, "temperature", Some("temperature"))?;
    let humidity = required_number(raw, "humidity", Some("humidity"))?;
    let weather = required_string(raw, "weather", Some("condition_description"))?;
    let recorded_at = required_timestamp(raw)?;

    if latitude < LATITUDE_RANGE.0 || latitude > LATITUDE_RANGE.1 {
        return Err(ValidationError::OutOfRange("latitude"));
    }
    if longitude < LONGITUDE_RANGE.0 || longitude > LONGITUDE_RANGE.1 {
        return Err(ValidationError::OutOfRange("longitude"));
    }
    if temperature < TEMPERATURE_RANGE.0 || temperature > TEMPERATURE_RANGE.1 {
        tracing::warn!(temperature, city = %city, "temperature outside plausible range, accepting");
    }
    if humidity < HUMIDITY_RANGE.0 || humidity > HUMIDITY_RANGE.1 {
        tracing::warn!(humidity, city = %city, "humidity outside plausible range, accepting");
    }

    Ok(NormalizedRecord {
        city,
        latitude,
        longitude,
        temperature,
        humidity,
        weather,
        recorded_at: canonicalize_timestamp(&recorded_at),
    })
}

/// Convert a timestamp string to `YYYY-MM-DD HH:MM:SS`
///
/// Accepts the canonical form itself or ISO-8601 with or without a zone
/// suffix (zoned inputs are rebased to UTC). Anything else passes through
/// unchanged; leniency here is deliberate.
pub fn canonicalize_timestamp(raw: &str) -> String {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, CANONICAL_TIMESTAMP) {
        return naive.format(CANONICAL_TIMESTAMP).to_string();
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return zoned
            .with_timezone(&Utc)
            .format(CANONICAL_TIMESTAMP)
            .to_string();
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return naive.format(CANONICAL_TIMESTAMP).to_string();
        }
    }
    raw.to_string()
}

/// Look a field up at the top level or inside the nested `current` block
fn lookup<'a>(raw: &'a Value, flat: &str, nested: Option<&str>) -> Option<&'a Value> {
    if let Some(value) = raw.get(flat).filter(|v| !v.is_null()) {
        return Some(value);
    }
    let nested = nested?;
    raw.get("current")
        .and_then(|current| current.get(nested))
        .filter(|v| !v.is_null())
}

fn required_string(
    raw: &Value,
    flat: &'static str,
    nested: Option<&str>,
) -> Result<String, ValidationError> {
    match lookup(raw, flat, nested) {
        None => Err(ValidationError::MissingField(flat)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::TypeMismatch(flat)),
    }
}

fn required_number(
    raw: &Value,
    flat: &'static str,
    nested: Option<&str>,
) -> Result<f64, ValidationError> {
    let value = lookup(raw, flat, nested).ok_or(ValidationError::MissingField(flat))?;
    coerce_f64(value).ok_or(ValidationError::TypeMismatch(flat))
}

fn required_timestamp(raw: &Value) -> Result<String, ValidationError> {
    let value = lookup(raw, "recorded_at", Some("timestamp"))
        .ok_or(ValidationError::MissingField("recorded_at"))?;
    match value {
        Value::String(s) => Ok(s.clone()),
        // epoch seconds are coerced before canonicalization
        Value::Number(n) => {
            let secs = n
                .as_i64()
                .ok_or(ValidationError::TypeMismatch("recorded_at"))?;
            let ts = DateTime::from_timestamp(secs, 0)
                .ok_or(ValidationError::OutOfRange("recorded_at"))?;
            Ok(ts.format(CANONICAL_TIMESTAMP).to_string())
        }
        _ => Err(ValidationError::TypeMismatch("recorded_at")),
    }
}

/// Numeric coercion: JSON numbers and numeric strings both count
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
