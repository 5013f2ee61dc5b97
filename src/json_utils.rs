//! JSON utilities for OpenF1 payloads
//!
//! The upstream schema is owned by a third party and drifts: timestamps arrive
//! with and without offsets, numbers occasionally arrive as strings, and error
//! answers come back as `{"detail": ...}` objects instead of arrays. These
//! helpers make decoding degrade per field instead of failing a whole response.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::trace;

use crate::{DashboardError, Result};

/// Decode a response body that must be a JSON array of `T`.
///
/// A JSON object with a `detail` field is the upstream's way of reporting a
/// query error; it is surfaced as a [`DashboardError::Decode`] carrying the detail.
pub fn parse_json_array<T: DeserializeOwned>(body: &[u8], endpoint: &str) -> Result<Vec<T>> {
    let value: Value = serde_json::from_slice(body).map_err(|e| DashboardError::Decode {
        endpoint: endpoint.to_string(),
        details: format!("invalid JSON: {}", e),
    })?;

    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(|e| DashboardError::Decode {
            endpoint: endpoint.to_string(),
            details: format!("unexpected record shape: {}", e),
        }),
        Value::Object(map) => {
            let details = map
                .get("detail")
                .map(|d| d.to_string())
                .unwrap_or_else(|| "expected a JSON array, got an object".to_string());
            Err(DashboardError::Decode { endpoint: endpoint.to_string(), details })
        }
        other => Err(DashboardError::Decode {
            endpoint: endpoint.to_string(),
            details: format!("expected a JSON array, got {}", type_name(&other)),
        }),
    }
}

/// Parse an upstream timestamp.
///
/// Accepts RFC 3339 with any offset and naive ISO timestamps, which are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|naive| naive.and_utc())
}

/// Deserialize an optional timestamp, mapping malformed values to `None`.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(raw)) => {
            let parsed = parse_timestamp(&raw);
            if parsed.is_none() {
                trace!("Dropping unparseable timestamp {:?}", raw);
            }
            parsed
        }
        _ => None,
    })
}

/// Deserialize an optional float that may be encoded as a number or a string.
pub fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Deserialize an optional unsigned integer that may be encoded as a number or a string.
pub fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Deserialize)]
    struct Record {
        #[serde(default, deserialize_with = "lenient_timestamp")]
        at: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "lenient_f64")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "lenient_u32")]
        count: Option<u32>,
    }

    #[test]
    fn timestamps_with_offsets_are_normalized_to_utc() {
        let parsed = parse_timestamp("2024-03-02T17:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap());
    }

    #[test]
    fn naive_timestamps_are_taken_as_utc() {
        let parsed = parse_timestamp("2024-03-02T15:00:00.250").unwrap();
        assert_eq!(parsed.timestamp_millis() % 1000, 250);
    }

    #[test]
    fn malformed_fields_degrade_to_none() {
        let record: Record =
            serde_json::from_str(r#"{"at": "yesterday", "value": "fast", "count": -3}"#).unwrap();
        assert!(record.at.is_none());
        assert!(record.value.is_none());
        assert!(record.count.is_none());
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let record: Record = serde_json::from_str(r#"{"value": "91.25", "count": "7"}"#).unwrap();
        assert_eq!(record.value, Some(91.25));
        assert_eq!(record.count, Some(7));
        assert!(record.at.is_none());
    }

    #[test]
    fn detail_objects_are_reported_as_decode_errors() {
        let body = br#"{"detail": "Invalid session_key"}"#;
        let err = parse_json_array::<Record>(body, "/laps").unwrap_err();
        match err {
            DashboardError::Decode { endpoint, details } => {
                assert_eq!(endpoint, "/laps");
                assert!(details.contains("Invalid session_key"));
            }
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn empty_arrays_decode_to_empty_vectors() {
        let records = parse_json_array::<Record>(b"[]", "/sessions").unwrap();
        assert!(records.is_empty());
    }
}
