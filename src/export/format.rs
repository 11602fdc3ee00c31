//! Cell value normalisation for the export.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use super::sheets::CellValue;

const EXPORT_DATE_FORMAT: &str = "%d-%m-%Y";

/// Normalise a stored date or timestamp to `DD-MM-YYYY`.
///
/// Unrecognised values are returned trimmed but otherwise untouched.
pub fn export_date_dmy(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed.format(EXPORT_DATE_FORMAT).to_string();
    }
    // Store timestamps use a space separator: `2024-01-02 10:00:00.123Z`.
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&trimmed.replacen(' ', "T", 1)) {
        return parsed.format(EXPORT_DATE_FORMAT).to_string();
    }
    let naive = trimmed.trim_end_matches('Z');
    if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f") {
        return parsed.format(EXPORT_DATE_FORMAT).to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return parsed.format(EXPORT_DATE_FORMAT).to_string();
    }
    if let Some((day, _)) = trimmed.split_once(' ') {
        if let Ok(parsed) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            return parsed.format(EXPORT_DATE_FORMAT).to_string();
        }
    }

    trimmed.to_string()
}

/// Read a frame's free-form `extras` field, which may be stored as an object,
/// a JSON string or raw bytes. Anything unreadable yields an empty map.
pub fn read_extras_map(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(text)) => parse_object(text.trim().as_bytes()),
        Some(Value::Array(items)) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            bytes.map(|b| parse_object(&b)).unwrap_or_default()
        }
        _ => Map::new(),
    }
}

fn parse_object(bytes: &[u8]) -> Map<String, Value> {
    if bytes.is_empty() {
        return Map::new();
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

pub fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse().ok()
            }
        }
        _ => None,
    }
}

/// JSON text of `value`, empty for a missing value.
pub fn stringify_json(value: Option<&Value>) -> String {
    value
        .and_then(|v| serde_json::to_string(v).ok())
        .unwrap_or_default()
}

/// Cell for one extras key. Keys ending in `price` are numeric when possible
/// and fall back to their text; other keys fall back to their JSON text.
pub fn export_extras_value(key: &str, value: Option<&Value>) -> CellValue {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return CellValue::Empty;
    };

    if let Some(number) = coerce_float(value) {
        return CellValue::Number(number);
    }
    if let Value::String(text) = value {
        return CellValue::Text(text.clone());
    }
    if key.to_lowercase().ends_with("price") {
        return CellValue::Empty;
    }
    CellValue::Text(stringify_json(Some(value)))
}
