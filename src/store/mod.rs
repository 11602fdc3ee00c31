//! Record store access.
//!
//! The service never owns its data: orders, customers, order items and email logs
//! live in an external PocketBase-compatible record store. Everything here goes
//! through the [`RecordStore`] trait so handlers can be exercised against an
//! in-memory implementation in tests.

pub mod filter;
pub mod pocketbase;

pub use filter::Filter;
pub use pocketbase::{PocketBaseStore, StoreConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("record store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode record store response: {0}")]
    Decode(String),
}

/// A single record as returned by the store: the id plus every other field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == "id" {
            return None;
        }
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Field as a string; numbers and booleans are stringified, anything else is empty.
    pub fn get_string(&self, key: &str) -> String {
        if key == "id" {
            return self.id.clone();
        }
        match self.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    pub fn get_float(&self, key: &str) -> f64 {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            Some(Value::Bool(true)) => 1.0,
            _ => 0.0,
        }
    }

    pub fn get_int(&self, key: &str) -> i64 {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(|f| f as i64)
                .unwrap_or(0),
            Some(Value::Bool(true)) => 1,
            _ => 0,
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
            _ => false,
        }
    }

    /// Multi-relation fields come back as arrays; single relations as a bare string.
    pub fn get_string_slice(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Field as a JSON object, or an empty map when absent or not an object.
    pub fn get_object(&self, key: &str) -> Map<String, Value> {
        match self.get(key) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }
}

/// Query/mutation contract of the external record store.
#[async_trait]
pub trait RecordStore {
    /// Records of `collection` matching `filter`, sorted by `sort`
    /// (PocketBase syntax, e.g. `-created`), at most `limit` of them.
    async fn find_records(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        sort: &str,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError>;

    async fn create_record(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError>;

    /// Patch the given fields of an existing record.
    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError>;

    /// Resolve a caller's auth token to the user record it belongs to.
    /// A rejected token comes back as a 4xx [`StoreError::Status`].
    async fn authenticate(&self, token: &str) -> Result<Record, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_deserializes_flattened_fields() {
        let record: Record = serde_json::from_value(json!({
            "id": "abc123",
            "orderNo": 42,
            "frameOrderId": ["f1", "f2"],
            "paperweightOrderId": "p1",
            "replacementFlowers": true,
            "deliveryPrice": "12.5"
        }))
        .unwrap();

        assert_eq!(record.id, "abc123");
        assert_eq!(record.get_int("orderNo"), 42);
        assert_eq!(record.get_string_slice("frameOrderId"), vec!["f1", "f2"]);
        assert_eq!(record.get_string_slice("paperweightOrderId"), vec!["p1"]);
        assert!(record.get_bool("replacementFlowers"));
        assert_eq!(record.get_float("deliveryPrice"), 12.5);
    }

    #[test]
    fn test_missing_and_null_fields_fall_back_to_zero_values() {
        let record = Record::new("r1").with("notes", Value::Null);

        assert_eq!(record.get_string("notes"), "");
        assert_eq!(record.get_string("missing"), "");
        assert_eq!(record.get_int("orderNo"), 0);
        assert!(!record.get_bool("framingComplete"));
        assert!(record.get_string_slice("frameOrderId").is_empty());
        assert_eq!(record.get_string("id"), "r1");
    }
}
