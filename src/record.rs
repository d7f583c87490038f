//! Item records as the collection controller sees them.
//!
//! The controller never interprets a record beyond its identifier and the
//! named fields a filter or sort asks for. [`JsonItem`] covers untyped REST
//! payloads; the typed models in [`crate::models`] implement [`Record`] too.

use std::borrow::Cow;
use std::cmp::Ordering;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single field value pulled out of a record for filtering or sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(Timestamp),
}

impl FieldValue {
    /// Text form used for substring search and exact status/type matching.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::Integer(n) => Cow::Owned(n.to_string()),
            FieldValue::Float(n) => Cow::Owned(n.to_string()),
            FieldValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            FieldValue::Timestamp(ts) => Cow::Owned(ts.to_string()),
        }
    }

    // Values of different kinds order by kind so a mixed column still sorts
    // deterministically.
    fn kind_rank(&self) -> u8 {
        match self {
            FieldValue::Bool(_) => 0,
            FieldValue::Integer(_) | FieldValue::Float(_) => 1,
            FieldValue::Timestamp(_) => 2,
            FieldValue::Text(_) => 3,
        }
    }

    /// Total ordering used by the sort engine (ascending).
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64).total_cmp(b),
            (FieldValue::Float(a), FieldValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Common interface for anything a list screen can display.
pub trait Record {
    /// Unique identifier, stable across reloads.
    fn id(&self) -> &str;

    /// Look up a named field. `None` means missing or null.
    fn field(&self, name: &str) -> Option<FieldValue>;
}

/// An untyped JSON object from the backend.
///
/// The identifier is read from `_id` or `id` (strings or integers). Field
/// lookups accept dotted paths (`category.label`) into nested objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct JsonItem {
    id: String,
    fields: Map<String, Value>,
}

impl JsonItem {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Raw JSON value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.fields.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}

impl TryFrom<Map<String, Value>> for JsonItem {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let id = ["_id", "id"]
            .iter()
            .find_map(|key| match fields.get(*key) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| "item has no '_id' or 'id' field".to_string())?;

        Ok(JsonItem { id, fields })
    }
}

impl From<JsonItem> for Map<String, Value> {
    fn from(item: JsonItem) -> Self {
        item.fields
    }
}

impl Record for JsonItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match self.get(name)? {
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Integer)
                .or_else(|| n.as_f64().map(FieldValue::Float)),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}
