//! Typed field values for audit-log snapshots.
//!
//! History snapshots arrive as arbitrary JSON objects. They are normalized
//! into [`FieldValue`] at decode time, so the diff engine only ever sees the
//! shapes it knows how to display.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::warn;

/// One field value of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    /// Missing or `null`.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// Any JSON number.
    Number(Number),
    /// A string.
    Text(String),
    /// An attached file: any object with a string `fileName`.
    File {
        /// Name of the file.
        file_name: String,
        /// Download location, if present.
        url: Option<String>,
    },
    /// A link: any object with a string `url` but no `fileName`.
    Link {
        /// Target of the link.
        url: String,
    },
    /// A JSON array.
    List(Vec<FieldValue>),
    /// Any other object. Retained for comparison, never displayed.
    Object(Map<String, Value>),
}

impl FieldValue {
    /// Whether the value counts as absent: `null`, an empty string, or the
    /// literal `"empty"` the API uses as a placeholder.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty() || text == "empty",
            _ => false,
        }
    }

    /// Compares two values the way the audit log intends.
    ///
    /// Numbers compare by numeric value, so `1` and `1.0` are equal. Everything
    /// else compares structurally.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b) == Some(Ordering::Equal),
                _ => a == b,
            },
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.same_as(b))
            }
            _ => self == other,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => from_object(map),
        }
    }
}

fn from_object(map: Map<String, Value>) -> FieldValue {
    let url = match map.get("url") {
        Some(Value::String(url)) => Some(url.clone()),
        _ => None,
    };

    if let Some(Value::String(file_name)) = map.get("fileName") {
        return FieldValue::File {
            file_name: file_name.clone(),
            url,
        };
    }

    match url {
        Some(url) => FieldValue::Link { url },
        None => FieldValue::Object(map),
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Self::Null,
            FieldValue::Bool(b) => Self::Bool(b),
            FieldValue::Number(n) => Self::Number(n),
            FieldValue::Text(s) => Self::String(s),
            FieldValue::File { file_name, url } => {
                let mut map = Map::new();
                map.insert("fileName".to_string(), Self::String(file_name));
                if let Some(url) = url {
                    map.insert("url".to_string(), Self::String(url));
                }
                Self::Object(map)
            }
            FieldValue::Link { url } => {
                let mut map = Map::new();
                map.insert("url".to_string(), Self::String(url));
                Self::Object(map)
            }
            FieldValue::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            FieldValue::Object(map) => Self::Object(map),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

/// A field-keyed snapshot of a domain record, in payload order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSnapshot", into = "Map<String, Value>")]
pub struct Snapshot {
    fields: Vec<(String, FieldValue)>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Looks up a field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find_map(|(k, value)| (k == key).then_some(value))
    }

    /// Whether the snapshot has a field with this key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Sets a field, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Iterates over fields in payload order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterates over keys in payload order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the snapshot has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Snapshot
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (key, value) in iter {
            snapshot.insert(key, value);
        }
        snapshot
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            fields: map
                .into_iter()
                .map(|(key, value)| (key, FieldValue::from(value)))
                .collect(),
        }
    }
}

impl From<Snapshot> for Map<String, Value> {
    fn from(snapshot: Snapshot) -> Self {
        snapshot
            .fields
            .into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect()
    }
}

/// Snapshots are stored either as objects or as JSON-encoded strings,
/// depending on the entity's history table.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnapshot {
    Object(Map<String, Value>),
    Encoded(String),
    Null(()),
}

impl From<RawSnapshot> for Snapshot {
    fn from(raw: RawSnapshot) -> Self {
        match raw {
            RawSnapshot::Object(map) => map.into(),
            RawSnapshot::Encoded(text) if text.trim().is_empty() => Self::new(),
            RawSnapshot::Encoded(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => map.into(),
                Err(error) => {
                    warn!(%error, "snapshot string is not a JSON object, ignoring it");
                    Self::new()
                }
            },
            RawSnapshot::Null(()) => Self::new(),
        }
    }
}
