//! Sub-document values - Arbitrary nested content written inside a parent document

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A caller-supplied value stored at a path within a parent document
///
/// Serializes untagged, so `SubDocumentValue::Array(vec!["Phobos".into()])`
/// is stored as `["Phobos"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubDocumentValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<SubDocumentValue>),
    Map(BTreeMap<String, SubDocumentValue>),
}

impl SubDocumentValue {
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<SubDocumentValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<SubDocumentValue> for Value {
    fn from(value: SubDocumentValue) -> Self {
        match value {
            SubDocumentValue::Null => Value::Null,
            SubDocumentValue::Bool(b) => Value::Bool(b),
            SubDocumentValue::Integer(i) => Value::from(i),
            // Non-finite floats have no JSON representation
            SubDocumentValue::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SubDocumentValue::String(s) => Value::String(s),
            SubDocumentValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            SubDocumentValue::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for SubDocumentValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SubDocumentValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for SubDocumentValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for SubDocumentValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SubDocumentValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SubDocumentValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<SubDocumentValue>> From<Vec<T>> for SubDocumentValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SubDocumentValue>> From<Option<T>> for SubDocumentValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}
