//! Attribute containers exchanged with sources and targets.
//!
//! Known attributes travel in the fixed-shape records of [`crate::model`]; an
//! [`AttributeSet`] carries the optional attributes sent to the target and the
//! residual pass-through fields read from a source.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An ordered set of named attributes.
///
/// Ordering is by attribute name so that logged intents and requests built
/// from the set are stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    #[serde(flatten)]
    attributes: BTreeMap<String, AttributeValue>,
}

impl AttributeSet {
    /// Create an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute value, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`AttributeSet::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute only when the value is present and not blank.
    pub fn set_if_present(&mut self, name: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !v.trim().is_empty() {
                self.set(name, v);
            }
        }
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Get a single string value.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttributeValue::as_string)
    }

    /// Get the first value rendered as text.
    ///
    /// Multi-valued attributes yield their first element; integers and
    /// booleans are rendered with `to_string`. Blank strings count as absent.
    pub fn first_text(&self, name: &str) -> Option<String> {
        self.attributes
            .get(name)
            .and_then(AttributeValue::first_text)
            .filter(|s| !s.trim().is_empty())
    }

    /// Get all string values (single or multi-valued).
    pub fn get_strings(&self, name: &str) -> Vec<&str> {
        self.attributes
            .get(name)
            .map(AttributeValue::as_strings)
            .unwrap_or_default()
    }

    /// Check whether an attribute is present.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Remove an attribute.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    /// Attribute names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the set has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.attributes.iter()
    }

    /// Keep only the named attributes.
    #[must_use]
    pub fn select(&self, names: &[&str]) -> Self {
        self.attributes
            .iter()
            .filter(|(k, _)| names.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Render as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

/// A single or multi-valued attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// No value.
    Null,
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
    /// Multiple values.
    Array(Vec<AttributeValue>),
    /// Raw bytes, e.g. an LDAP binary attribute.
    Binary(Vec<u8>),
}

impl AttributeValue {
    /// Get as a string if this is a single string value.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as strings (single or multi-valued).
    pub fn as_strings(&self) -> Vec<&str> {
        match self {
            AttributeValue::String(s) => vec![s.as_str()],
            AttributeValue::Array(arr) => arr.iter().filter_map(AttributeValue::as_string).collect(),
            _ => vec![],
        }
    }

    /// Get as an integer, parsing string values.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::String(s) => s.trim().parse().ok(),
            AttributeValue::Array(arr) => arr.first().and_then(AttributeValue::as_integer),
            _ => None,
        }
    }

    /// Get as a boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            AttributeValue::Array(arr) => arr.first().and_then(AttributeValue::as_boolean),
            _ => None,
        }
    }

    /// First value rendered as text.
    pub fn first_text(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) => Some(s.clone()),
            AttributeValue::Integer(i) => Some(i.to_string()),
            AttributeValue::Boolean(b) => Some(b.to_string()),
            AttributeValue::Array(arr) => arr.first().and_then(AttributeValue::first_text),
            AttributeValue::Null | AttributeValue::Binary(_) => None,
        }
    }

    /// Render as JSON. Binary values become arrays of byte numbers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::Null => serde_json::Value::Null,
            AttributeValue::String(s) => serde_json::Value::String(s.clone()),
            AttributeValue::Integer(i) => serde_json::Value::from(*i),
            AttributeValue::Boolean(b) => serde_json::Value::Bool(*b),
            AttributeValue::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(AttributeValue::to_json).collect())
            }
            AttributeValue::Binary(bytes) => {
                serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
            }
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<u32> for AttributeValue {
    fn from(i: u32) -> Self {
        AttributeValue::Integer(i64::from(i))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        AttributeValue::Array(values.into_iter().map(AttributeValue::String).collect())
    }
}
