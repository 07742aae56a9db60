//! Conversion of FreeIPA entries into target records.

use idsync_connector::model::{TargetGroup, TargetPrincipal};
use idsync_connector::operation::{AttributeSet, AttributeValue};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// FreeIPA returns most attributes as single-element lists; those collapse to
/// a scalar.
pub fn json_to_attribute(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(AttributeValue::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(AttributeValue::Integer)
            .or_else(|| Some(AttributeValue::String(n.to_string()))),
        Value::String(s) => Some(AttributeValue::String(s.clone())),
        Value::Array(items) => {
            let mut values: Vec<AttributeValue> =
                items.iter().filter_map(json_to_attribute).collect();
            match values.len() {
                0 => None,
                1 => values.pop(),
                _ => Some(AttributeValue::Array(values)),
            }
        }
        // `dn` and binary blobs come back as objects; nothing reconciles them.
        Value::Object(_) => None,
    }
}

pub fn entry_to_attributes(entry: &Map<String, Value>) -> AttributeSet {
    entry
        .iter()
        .filter_map(|(k, v)| json_to_attribute(v).map(|value| (k.clone(), value)))
        .collect()
}

/// Strings of a possibly multi-valued attribute.
pub fn strings(entry: &Map<String, Value>, name: &str) -> Vec<String> {
    match entry.get(name) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// `nsaccountlock` is a boolean on current servers and `["TRUE"]` on old ones.
pub fn is_locked(entry: &Map<String, Value>) -> bool {
    match entry.get("nsaccountlock") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Array(items)) => items.iter().any(|v| match v {
            Value::Bool(b) => *b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }),
        _ => false,
    }
}

pub fn entry_to_principal(key: &str, entry: &Map<String, Value>) -> TargetPrincipal {
    let login = strings(entry, "uid").into_iter().next().unwrap_or_else(|| key.to_string());
    TargetPrincipal {
        login,
        disabled: is_locked(entry),
        attributes: entry_to_attributes(entry),
    }
}

pub fn entry_to_group(key: &str, entry: &Map<String, Value>) -> TargetGroup {
    TargetGroup {
        name: strings(entry, "cn").into_iter().next().unwrap_or_else(|| key.to_string()),
        description: strings(entry, "description").into_iter().next(),
        member_users: strings(entry, "member_user").into_iter().collect::<BTreeSet<_>>(),
        member_groups: strings(entry, "member_group").into_iter().collect::<BTreeSet<_>>(),
    }
}
