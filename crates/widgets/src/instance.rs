//! Widget instance data.
//!
//! An instance is an opaque, ordered mapping from field name to a JSON value. No schema
//! is known here; each widget type reads and writes its own fields.

use core_types::InstanceHash;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetInstance(BTreeMap<String, Value>);

impl WidgetInstance {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// String value of `field`; lists yield their last element (last-value-wins).
    pub fn get_str(&self, field: &str) -> Option<&str> {
        match self.0.get(field)? {
            Value::String(s) => Some(s),
            Value::Array(items) => items.last().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Truthiness of `field` the way legacy widgets read checkbox values.
    ///
    /// Lists are judged by their last element so a hidden `0` followed by a checked `1`
    /// reads as checked.
    pub fn get_flag(&self, field: &str) -> bool {
        fn truthy(v: &Value) -> bool {
            match v {
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                Value::String(s) => !s.is_empty() && s != "0",
                Value::Array(items) => items.last().is_some_and(truthy),
                Value::Null | Value::Object(_) => false,
            }
        }
        self.0.get(field).is_some_and(truthy)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Content hash over the canonical (key-sorted) JSON serialization.
    pub fn content_hash(&self) -> InstanceHash {
        // Keys are sorted by the BTreeMap, so equal instances serialize identically.
        let bytes = serde_json::to_vec(&self.0).unwrap_or_default();
        InstanceHash::of_bytes(&bytes)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for WidgetInstance {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_by_value() {
        let a: WidgetInstance = [("title", "x"), ("b", "y")].into_iter().collect();
        let b: WidgetInstance = [("b", "y"), ("title", "x")].into_iter().collect();
        assert_eq!(a.content_hash(), b.content_hash());

        let c: WidgetInstance = [("title", "z")].into_iter().collect();
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn flags_follow_last_value() {
        let instance: WidgetInstance = serde_json::from_value(json!({
            "on": ["0", "1"],
            "off": "0",
            "num": 1,
            "bool": false,
        }))
        .unwrap();
        assert!(instance.get_flag("on"));
        assert!(!instance.get_flag("off"));
        assert!(instance.get_flag("num"));
        assert!(!instance.get_flag("bool"));
        assert!(!instance.get_flag("missing"));
    }

    #[test]
    fn serializes_as_plain_object() {
        let instance: WidgetInstance = [("title", "Find stuff")].into_iter().collect();
        assert_eq!(
            serde_json::to_value(&instance).unwrap(),
            json!({ "title": "Find stuff" })
        );
    }
}
