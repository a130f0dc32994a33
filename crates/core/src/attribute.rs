//! Backend-neutral attribute model.
//!
//! Mirrors the DynamoDB attribute types the repository needs. Numbers keep
//! their decimal string form so no precision is lost between backends.
//! Timestamps are stored as RFC 3339 strings.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// A stored row: attribute name to value.
pub type AttributeMap = HashMap<String, AttributeValue>;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    S(String),
    N(String),
    Bool(bool),
    Null,
    M(AttributeMap),
    L(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_m(&self) -> Option<&AttributeMap> {
        match self {
            AttributeValue::M(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::L(l) => Some(l),
            _ => None,
        }
    }

    /// Parses an `N` value as a signed integer.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_n().and_then(|n| n.parse().ok())
    }

    fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null => "NULL",
            AttributeValue::M(_) => "M",
            AttributeValue::L(_) => "L",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::S(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::S(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::N(value.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::S(value.to_rfc3339())
    }
}

impl From<AttributeMap> for AttributeValue {
    fn from(value: AttributeMap) -> Self {
        AttributeValue::M(value)
    }
}

/// Errors raised while reading or converting attributes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Missing attribute: {0}")]
    Missing(String),
    #[error("Attribute {key} has type {found}, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Invalid attribute {key}: {message}")]
    Invalid { key: String, message: String },
}

fn require<'a>(item: &'a AttributeMap, key: &str) -> Result<&'a AttributeValue, AttributeError> {
    item.get(key)
        .ok_or_else(|| AttributeError::Missing(key.to_string()))
}

fn wrong_type(key: &str, expected: &'static str, found: &AttributeValue) -> AttributeError {
    AttributeError::WrongType {
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Get a required string attribute.
pub fn get_string(item: &AttributeMap, key: &str) -> Result<String, AttributeError> {
    let value = require(item, key)?;
    value
        .as_s()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(key, "S", value))
}

/// Get an optional string attribute.
pub fn get_optional_string(item: &AttributeMap, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s()).map(str::to_string)
}

/// Get a required integer attribute.
pub fn get_i64(item: &AttributeMap, key: &str) -> Result<i64, AttributeError> {
    let value = require(item, key)?;
    let n = value.as_n().ok_or_else(|| wrong_type(key, "N", value))?;
    n.parse().map_err(|e| AttributeError::Invalid {
        key: key.to_string(),
        message: format!("{n:?} is not an integer: {e}"),
    })
}

/// Get a required boolean attribute.
pub fn get_bool(item: &AttributeMap, key: &str) -> Result<bool, AttributeError> {
    let value = require(item, key)?;
    value.as_bool().ok_or_else(|| wrong_type(key, "BOOL", value))
}

/// Get a required nested map attribute.
pub fn get_map<'a>(item: &'a AttributeMap, key: &str) -> Result<&'a AttributeMap, AttributeError> {
    let value = require(item, key)?;
    value.as_m().ok_or_else(|| wrong_type(key, "M", value))
}

/// Get a required datetime attribute (RFC 3339 format).
pub fn get_datetime(item: &AttributeMap, key: &str) -> Result<DateTime<Utc>, AttributeError> {
    let s = get_string(item, key)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AttributeError::Invalid {
            key: key.to_string(),
            message: e.to_string(),
        })
}

// ============================================================================
// serde bridge
// ============================================================================

/// Converts any serializable struct into an attribute map.
///
/// The value must serialize to a JSON object.
pub fn to_attribute_map<T: Serialize>(value: &T) -> Result<AttributeMap, AttributeError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(object_to_attributes(map)),
        Ok(other) => Err(AttributeError::Invalid {
            key: "<root>".to_string(),
            message: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(AttributeError::Invalid {
            key: "<root>".to_string(),
            message: e.to_string(),
        }),
    }
}

/// Builds a deserializable struct from an attribute map.
///
/// Attributes the target type does not declare are ignored unless the
/// type opts into `deny_unknown_fields`.
pub fn from_attribute_map<T: DeserializeOwned>(item: &AttributeMap) -> Result<T, AttributeError> {
    serde_json::from_value(attributes_to_object(item)).map_err(|e| AttributeError::Invalid {
        key: "<root>".to_string(),
        message: e.to_string(),
    })
}

/// Converts a JSON object into an attribute map.
pub fn object_to_attributes(map: Map<String, Value>) -> AttributeMap {
    map.into_iter()
        .map(|(k, v)| (k, json_to_attribute(v)))
        .collect()
}

/// Converts an attribute map into a JSON object.
pub fn attributes_to_object(item: &AttributeMap) -> Value {
    Value::Object(
        item.iter()
            .map(|(k, v)| (k.clone(), attribute_to_json(v)))
            .collect(),
    )
}

fn json_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(values) => {
            AttributeValue::L(values.into_iter().map(json_to_attribute).collect())
        }
        Value::Object(map) => AttributeValue::M(object_to_attributes(map)),
    }
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null => Value::Null,
        AttributeValue::M(m) => attributes_to_object(m),
        AttributeValue::L(l) => Value::Array(l.iter().map(attribute_to_json).collect()),
    }
}

fn parse_number(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(u) = n.parse::<u64>() {
        return Value::Number(u.into());
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        // NaN and infinities have no JSON number form.
        .unwrap_or_else(|| Value::String(n.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        age: i64,
        score: f64,
        active: bool,
        tags: Vec<String>,
        address: Address,
        nickname: Option<String>,
        joined_at: DateTime<Utc>,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Address {
        city: String,
        zip: u32,
    }

    fn sample_profile() -> Profile {
        Profile {
            name: "Ann".to_string(),
            age: 42,
            score: 1.5,
            active: true,
            tags: vec!["admin".to_string(), "ops".to_string()],
            address: Address {
                city: "Montevideo".to_string(),
                zip: 11000,
            },
            nickname: None,
            joined_at: DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_serde_bridge_round_trip() {
        let profile = sample_profile();
        let item = to_attribute_map(&profile).unwrap();

        assert_eq!(item.get("age"), Some(&AttributeValue::N("42".to_string())));
        assert_eq!(item.get("nickname"), Some(&AttributeValue::Null));
        assert!(item.get("address").unwrap().as_m().is_some());
        assert_eq!(item.get("tags").unwrap().as_l().unwrap().len(), 2);

        let parsed: Profile = from_attribute_map(&item).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_serde_bridge_ignores_key_attributes() {
        let mut item = to_attribute_map(&sample_profile()).unwrap();
        item.insert("Id".to_string(), AttributeValue::from("p1"));
        item.insert("ObjectType".to_string(), AttributeValue::from("Profile"));

        let parsed: Profile = from_attribute_map(&item).unwrap();
        assert_eq!(parsed.name, "Ann");
    }

    #[test]
    fn test_to_attribute_map_rejects_non_objects() {
        assert!(to_attribute_map(&42).is_err());
        assert!(to_attribute_map(&vec![1, 2]).is_err());
    }

    #[test]
    fn test_from_attribute_map_type_mismatch() {
        let mut item = to_attribute_map(&sample_profile()).unwrap();
        item.insert("age".to_string(), AttributeValue::from("forty-two"));

        let result: Result<Profile, _> = from_attribute_map(&item);
        assert!(matches!(result, Err(AttributeError::Invalid { .. })));
    }

    #[test]
    fn test_getters() {
        let mut item = AttributeMap::new();
        item.insert("name".to_string(), AttributeValue::from("Ann"));
        item.insert("count".to_string(), AttributeValue::from(7_i64));
        item.insert("flag".to_string(), AttributeValue::from(true));
        item.insert(
            "at".to_string(),
            AttributeValue::from("2024-01-15T10:30:00+00:00"),
        );

        assert_eq!(get_string(&item, "name").unwrap(), "Ann");
        assert_eq!(get_i64(&item, "count").unwrap(), 7);
        assert!(get_bool(&item, "flag").unwrap());
        assert_eq!(get_datetime(&item, "at").unwrap().timestamp(), 1705314600);
        assert_eq!(get_optional_string(&item, "missing"), None);
    }

    #[test]
    fn test_getter_errors() {
        let mut item = AttributeMap::new();
        item.insert("name".to_string(), AttributeValue::from("Ann"));

        assert_eq!(
            get_i64(&item, "missing"),
            Err(AttributeError::Missing("missing".to_string()))
        );
        assert_eq!(
            get_i64(&item, "name"),
            Err(AttributeError::WrongType {
                key: "name".to_string(),
                expected: "N",
                found: "S",
            })
        );
        assert!(get_map(&item, "name").is_err());
    }

    #[test]
    fn test_large_unsigned_numbers_survive() {
        let value = attribute_to_json(&AttributeValue::N(u64::MAX.to_string()));
        assert_eq!(value, Value::Number(u64::MAX.into()));
    }
}
