//! Resource Value Model
//! Typed values crossing the read/write boundary of an object instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single resource value as seen by a management server.
///
/// `Time` carries a full `DateTime<Utc>` so timestamp-valued resources
/// round-trip exactly. `OpaqueInstances` models a multi-instance opaque
/// resource (instance id -> bytes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Opaque(Vec<u8>),
    Text(String),
    Integer(i64),
    Time(DateTime<Utc>),
    ObjectLink { object_id: u16, instance_id: u16 },
    OpaqueInstances(BTreeMap<u16, Vec<u8>>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&[u8]> {
        match self {
            Value::Opaque(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Opaque(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("uri").as_text(), Some("uri"));
        assert_eq!(Value::from(3i64).as_integer(), Some(3));
        assert_eq!(Value::from(vec![1u8, 2]).as_opaque(), Some(&[1u8, 2][..]));
        assert_eq!(Value::from("uri").as_integer(), None);
    }

    #[test]
    fn test_time_round_trip() {
        let now = Utc::now();
        let json = serde_json::to_string(&Value::Time(now)).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Time(now));
    }
}
