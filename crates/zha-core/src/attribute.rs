//! Attribute values as reported by clusters

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value read from or reported by a cluster attribute.
///
/// The radio layer deserializes ZCL payloads into one of these variants;
/// everything above the transport works with this type instead of raw ZCL
/// datatypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl AttributeValue {
    /// Interpret the value as a boolean. Integers are truthy when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret the value as an unsigned 16-bit integer, the most common
    /// ZCL analog datatype.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            AttributeValue::Int(i) => u16::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            AttributeValue::Int(i) => u8::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Interpret the value as a float. Integers widen losslessly.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<u8> for AttributeValue {
    fn from(i: u8) -> Self {
        AttributeValue::Int(i64::from(i))
    }
}

impl From<u16> for AttributeValue {
    fn from(i: u16) -> Self {
        AttributeValue::Int(i64::from(i))
    }
}

impl From<u32> for AttributeValue {
    fn from(i: u32) -> Self {
        AttributeValue::Int(i64::from(i))
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<f64> for AttributeValue {
    fn from(r: f64) -> Self {
        AttributeValue::Real(r)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<AttributeValue> for serde_json::Value {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Bool(b) => serde_json::Value::Bool(b),
            AttributeValue::Int(i) => serde_json::Value::from(i),
            AttributeValue::Real(r) => serde_json::Value::from(r),
            AttributeValue::Text(s) => serde_json::Value::String(s),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Real(r) => write!(f, "{}", r),
            AttributeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_bool_from_int() {
        assert_eq!(AttributeValue::Int(1).as_bool(), Some(true));
        assert_eq!(AttributeValue::Int(0).as_bool(), Some(false));
        assert_eq!(AttributeValue::Int(255).as_bool(), Some(true));
        assert_eq!(AttributeValue::Bool(true).as_bool(), Some(true));
        assert_eq!(AttributeValue::Text("on".into()).as_bool(), None);
    }

    #[test]
    fn test_as_u16_bounds() {
        assert_eq!(AttributeValue::Int(0xFFFF).as_u16(), Some(0xFFFF));
        assert_eq!(AttributeValue::Int(0x10000).as_u16(), None);
        assert_eq!(AttributeValue::Int(-1).as_u16(), None);
    }

    #[test]
    fn test_as_f64_widens_ints() {
        assert_eq!(AttributeValue::Int(2577).as_f64(), Some(2577.0));
        assert_eq!(AttributeValue::Real(25.77).as_f64(), Some(25.77));
        assert_eq!(AttributeValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_serde_untagged() {
        let value: AttributeValue = serde_json::from_str("42").unwrap();
        assert_eq!(value, AttributeValue::Int(42));

        let value: AttributeValue = serde_json::from_str("25.5").unwrap();
        assert_eq!(value, AttributeValue::Real(25.5));

        let value: AttributeValue = serde_json::from_str("\"LUMI lumi.sensor\"").unwrap();
        assert_eq!(value, AttributeValue::Text("LUMI lumi.sensor".into()));
    }

    #[test]
    fn test_into_json_value() {
        let json: serde_json::Value = AttributeValue::Int(300).into();
        assert_eq!(json, serde_json::json!(300));
    }
}
