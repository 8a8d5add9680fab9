//! Property values for nodes and relationships
//!
//! A property bag is an insertion-ordered map from name to a tagged value.
//! Supported shapes are strings, integers, floats, booleans and arrays of
//! those; everything else a JSON document can hold is rejected.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Property value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get array value if this is an array
    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Numeric view shared by integers and floats
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Reject shapes that cannot be stored or exported faithfully
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PropertyValue::Float(f) if !f.is_finite() => {
                Err(format!("non-finite float {} is not supported", f))
            }
            PropertyValue::Array(items) => items.iter().try_for_each(PropertyValue::validate),
            _ => Ok(()),
        }
    }

    /// Convert a JSON value, rejecting null and objects
    pub fn from_json(value: serde_json::Value) -> Result<Self, String> {
        use serde_json::Value as Json;

        let converted = match value {
            Json::String(s) => PropertyValue::String(s),
            Json::Bool(b) => PropertyValue::Boolean(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PropertyValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    PropertyValue::Float(f)
                } else {
                    return Err(format!("number {} is out of range", n));
                }
            }
            Json::Array(items) => PropertyValue::Array(
                items
                    .into_iter()
                    .map(PropertyValue::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Json::Null => return Err("null values are not supported".to_string()),
            Json::Object(_) => return Err("nested objects are not supported".to_string()),
        };
        converted.validate()?;
        Ok(converted)
    }

    /// JSON form used in exported documents and result records
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            PropertyValue::String(s) => Json::String(s.clone()),
            PropertyValue::Integer(i) => Json::from(*i),
            PropertyValue::Float(f) => Json::from(*f),
            PropertyValue::Boolean(b) => Json::Bool(*b),
            PropertyValue::Array(items) => {
                Json::Array(items.iter().map(PropertyValue::to_json).collect())
            }
        }
    }

    /// Equality between values of a comparable kind
    ///
    /// Returns `None` when the kinds differ (a number never equals a string).
    /// Integers and floats are both numbers and compare by value.
    pub fn loose_eq(&self, other: &PropertyValue) -> Option<bool> {
        match (self, other) {
            (PropertyValue::String(l), PropertyValue::String(r)) => Some(l == r),
            (PropertyValue::Integer(l), PropertyValue::Integer(r)) => Some(l == r),
            (PropertyValue::Boolean(l), PropertyValue::Boolean(r)) => Some(l == r),
            (PropertyValue::Array(l), PropertyValue::Array(r)) => Some(
                l.len() == r.len()
                    && l.iter().zip(r).all(|(a, b)| a.loose_eq(b) == Some(true)),
            ),
            _ => match (self.as_number(), other.as_number()) {
                (Some(l), Some(r)) => Some(l == r),
                _ => None,
            },
        }
    }

    /// Ordering between numbers or between strings; `None` otherwise
    pub fn loose_cmp(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::String(l), PropertyValue::String(r)) => Some(l.cmp(r)),
            (PropertyValue::Integer(l), PropertyValue::Integer(r)) => Some(l.cmp(r)),
            _ => {
                let l = self.as_number()?;
                let r = other.as_number()?;
                l.partial_cmp(&r)
            }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Array(arr) => {
                write!(f, "[")?;
                for (i, val) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(arr: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(arr)
    }
}

/// Insertion-ordered property bag
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// Build a property bag from `(key, value)` pairs, keeping their order
pub fn properties<K, V, I>(pairs: I) -> PropertyMap
where
    K: Into<String>,
    V: Into<PropertyValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// JSON object for a property bag, in bag order
pub fn properties_to_json(props: &PropertyMap) -> serde_json::Map<String, serde_json::Value> {
    props
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}
