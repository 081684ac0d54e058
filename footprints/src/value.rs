//! Feature property values.

use std::collections::BTreeMap;

/// Properties of a single feature, keyed by the layer's tag keys.
pub type Properties = BTreeMap<String, Value>;

/// Scalar attached to a feature.
/// <https://github.com/mapbox/vector-tile-spec/tree/master/2.1#41-layers>
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize), serde(untagged))]
pub enum Value {
    String(String),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    SInt(i64),
    Bool(bool),
}

impl Value {
    /// Whether the value counts as "set". Zero, NaN, empty strings and `false` do not.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::String(s) => !s.is_empty(),
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Double(d) => *d != 0.0 && !d.is_nan(),
            Self::Int(i) | Self::SInt(i) => *i != 0,
            Self::UInt(u) => *u != 0,
            Self::Bool(b) => *b,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f64::from(*f)),
            Self::Double(d) => Some(*d),
            Self::Int(i) | Self::SInt(i) => Some(*i as f64),
            Self::UInt(u) => Some(*u as f64),
            Self::String(_) | Self::Bool(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
