use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::ParamKind;

/// A configuration value as held by the config store.
///
/// Bounded integers are `u8`: the accepted range [0, 255] is exactly the
/// type's domain, so a stored `Int` can never be out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(u8),
    Float(f64),
}

impl Value {
    pub fn kind(&self) -> ParamKind {
        match self {
            Value::Bool(_) => ParamKind::Boolean,
            Value::Int(_) => ParamKind::Integer,
            Value::Float(_) => ParamKind::Float,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<u8> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}
