use std::path::PathBuf;

use thiserror::Error;

use crate::params::{ParamKind, ParamName};
use crate::types::value::Value;

// ---------------------------------------------------------------------------
// Registry / store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No parameter with the given wire name exists.
    #[error("unknown parameter: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The store was read before `ensure_defaults()` populated this entry.
    #[error("parameter '{0}' has no value (defaults were never initialized)")]
    KeyMissing(ParamName),
    /// The value does not fit the typed slot for this parameter.
    #[error("parameter '{name}' holds {expected} values, got {got}")]
    TypeMismatch {
        name: ParamName,
        expected: ParamKind,
        got: Value,
    },
}

// ---------------------------------------------------------------------------
// User input
// ---------------------------------------------------------------------------

/// A rejected user value. Always recoverable: the input state is re-entered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not an integer")]
    NotAnInteger(String),
    #[error("{value} is outside [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },
    #[error("'{0}' is not a decimal number")]
    NotAFloat(String),
}

impl ValidationError {
    /// Text shown to the user in the chat after a rejected value.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::NotAnInteger(_) | ValidationError::OutOfRange { .. } => {
                "Invalid value, insert an integer number between 0 and 255"
            }
            ValidationError::NotAFloat(_) => "Invalid value, insert a floating point number",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action token: {0}")]
pub struct UnknownAction(pub String);

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Socket service / client
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cannot bind socket {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("empty frame")]
    EmptyFrame,
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_yaml::Error),
}
