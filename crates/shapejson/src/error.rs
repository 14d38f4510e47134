//! Error types for shapejson encoding and decoding operations.
//!
//! [`ShapeError`] ends a top-level call. [`ConvertError`] is member-local and
//! is absorbed by the decoder: the member keeps its default and the enclosing
//! object still materializes.

use thiserror::Error;

/// Errors that end a top-level decode call.
#[derive(Error, Debug)]
pub enum ShapeError {
    /// The input text was not syntactically valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a single token could not be converted into a target type.
///
/// Never returned from the public entry points; the decoder logs it and falls
/// back to the target's default.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// The token's JSON shape is incompatible with the target type.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The token had the right shape but its value does not fit the target
    /// (out-of-range integer, unknown enum variant, bad date text).
    #[error("invalid value for {target}: {message}")]
    InvalidValue {
        target: &'static str,
        message: String,
    },

    /// The target type has no registered constructor.
    #[error("type {0} has no accessible constructor")]
    NoConstructor(&'static str),
}

impl ConvertError {
    /// Shorthand for a shape mismatch against `token`.
    pub fn mismatch(expected: &'static str, token: &serde_json::Value) -> Self {
        ConvertError::Mismatch {
            expected,
            found: token_kind(token),
        }
    }

    /// Shorthand for an out-of-domain value.
    pub fn invalid(target: &'static str, message: impl Into<String>) -> Self {
        ConvertError::InvalidValue {
            target,
            message: message.into(),
        }
    }
}

/// Human-readable JSON kind of a token, used in conversion diagnostics.
pub(crate) fn token_kind(token: &serde_json::Value) -> &'static str {
    match token {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Convenience alias used throughout shapejson.
pub type Result<T> = std::result::Result<T, ShapeError>;
