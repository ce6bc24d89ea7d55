//! Shared Error Types
//!
//! Errors raised by the wire-level types in `shared`: handshake identity
//! validation, chat payload validation, and JSON encoding of outbound events.
//!
//! # Usage
//!
//! ```rust
//! use chatpulse::shared::error::SharedError;
//!
//! let error = SharedError::validation("userId", "identity is empty");
//! assert!(error.to_string().contains("userId"));
//! ```
use thiserror::Error;

/// Errors produced by shared wire types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        message: String,
    },

    /// A field failed validation
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        message: String,
    },

    /// A chat payload could not be built
    #[error("Message error: {message}")]
    MessageError {
        message: String,
    },
}

impl SharedError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::MessageError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
