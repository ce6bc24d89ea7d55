/**
 * Backend Error Types
 *
 * Error enums for the server side of the crate.
 *
 * # Error Categories
 *
 * ## Store Errors
 *
 * Raised by the persistent-store connection manager and its connector:
 * - Failed or timed-out connection attempts (recovered by retry)
 * - Failed liveness probes (recovered by reconnect)
 * - Retry ceiling exceeded on the initial connection (fatal)
 *
 * ## Lifecycle Errors
 *
 * Raised when a real-time connection's handshake is rejected. These never
 * touch the presence registry.
 *
 * ## Backend Errors
 *
 * Returned by HTTP handlers (invalid identities or payloads) and by
 * `create_app` (invalid configuration).
 */

use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::shared::{ConfigError, SharedError};

/// Errors from the persistent-store connection layer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The driver refused or failed the connection attempt
    #[error("store connection failed: {message}")]
    Connect { message: String },

    /// The connection attempt exceeded the establishment timeout
    #[error("store connection timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },

    /// A liveness probe against an established link failed
    #[error("store probe failed: {message}")]
    Ping { message: String },

    /// The initial connection could not be established within the retry ceiling
    #[error("store unreachable after {retries} retries: {message}")]
    RetriesExhausted { retries: u32, message: String },

    /// No established link is available
    #[error("store is not connected")]
    NotReady,
}

impl StoreError {
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    pub fn ping(message: impl Into<String>) -> Self {
        Self::Ping {
            message: message.into(),
        }
    }

    /// Whether the process cannot proceed after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}

/// Errors from a real-time connection's handshake
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The claimed identity was missing or invalid
    #[error("handshake rejected: {0}")]
    Rejected(SharedError),

    /// `open` was called on a connection that already left `Handshaking`
    #[error("connection already opened")]
    AlreadyOpened,
}

/// Backend-specific error types
///
/// Every variant maps to an HTTP status so handlers can return it directly.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),
}

impl BackendError {
    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `SharedError` - 400 for validation, 500 for serialization
    /// - `ConfigError` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::MessageError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }
}
