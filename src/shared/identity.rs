/**
 * Connection Identity Types
 *
 * This module defines the identifiers that flow through the presence layer:
 * the user identity claimed at handshake time, the per-session connection id
 * generated by the transport, and the `LiveConnection` record tying them
 * together.
 *
 * # Validation
 *
 * A `UserIdentity` is opaque to this crate; the authentication collaborator
 * issues it. We only reject values that can never be a real identity: empty
 * strings, padded strings, overlong strings, control characters, and the literal
 * `"undefined"`/`"null"` that browser clients send when the field was never
 * populated.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Longest identity accepted at handshake time
pub const MAX_IDENTITY_LEN: usize = 128;

/// Opaque user identifier issued by the authentication collaborator
///
/// Immutable once assigned to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(String);

impl UserIdentity {
    /// Parse a claimed identity, rejecting values that cannot be valid
    ///
    /// # Example
    ///
    /// ```rust
    /// use chatpulse::shared::UserIdentity;
    ///
    /// let user = UserIdentity::parse("u1").unwrap();
    /// assert_eq!(user.as_str(), "u1");
    /// assert!(UserIdentity::parse("").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, SharedError> {
        if raw.trim().is_empty() {
            return Err(SharedError::validation("userId", "identity is empty"));
        }
        // Identities are opaque; " alice" and "alice" are different claims.
        if raw.trim() != raw {
            return Err(SharedError::validation(
                "userId",
                "identity has leading or trailing whitespace",
            ));
        }
        if raw == "undefined" || raw == "null" {
            return Err(SharedError::validation("userId", "identity was never set"));
        }
        if raw.len() > MAX_IDENTITY_LEN {
            return Err(SharedError::validation(
                "userId",
                format!("identity exceeds {} bytes", MAX_IDENTITY_LEN),
            ));
        }
        if raw.chars().any(char::is_control) {
            return Err(SharedError::validation("userId", "identity contains control characters"));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport-level session identifier, unique per real-time connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One active real-time session
///
/// Owned by the connection lifecycle for its whole duration; only the
/// `(user, connection_id)` pair is shared with the presence registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConnection {
    pub connection_id: ConnectionId,
    pub user: UserIdentity,
    pub established_at: DateTime<Utc>,
}

impl LiveConnection {
    pub fn new(connection_id: ConnectionId, user: UserIdentity) -> Self {
        Self {
            connection_id,
            user,
            established_at: Utc::now(),
        }
    }
}
