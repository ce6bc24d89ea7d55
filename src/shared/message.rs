/**
 * Chat Message Payload
 *
 * The body carried by a `message-delivered` event. Durable storage of
 * messages belongs to the persistence collaborator; this type is only the
 * shape pushed over the real-time channel.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::identity::UserIdentity;

/// Longest message text accepted for live delivery
pub const MAX_TEXT_LEN: usize = 10_000;

/// A chat message addressed from one user to another
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: UserIdentity,
    pub receiver: UserIdentity,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new message stamped with the current UTC time
    ///
    /// # Errors
    ///
    /// Returns `SharedError::MessageError` if the text is blank or longer
    /// than `MAX_TEXT_LEN` bytes.
    pub fn new(
        sender: UserIdentity,
        receiver: UserIdentity,
        text: impl Into<String>,
    ) -> Result<Self, SharedError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SharedError::message("text is empty"));
        }
        if text.len() > MAX_TEXT_LEN {
            return Err(SharedError::message(format!(
                "text exceeds {} bytes",
                MAX_TEXT_LEN
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            sender,
            receiver,
            text,
            created_at: Utc::now(),
        })
    }
}
