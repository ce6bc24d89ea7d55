/**
 * Real-time Event System
 *
 * Events pushed from the server to connected clients. Every event is encoded
 * as one JSON text frame of the form:
 *
 * ```json
 * {"event": "presence-changed", "payload": ["u1", "u2"]}
 * {"event": "message-delivered", "payload": {"id": "...", "sender": "u1", ...}}
 * ```
 *
 * Presence events carry the full online set rather than a delta, so a client
 * that misses one is corrected by the next.
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::identity::UserIdentity;
use crate::shared::message::ChatMessage;

/// Name of the presence snapshot event
pub const PRESENCE_CHANGED: &str = "presence-changed";

/// Name of the directed message delivery event
pub const MESSAGE_DELIVERED: &str = "message-delivered";

/// Event sent from the server to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Current set of online user identities, sent to every connection
    PresenceChanged(Vec<UserIdentity>),
    /// A message addressed to the receiving connection's user
    MessageDelivered(ChatMessage),
}

impl ServerEvent {
    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::PresenceChanged(_) => PRESENCE_CHANGED,
            Self::MessageDelivered(_) => MESSAGE_DELIVERED,
        }
    }

    /// Encode this event as a JSON text frame
    pub fn to_frame(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
