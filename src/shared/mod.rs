//! Shared Module
//!
//! Types that cross the wire or are shared between the HTTP layer and the
//! presence core: identities, outbound events, chat payloads, errors, and
//! configuration.

/// User and connection identifiers
pub mod identity;

/// Chat message payload
pub mod message;

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use identity::{ConnectionId, LiveConnection, UserIdentity};
pub use message::ChatMessage;
pub use event::ServerEvent;
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
