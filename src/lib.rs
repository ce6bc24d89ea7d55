//! chatpulse - Connection-state core for a chat backend
//!
//! Tracks which users hold a live real-time connection, broadcasts
//! membership changes, delivers messages to the right live connection, and
//! keeps the link to the persistent store alive through failures.
//!
//! # Module Structure
//!
//! - **`shared`** - Identities, wire events, chat payloads, errors, config
//! - **`backend`** - Store connection manager, presence registry,
//!   connection lifecycle, broadcast dispatcher, HTTP/WebSocket surface
//!
//! # Usage
//!
//! ```rust,no_run
//! use chatpulse::backend::server::create_app;
//! use chatpulse::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let app = create_app(&config)?;
//! app.store.connect().await?;
//! # Ok(())
//! # }
//! ```

/// Types shared between the HTTP layer and the presence core
pub mod shared;

/// Server-side code
pub mod backend;

pub use shared::{ChatMessage, ConnectionId, ServerEvent, UserIdentity};
