//! Real-time Module
//!
//! Pushes presence and message events to connected clients.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports and documentation
//! ├── broadcast.rs - Broadcast Dispatcher (presence fan-out, directed delivery)
//! └── socket.rs    - WebSocket upgrade handler and per-connection task
//! ```
//!
//! # Events
//!
//! - `presence-changed` - full online set, sent to every connection
//! - `message-delivered` - one message, sent to the recipient's live connection

/// Presence fan-out and directed delivery
pub mod broadcast;

/// WebSocket transport
pub mod socket;

pub use broadcast::{BroadcastDispatcher, DeliveryOutcome, Frame, Outbox};
pub use socket::handle_socket_upgrade;
