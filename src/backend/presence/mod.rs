//! Presence Module
//!
//! Tracks which users hold a live real-time connection.
//!
//! - **`registry`** - user -> live connection mapping with an ownership-checked release
//! - **`lifecycle`** - per-connection handshake/close state machine

pub mod registry;
pub mod lifecycle;

pub use registry::PresenceRegistry;
pub use lifecycle::{CloseOutcome, ConnectionLifecycle, LifecyclePhase};
