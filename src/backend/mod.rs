//! Backend Module
//!
//! Server-side code: the persistent-store connection manager, presence
//! tracking, real-time fan-out, and the HTTP surface around them.

/// Persistent-store connection management
pub mod store;

/// Presence registry and connection lifecycle
pub mod presence;

/// Broadcast dispatcher and WebSocket transport
pub mod realtime;

/// HTTP routes
pub mod routes;

/// Application state and initialization
pub mod server;

/// Backend error types
pub mod error;
