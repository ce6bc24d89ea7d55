//! Backend Error Module
//!
//! Error types for the server side: store connectivity, connection
//! handshakes, and HTTP handlers.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse for BackendError
//! ```
//!
//! # Error Types
//!
//! - `StoreError` - Persistent-store connection failures
//! - `LifecycleError` - Rejected real-time handshakes
//! - `BackendError` - Everything an HTTP handler can return

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::{BackendError, LifecycleError, StoreError};
