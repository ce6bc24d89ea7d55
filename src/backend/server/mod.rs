//! Server Module
//!
//! Application state, configuration mapping, and initialization.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and FromRef implementations
//! ├── config.rs - Store options, retry policy, and CORS from AppConfig
//! └── init.rs   - create_app
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Store manager**: created disconnected, liveness monitor started
//! 2. **Presence**: registry and broadcast dispatcher created
//! 3. **Router**: routes and middleware configured
//! 4. **Connect**: the binary starts the first store attempt once listening

/// Application state management
pub mod state;

/// Server configuration mapping
pub mod config;

/// Server initialization
pub mod init;

pub use state::AppState;
pub use init::{create_app, App};
