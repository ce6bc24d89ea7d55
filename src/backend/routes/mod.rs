//! Route Configuration Module
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs        - Module exports and documentation
//! ├── router.rs     - Router assembly and middleware
//! └── api_routes.rs - Health, presence, and message delivery handlers
//! ```

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
