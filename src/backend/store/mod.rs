//! Persistent Store Module
//!
//! Keeps the process-wide link to the persistent store alive. The CRUD
//! layer that consumes the link lives outside this crate; the health check
//! reads readiness through [`StoreHealth`].
//!
//! # Module Structure
//!
//! ```text
//! store/
//! ├── mod.rs       - Module exports and documentation
//! ├── backoff.rs   - Delayed, cancellable retry scheduling
//! ├── state.rs     - Disconnected/Connecting/Connected state machine
//! ├── connector.rs - Driver seam and the PostgreSQL connector
//! └── manager.rs   - Retry, reconnect, readiness, and fatal signalling
//! ```

pub mod backoff;
pub mod state;
pub mod connector;
pub mod manager;

pub use backoff::{BackoffScheduler, ScheduledRetry};
pub use state::{FailureOutcome, StoreConnectionState, StorePhase};
pub use connector::{PgConnector, StoreConnector, StoreOptions};
pub use manager::{RetryPolicy, StoreConnectionManager, StoreHealth};
