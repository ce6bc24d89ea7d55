/**
 * Server Initialization
 *
 * Wires the backend together:
 * 1. Create the store connection manager (not yet connected)
 * 2. Start its liveness monitor
 * 3. Create the presence registry and broadcast dispatcher
 * 4. Build the router with CORS and request tracing
 *
 * Connecting to the store is left to the caller so the HTTP server can be
 * listening while the first attempts run.
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{cors_layer, retry_policy, store_options};
use crate::backend::server::state::AppState;
use crate::backend::store::{PgConnector, StoreConnectionManager};
use crate::shared::AppConfig;

/// A configured application and the store manager behind it
pub struct App {
    pub router: Router<()>,
    pub state: AppState,
    pub store: StoreConnectionManager<PgConnector>,
}

/// Create and configure the application
pub fn create_app(config: &AppConfig) -> Result<App, BackendError> {
    tracing::info!("Initializing chatpulse backend server");

    let store = StoreConnectionManager::new(
        PgConnector,
        store_options(config),
        retry_policy(config),
    );
    store.spawn_liveness_monitor(config.probe_interval);

    let state = AppState::new(Arc::new(store.clone()));
    let router = create_router(state.clone(), cors_layer(config)?);

    tracing::info!(
        max_retries = config.max_retries,
        retry_base_ms = config.retry_base.as_millis() as u64,
        "Router configured with store liveness monitor"
    );

    Ok(App {
        router,
        state,
        store,
    })
}
