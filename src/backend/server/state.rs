/**
 * Application State Management
 *
 * `AppState` is the router state shared by every handler. It holds handles,
 * never the data itself:
 *
 * - `registry` - the presence registry (`Arc`, read by `/api/presence`)
 * - `dispatcher` - the broadcast dispatcher (cloned into each WebSocket task)
 * - `store` - readiness surface of the store connection manager
 *
 * # State Extraction
 *
 * `FromRef` implementations let handlers extract just the part they need:
 *
 * ```rust,ignore
 * async fn handler(State(dispatcher): State<BroadcastDispatcher>) {
 *     dispatcher.broadcast_presence();
 * }
 * ```
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::presence::registry::PresenceRegistry;
use crate::backend::realtime::broadcast::BroadcastDispatcher;
use crate::backend::store::StoreHealth;

/// Shared handle to the store's readiness surface
pub type SharedStoreHealth = Arc<dyn StoreHealth>;

#[derive(Clone)]
pub struct AppState {
    /// Online users and their live connections
    pub registry: Arc<PresenceRegistry>,

    /// Presence fan-out and directed delivery
    pub dispatcher: BroadcastDispatcher,

    /// Consumed by the health check
    pub store: SharedStoreHealth,
}

impl AppState {
    /// Build state around a fresh registry and dispatcher
    pub fn new(store: SharedStoreHealth) -> Self {
        let registry = Arc::new(PresenceRegistry::new());
        let dispatcher = BroadcastDispatcher::new(registry.clone());
        Self {
            registry,
            dispatcher,
            store,
        }
    }
}

impl FromRef<AppState> for Arc<PresenceRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for BroadcastDispatcher {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.dispatcher.clone()
    }
}

impl FromRef<AppState> for SharedStoreHealth {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}
