/**
 * Router Configuration
 *
 * Combines the WebSocket endpoint and the API routes into one Axum router
 * and applies the middleware stack (request tracing, CORS).
 */

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::realtime::socket::handle_socket_upgrade;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// - `GET /ws?userId=...` - real-time connection
/// - `GET /health` - store reachability
/// - `GET /api/presence` - online users
/// - `POST /api/messages/{receiver}` - live message delivery
///
/// Unknown routes fall through to a plain 404.
pub fn create_router(app_state: AppState, cors: CorsLayer) -> Router<()> {
    let router = Router::new().route("/ws", get(handle_socket_upgrade));

    let router = configure_api_routes(router);

    let router = router.fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") });

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state)
}
