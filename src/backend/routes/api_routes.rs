/**
 * API Route Handlers
 *
 * # Routes
 *
 * - `GET /health` - store reachability (`OK`/`ERROR`)
 * - `GET /api/presence` - current online user identities
 * - `POST /api/messages/{receiver}` - best-effort live delivery of a message
 *
 * Message persistence is handled upstream; the delivery endpoint only pushes
 * to the receiver's live connection if there is one.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::backend::error::{BackendError, StoreError};
use crate::backend::presence::registry::PresenceRegistry;
use crate::backend::realtime::broadcast::BroadcastDispatcher;
use crate::backend::server::state::{AppState, SharedStoreHealth};
use crate::shared::{ChatMessage, UserIdentity};

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/health", get(health_check))
        .route("/api/presence", get(get_presence))
        .route("/api/messages/{receiver}", post(send_message))
}

/// Handle health check (GET /health)
///
/// Reports `200 {"status":"OK","database":"connected"}` only when the store
/// manager is connected and a liveness probe succeeds.
pub async fn health_check(State(store): State<SharedStoreHealth>) -> (StatusCode, Json<Value>) {
    let result = if store.is_ready() {
        store.probe().await
    } else {
        Err(StoreError::NotReady)
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "OK", "database": "connected" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "[Health] Store check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "ERROR", "error": e.to_string() })),
            )
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresenceResponse {
    pub online: Vec<UserIdentity>,
}

/// Handle presence listing (GET /api/presence)
pub async fn get_presence(State(registry): State<Arc<PresenceRegistry>>) -> Json<PresenceResponse> {
    Json(PresenceResponse {
        online: registry.snapshot(),
    })
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub delivered: bool,
    pub message: ChatMessage,
}

/// Handle live message delivery (POST /api/messages/{receiver})
///
/// Responds `202 Accepted` whether or not the receiver is online; the
/// `delivered` flag says whether a live connection received it.
pub async fn send_message(
    State(dispatcher): State<BroadcastDispatcher>,
    Path(receiver): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), BackendError> {
    let sender = UserIdentity::parse(&request.sender)?;
    let receiver = UserIdentity::parse(&receiver)?;
    let message = ChatMessage::new(sender, receiver.clone(), request.text)?;

    let outcome = dispatcher.deliver_to(&receiver, message.clone());

    Ok((
        StatusCode::ACCEPTED,
        Json(SendMessageResponse {
            delivered: outcome.is_delivered(),
            message,
        }),
    ))
}
