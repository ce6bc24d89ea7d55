/**
 * Error Conversion
 *
 * `IntoResponse` for backend errors so handlers can return them directly.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 400
 * }
 * ```
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("[Server] Request failed: {}", message);
        } else {
            tracing::debug!("[Server] Request rejected with {}: {}", status, message);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
