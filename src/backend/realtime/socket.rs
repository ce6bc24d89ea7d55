/**
 * WebSocket Transport
 *
 * `GET /ws?userId=<identity>` upgrades to a WebSocket and runs one
 * connection task:
 *
 * - The handshake goes through `ConnectionLifecycle::open`. A missing or
 *   invalid `userId` gets the socket closed with code 4001 and nothing else.
 * - A writer task forwards presence snapshots and directed events from the
 *   connection's `Outbox` to the socket sink.
 * - The reader loop watches for the client closing, a transport error, or
 *   the stream ending; any of them ends the connection and closes the
 *   lifecycle.
 *
 * Inbound text from clients is not part of the protocol and is ignored.
 */

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{
    stream::SplitSink,
    SinkExt, StreamExt,
};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::backend::presence::lifecycle::ConnectionLifecycle;
use crate::backend::realtime::broadcast::{BroadcastDispatcher, Outbox};

/// Close code sent when the handshake identity is missing or invalid
pub const CLOSE_IDENTITY_REJECTED: u16 = 4001;

/// Handshake query parameters
#[derive(Debug, Deserialize)]
pub struct HandshakeQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Handle WebSocket upgrade (GET /ws)
pub async fn handle_socket_upgrade(
    State(dispatcher): State<BroadcastDispatcher>,
    Query(query): Query<HandshakeQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, dispatcher, query.user_id))
}

/// Drive one real-time connection from handshake to close
pub async fn run_connection(socket: WebSocket, dispatcher: BroadcastDispatcher, claimed: Option<String>) {
    let mut lifecycle = ConnectionLifecycle::new(dispatcher);

    let outbox = match lifecycle.open(claimed.as_deref()) {
        Ok(outbox) => outbox,
        Err(e) => {
            let mut socket = socket;
            let close_frame = CloseFrame {
                code: CLOSE_IDENTITY_REJECTED,
                reason: e.to_string().into(),
            };
            let _ = socket.send(Message::Close(Some(close_frame))).await;
            return;
        }
    };

    let connection = lifecycle.connection_id();
    let (sink, mut stream) = socket.split();
    let mut writer = tokio::spawn(writer_task(sink, outbox));

    loop {
        tokio::select! {
            _ = &mut writer => {
                tracing::debug!(connection = %connection, "[Realtime] Writer finished");
                break;
            }
            received = stream.next() => match received {
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(connection = %connection, reason = ?frame, "[Realtime] Client closed connection");
                    break;
                }
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!(
                        connection = %connection,
                        "[Realtime] Ignoring inbound text: {}",
                        text.as_str().chars().take(100).collect::<String>()
                    );
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(connection = %connection, error = %e, "[Realtime] WebSocket receive error");
                    break;
                }
                None => {
                    tracing::info!(connection = %connection, "[Realtime] WebSocket stream ended");
                    break;
                }
            }
        }
    }

    writer.abort();
    let outcome = lifecycle.close();
    tracing::debug!(connection = %connection, ?outcome, "[Realtime] Connection closed");
}

async fn writer_task(mut sink: SplitSink<WebSocket, Message>, outbox: Outbox) {
    let Outbox {
        mut presence,
        mut direct,
    } = outbox;

    loop {
        let frame = tokio::select! {
            received = presence.recv() => match received {
                Ok(frame) => frame,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Realtime] Receiver lagged, skipped {} snapshots", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            received = direct.recv() => match received {
                Some(frame) => frame,
                None => break,
            },
        };

        if sink.send(Message::Text(frame.as_ref().into())).await.is_err() {
            break;
        }
    }
}
