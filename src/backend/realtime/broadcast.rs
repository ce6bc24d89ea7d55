/**
 * Broadcast Dispatcher
 *
 * Fans presence snapshots out to every open connection and routes directed
 * events to the one connection currently registered for a user.
 *
 * # Channels
 *
 * - Presence snapshots go through a `tokio::sync::broadcast` channel; every
 *   open connection holds a receiver. A lagging receiver skips stale
 *   snapshots, which is harmless because each snapshot is the full online
 *   set.
 * - Directed events go through a per-connection `mpsc` sender keyed by
 *   `ConnectionId`, so delivery follows the registry's current mapping and
 *   never reaches a superseded or foreign connection.
 *
 * Frames are encoded once and shared as `Arc<str>`.
 */

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::backend::presence::registry::PresenceRegistry;
use crate::shared::event::PRESENCE_CHANGED;
use crate::shared::{ChatMessage, ConnectionId, ServerEvent, UserIdentity};

/// An encoded event ready to be written to a socket
pub type Frame = Arc<str>;

/// Default capacity of the presence broadcast channel
pub const PRESENCE_CHANNEL_CAPACITY: usize = 256;

/// Receiving side of one connection's outbound traffic
#[derive(Debug)]
pub struct Outbox {
    pub presence: broadcast::Receiver<Frame>,
    pub direct: mpsc::UnboundedReceiver<Frame>,
}

/// Result of a directed delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Queued on the user's live connection
    Delivered(ConnectionId),
    /// No live connection; dropped at the real-time layer
    Offline,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

struct DispatcherInner {
    registry: Arc<PresenceRegistry>,
    presence_tx: broadcast::Sender<Frame>,
    outboxes: DashMap<ConnectionId, mpsc::UnboundedSender<Frame>>,
}

/// Shared handle to the dispatcher; clones share the same channels
#[derive(Clone)]
pub struct BroadcastDispatcher {
    inner: Arc<DispatcherInner>,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        Self::with_capacity(registry, PRESENCE_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(registry: Arc<PresenceRegistry>, capacity: usize) -> Self {
        let (presence_tx, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(DispatcherInner {
                registry,
                presence_tx,
                outboxes: DashMap::new(),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.inner.registry
    }

    /// Open the outbound channels for a connection
    pub fn attach(&self, connection: ConnectionId) -> Outbox {
        let (direct_tx, direct) = mpsc::unbounded_channel();
        self.inner.outboxes.insert(connection, direct_tx);
        Outbox {
            presence: self.inner.presence_tx.subscribe(),
            direct,
        }
    }

    /// Close the directed channel for a connection
    pub fn detach(&self, connection: ConnectionId) {
        self.inner.outboxes.remove(&connection);
    }

    /// Number of attached connections
    pub fn open_connections(&self) -> usize {
        self.inner.outboxes.len()
    }

    /// Encode the current presence snapshot
    pub fn presence_frame(&self) -> Option<Frame> {
        let event = ServerEvent::PresenceChanged(self.inner.registry.snapshot());
        match event.to_frame() {
            Ok(frame) => Some(Frame::from(frame)),
            Err(e) => {
                tracing::error!(event = event.name(), "[Realtime] Failed to encode presence snapshot: {}", e);
                None
            }
        }
    }

    /// Send the current online set to every open connection
    ///
    /// Returns the number of receivers the snapshot was queued for.
    pub fn broadcast_presence(&self) -> usize {
        let Some(frame) = self.presence_frame() else {
            return 0;
        };

        match self.inner.presence_tx.send(frame) {
            Ok(receivers) => {
                tracing::debug!(
                    event = PRESENCE_CHANGED,
                    receivers,
                    online = self.inner.registry.len(),
                    "[Realtime] Presence snapshot broadcast"
                );
                receivers
            }
            Err(_) => {
                tracing::debug!("[Realtime] No connections to receive presence snapshot");
                0
            }
        }
    }

    /// Deliver a message to the connection currently registered for `user`
    pub fn deliver_to(&self, user: &UserIdentity, message: ChatMessage) -> DeliveryOutcome {
        let Some(connection) = self.inner.registry.connection_for(user) else {
            tracing::debug!(user = %user, "[Realtime] Recipient offline, live delivery dropped");
            return DeliveryOutcome::Offline;
        };

        let event = ServerEvent::MessageDelivered(message);
        let frame = match event.to_frame() {
            Ok(frame) => Frame::from(frame),
            Err(e) => {
                tracing::error!(event = event.name(), "[Realtime] Failed to encode event: {}", e);
                return DeliveryOutcome::Offline;
            }
        };

        let sent = self
            .inner
            .outboxes
            .get(&connection)
            .map(|tx| tx.send(frame).is_ok())
            .unwrap_or(false);

        if sent {
            tracing::debug!(
                event = event.name(),
                user = %user,
                connection = %connection,
                "[Realtime] Message delivered"
            );
            DeliveryOutcome::Delivered(connection)
        } else {
            tracing::debug!(user = %user, connection = %connection, "[Realtime] Connection gone, live delivery dropped");
            DeliveryOutcome::Offline
        }
    }
}
