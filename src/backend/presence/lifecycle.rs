//! Connection lifecycle.
//!
//! One `ConnectionLifecycle` per real-time connection, driving
//! `Handshaking -> Associated -> Closed`:
//!
//! - `open` validates the claimed identity, attaches the connection's
//!   outbound channels, registers it, and broadcasts presence. An invalid
//!   identity goes straight to `Closed` with no side effects.
//! - `close` releases the registry entry only if it still belongs to this
//!   connection, and broadcasts only when something was actually removed.
//!
//! Dropping a lifecycle closes it, so a cancelled connection task still
//! releases its presence.

use crate::backend::error::LifecycleError;
use crate::backend::realtime::broadcast::{BroadcastDispatcher, Outbox};
use crate::shared::{ConnectionId, LiveConnection, SharedError, UserIdentity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    Handshaking,
    Associated(LiveConnection),
    Closed,
}

/// What `close` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// This connection was the live mapping and has been removed
    Released,
    /// A newer connection for the same user owns the mapping
    Stale,
    /// Closed before a successful handshake
    NotAssociated,
    AlreadyClosed,
}

pub struct ConnectionLifecycle {
    connection_id: ConnectionId,
    phase: LifecyclePhase,
    dispatcher: BroadcastDispatcher,
}

impl ConnectionLifecycle {
    pub fn new(dispatcher: BroadcastDispatcher) -> Self {
        Self::with_id(ConnectionId::new(), dispatcher)
    }

    pub fn with_id(connection_id: ConnectionId, dispatcher: BroadcastDispatcher) -> Self {
        Self {
            connection_id,
            phase: LifecyclePhase::Handshaking,
            dispatcher,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn phase(&self) -> &LifecyclePhase {
        &self.phase
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        match &self.phase {
            LifecyclePhase::Associated(live) => Some(&live.user),
            _ => None,
        }
    }

    /// Complete the handshake with the identity supplied by the transport
    pub fn open(&mut self, claimed: Option<&str>) -> Result<Outbox, LifecycleError> {
        if self.phase != LifecyclePhase::Handshaking {
            return Err(LifecycleError::AlreadyOpened);
        }

        let parsed = match claimed {
            Some(raw) => UserIdentity::parse(raw),
            None => Err(SharedError::validation("userId", "identity is missing")),
        };
        let user = match parsed {
            Ok(user) => user,
            Err(e) => {
                self.phase = LifecyclePhase::Closed;
                tracing::warn!(connection = %self.connection_id, error = %e, "[Presence] Handshake rejected");
                return Err(LifecycleError::Rejected(e));
            }
        };

        let outbox = self.dispatcher.attach(self.connection_id);
        let previous = self
            .dispatcher
            .registry()
            .associate(user.clone(), self.connection_id);

        match previous {
            Some(superseded) => tracing::info!(
                user = %user,
                connection = %self.connection_id,
                superseded = %superseded,
                "[Presence] User reconnected, replacing previous connection"
            ),
            None => tracing::info!(
                user = %user,
                connection = %self.connection_id,
                "[Presence] User connected"
            ),
        }

        self.phase = LifecyclePhase::Associated(LiveConnection::new(self.connection_id, user));
        self.dispatcher.broadcast_presence();

        Ok(outbox)
    }

    /// Tear the connection down; safe to call more than once
    pub fn close(&mut self) -> CloseOutcome {
        match std::mem::replace(&mut self.phase, LifecyclePhase::Closed) {
            LifecyclePhase::Closed => CloseOutcome::AlreadyClosed,
            LifecyclePhase::Handshaking => CloseOutcome::NotAssociated,
            LifecyclePhase::Associated(live) => {
                self.dispatcher.detach(self.connection_id);
                let released = self
                    .dispatcher
                    .registry()
                    .release(&live.user, self.connection_id);

                if released {
                    tracing::info!(user = %live.user, connection = %self.connection_id, "[Presence] User disconnected");
                    self.dispatcher.broadcast_presence();
                    CloseOutcome::Released
                } else {
                    tracing::debug!(
                        user = %live.user,
                        connection = %self.connection_id,
                        "[Presence] Superseded connection closed, presence unchanged"
                    );
                    CloseOutcome::Stale
                }
            }
        }
    }
}

impl Drop for ConnectionLifecycle {
    fn drop(&mut self) {
        self.close();
    }
}
