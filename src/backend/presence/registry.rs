//! Presence registry.
//!
//! Maps each online user to the one connection that currently represents
//! them. A user is present iff their most recently associated connection has
//! not been released by its own close.

use dashmap::DashMap;

use crate::shared::identity::{ConnectionId, UserIdentity};

#[derive(Debug, Default)]
pub struct PresenceRegistry {
    live: DashMap<UserIdentity, ConnectionId>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `user` to `connection`, replacing any previous mapping.
    ///
    /// Returns the replaced connection so callers can tell a superseded
    /// session apart from a fresh one.
    pub fn associate(&self, user: UserIdentity, connection: ConnectionId) -> Option<ConnectionId> {
        self.live.insert(user, connection)
    }

    /// Remove `user` only if it is still mapped to `connection`.
    ///
    /// A close event from a connection that has since been replaced is a
    /// no-op. Returns true if an entry was removed.
    pub fn release(&self, user: &UserIdentity, connection: ConnectionId) -> bool {
        self.live
            .remove_if(user, |_, current| *current == connection)
            .is_some()
    }

    /// Online users, sorted so identical membership yields identical output
    pub fn snapshot(&self) -> Vec<UserIdentity> {
        let mut online: Vec<UserIdentity> = self.live.iter().map(|entry| entry.key().clone()).collect();
        online.sort();
        online
    }

    pub fn connection_for(&self, user: &UserIdentity) -> Option<ConnectionId> {
        self.live.get(user).map(|entry| *entry.value())
    }

    pub fn is_online(&self, user: &UserIdentity) -> bool {
        self.live.contains_key(user)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
