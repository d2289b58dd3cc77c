//! Connection registry
//!
//! The live set of open client links, keyed by connection id. Uses `DashMap`
//! so the per-connection tasks can register and unregister concurrently.

use super::{Connection, OutboundSender};
use dashmap::DashMap;
use relay_core::ConnectionId;
use std::sync::Arc;

/// Registry of live connections
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<Connection>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Create an empty registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a connection
    ///
    /// Re-registering an id replaces the previous entry.
    pub fn register(&self, id: ConnectionId, sender: OutboundSender) -> Arc<Connection> {
        let connection = Connection::new(id.clone(), sender);
        if self.connections.insert(id.clone(), connection.clone()).is_some() {
            tracing::warn!(connection_id = %id, "Connection id registered twice, replacing");
        }

        tracing::debug!(connection_id = %id, "Connection registered");

        connection
    }

    /// Remove a connection, returning it if it was registered
    pub fn unregister(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        let removed = self.connections.remove(id).map(|(_, connection)| connection);

        if removed.is_some() {
            tracing::debug!(connection_id = %id, "Connection unregistered");
        }

        removed
    }

    /// Get a connection by id
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|r| r.clone())
    }

    /// Check if a connection is registered
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    /// Snapshot of every registered connection except `sender`
    ///
    /// Taken fresh per message; the guard on each shard is released before
    /// the caller starts delivering.
    pub fn recipients_except(&self, sender: &ConnectionId) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .filter(|entry| entry.key() != sender)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Get all registered ids
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|r| r.key().clone()).collect()
    }

    /// Get the number of live connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if no connection is registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .finish()
    }
}
