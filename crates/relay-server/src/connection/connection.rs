//! Individual relay connection
//!
//! Binds a connection id to the queue drained by that connection's writer task.

use relay_core::{CloseCode, ConnectionId, RelayFrame};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Item queued for a connection's writer task
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Encode and write a text frame
    Frame(RelayFrame),
    /// Write a binary frame as-is
    Binary(Vec<u8>),
    /// Send a close frame and stop writing
    Close(CloseCode),
}

/// Sending half of a connection's outbound queue
///
/// Unbounded: the relay never waits on a slow recipient.
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// A single registered connection
pub struct Connection {
    /// Transport-assigned identifier
    id: ConnectionId,

    /// Outbound queue
    sender: OutboundSender,

    /// Items successfully queued for this connection
    delivered: AtomicU64,
}

impl Connection {
    /// Create a new connection
    pub fn new(id: ConnectionId, sender: OutboundSender) -> Arc<Self> {
        Arc::new(Self {
            id,
            sender,
            delivered: AtomicU64::new(0),
        })
    }

    /// Get the connection id
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Queue an item for this connection without waiting
    ///
    /// Fails only when the writer side has gone away.
    pub fn enqueue(&self, item: Outbound) -> Result<(), mpsc::error::SendError<Outbound>> {
        self.sender.send(item)?;
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Ask the writer task to close the socket with `code`
    pub fn close(&self, code: CloseCode) -> Result<(), mpsc::error::SendError<Outbound>> {
        self.sender.send(Outbound::Close(code))
    }

    /// Number of items queued for this connection so far
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("delivered", &self.delivered())
            .finish()
    }
}
