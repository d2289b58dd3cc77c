//! Lifecycle handler interface

use crate::connection::OutboundSender;
use relay_core::ConnectionId;
use serde_json::Value;

/// Outcome of relaying one message
///
/// For diagnostics only; never reported back to the sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections the message was addressed to
    pub recipients: usize,
    /// Deliveries that were queued
    pub delivered: usize,
    /// Deliveries dropped because the recipient was already gone
    pub failed: usize,
}

impl DeliveryReport {
    /// Check if every recipient got the message
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.delivered == self.recipients
    }
}

/// Handler invoked by the transport, one method per connection lifecycle event
///
/// Methods run to completion without awaiting; outbound writes are queued and
/// flushed by each connection's writer task.
pub trait RelayHandler: Send + Sync {
    /// A client completed the handshake
    fn on_connect(&self, id: ConnectionId, outbound: OutboundSender);

    /// A client sent a message
    fn on_message(&self, from: &ConnectionId, payload: Value) -> DeliveryReport;

    /// A client sent a binary frame
    fn on_binary(&self, from: &ConnectionId, payload: Vec<u8>) -> DeliveryReport;

    /// A client went away (closed, errored or was dropped by the server)
    fn on_disconnect(&self, id: &ConnectionId);
}
