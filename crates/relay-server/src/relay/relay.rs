//! Broadcast relay
//!
//! Forwards each inbound message to every other registered connection.

use super::{DeliveryReport, RelayHandler};
use crate::connection::{ConnectionRegistry, Outbound, OutboundSender};
use relay_common::{RelayConfig, MESSAGE_LOG_TARGET};
use relay_core::{ConnectionId, RelayFrame};
use serde_json::Value;
use std::sync::Arc;

/// Self-excluding broadcast relay
pub struct Relay {
    registry: Arc<ConnectionRegistry>,
    config: RelayConfig,
}

impl Relay {
    /// Create a relay over a registry with fixed configuration
    pub fn new(registry: Arc<ConnectionRegistry>, config: RelayConfig) -> Self {
        Self { registry, config }
    }

    /// Get the connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Deliver `payload` to every live connection except `from`
    pub fn broadcast_except(&self, from: &ConnectionId, payload: Value) -> DeliveryReport {
        self.fan_out(from, &Outbound::Frame(RelayFrame::message(payload)))
    }

    /// Deliver raw binary `payload` to every live connection except `from`
    pub fn broadcast_binary_except(&self, from: &ConnectionId, payload: Vec<u8>) -> DeliveryReport {
        self.fan_out(from, &Outbound::Binary(payload))
    }

    /// Queue `item` for every recipient
    ///
    /// Every recipient is attempted; a recipient that went away in the
    /// meantime is counted as failed and skipped.
    fn fan_out(&self, from: &ConnectionId, item: &Outbound) -> DeliveryReport {
        let recipients = self.registry.recipients_except(from);
        let mut report = DeliveryReport {
            recipients: recipients.len(),
            ..DeliveryReport::default()
        };

        for recipient in recipients {
            match recipient.enqueue(item.clone()) {
                Ok(()) => report.delivered += 1,
                Err(_) => {
                    report.failed += 1;
                    tracing::debug!(
                        from = %from,
                        to = %recipient.id(),
                        "Recipient gone, dropping delivery"
                    );
                }
            }
        }

        tracing::trace!(
            from = %from,
            recipients = report.recipients,
            delivered = report.delivered,
            failed = report.failed,
            "Message relayed"
        );

        report
    }
}

impl RelayHandler for Relay {
    fn on_connect(&self, id: ConnectionId, outbound: OutboundSender) {
        self.registry.register(id.clone(), outbound);

        tracing::info!(
            connection_id = %id,
            connections = self.registry.len(),
            "Client connected"
        );
    }

    fn on_message(&self, from: &ConnectionId, payload: Value) -> DeliveryReport {
        if self.config.log_messages {
            tracing::info!(target: MESSAGE_LOG_TARGET, from = %from, payload = %payload, "Message");
        }

        self.broadcast_except(from, payload)
    }

    fn on_binary(&self, from: &ConnectionId, payload: Vec<u8>) -> DeliveryReport {
        if self.config.log_messages {
            tracing::info!(target: MESSAGE_LOG_TARGET, from = %from, bytes = payload.len(), "Binary message");
        }

        self.broadcast_binary_except(from, payload)
    }

    fn on_disconnect(&self, id: &ConnectionId) {
        if let Some(connection) = self.registry.unregister(id) {
            tracing::info!(
                connection_id = %id,
                delivered = connection.delivered(),
                connections = self.registry.len(),
                "Client disconnected"
            );
        }
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
