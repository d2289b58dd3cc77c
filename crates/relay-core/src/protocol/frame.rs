//! Relay frame format
//!
//! Every WebSocket text frame is a JSON object `{"event": ..., "data": ...}`.
//! `data` is opaque to the relay and may be any JSON value.

use super::{ProtocolError, RelayEvent};
use crate::ConnectionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Relay frame envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayFrame {
    /// Event name
    pub event: RelayEvent,

    /// Event payload, `null` when absent
    #[serde(default)]
    pub data: Value,
}

/// Payload of the `connect` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectPayload {
    /// Identifier the server assigned to this connection
    pub id: ConnectionId,
}

impl RelayFrame {
    /// Create a `message` frame carrying an opaque payload
    #[must_use]
    pub fn message(data: Value) -> Self {
        Self {
            event: RelayEvent::Message,
            data,
        }
    }

    /// Create the `connect` frame announcing a connection id
    #[must_use]
    pub fn connect(id: &ConnectionId) -> Self {
        Self {
            event: RelayEvent::Connect,
            data: serde_json::json!({ "id": id }),
        }
    }

    /// Try to read the `connect` payload
    pub fn as_connect(&self) -> Option<ConnectPayload> {
        if self.event != RelayEvent::Connect {
            return None;
        }
        serde_json::from_value(self.data.clone()).ok()
    }

    /// Consume the frame and return the payload if this is a `message`
    pub fn into_message(self) -> Option<Value> {
        match self.event {
            RelayEvent::Message => Some(self.data),
            RelayEvent::Connect => None,
        }
    }

    /// Decode a frame sent by a client, rejecting server-only events
    pub fn from_client_json(json: &str) -> Result<Self, ProtocolError> {
        let frame = Self::from_json(json)?;
        if !frame.event.is_client_event() {
            return Err(ProtocolError::ServerOnlyEvent(frame.event));
        }
        Ok(frame)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(ProtocolError::Decode)
    }
}

impl std::fmt::Display for RelayFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RelayFrame(event={})", self.event)
    }
}
