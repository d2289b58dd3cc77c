//! Relay event kinds
//!
//! Every frame carries one event name. `message` flows in both directions;
//! `connect` is sent by the server only, right after the handshake.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Event carried by a relay frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayEvent {
    /// Connection accepted, carries the assigned connection id (server only)
    Connect,
    /// Opaque application payload (client/server)
    Message,
}

impl RelayEvent {
    /// Resolve an event from its wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "connect" => Some(Self::Connect),
            "message" => Some(Self::Message),
            _ => None,
        }
    }

    /// Wire name of this event
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Message => "message",
        }
    }

    /// Check if a client may send this event
    #[must_use]
    pub const fn is_client_event(self) -> bool {
        matches!(self, Self::Message)
    }
}

impl Serialize for RelayEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for RelayEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_name(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown event: {value}")))
    }
}

impl std::fmt::Display for RelayEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
