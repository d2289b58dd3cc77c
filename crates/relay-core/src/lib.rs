//! # relay-core
//!
//! Wire protocol shared by the relay server and its clients: the frame envelope,
//! event kinds, close codes and connection identifiers.
//! This crate has no dependency on any transport.

pub mod connection_id;
pub mod protocol;

// Re-export commonly used types at crate root
pub use connection_id::ConnectionId;
pub use protocol::{CloseCode, ConnectPayload, ProtocolError, RelayEvent, RelayFrame};

/// Path the relay serves its WebSocket endpoint on
pub const RELAY_PATH: &str = "/relay";

/// Port the relay listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 3000;
