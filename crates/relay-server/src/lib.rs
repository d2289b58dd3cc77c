//! # relay-server
//!
//! WebSocket relay: every message a client sends is forwarded, unchanged, to
//! every other connected client.

pub mod connection;
pub mod relay;
pub mod server;

pub use connection::{Connection, ConnectionRegistry, Outbound, OutboundSender};
pub use relay::{DeliveryReport, Relay, RelayHandler};
pub use server::{create_app, create_router, run, serve, RelayState};
