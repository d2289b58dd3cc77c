//! # relay-client
//!
//! Client side of the relay: one persistent connection, a fire-and-forget
//! `send`, and a handler invoked for every message that arrives.

mod backoff;
mod client;
mod error;
mod handler;

pub use backoff::Backoff;
pub use client::RelayClient;
pub use error::{ClientError, ClientResult};
pub use handler::{handler_fn, ClientEvent, ClientHandler, FnHandler};
