//! Relay logic
//!
//! The lifecycle interface the transport drives, and the broadcast relay
//! that implements it.

mod handler;
mod relay;

pub use handler::{DeliveryReport, RelayHandler};
pub use relay::Relay;
