//! Relay protocol definitions
//!
//! Defines the JSON frame envelope, event kinds and close codes.

mod close_codes;
mod error;
mod events;
mod frame;

pub use close_codes::CloseCode;
pub use error::ProtocolError;
pub use events::RelayEvent;
pub use frame::{ConnectPayload, RelayFrame};
