//! Protocol error types

use super::CloseCode;
use thiserror::Error;

/// Errors raised while encoding or decoding relay frames
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame could not be decoded as a relay envelope
    #[error("Failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    /// Frame could not be encoded
    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// Client sent an event only the server may send
    #[error("Event not allowed from client: {0}")]
    ServerOnlyEvent(super::RelayEvent),
}

impl ProtocolError {
    /// Close code the server answers this error with
    #[must_use]
    pub fn to_close_code(&self) -> CloseCode {
        match self {
            Self::Decode(_) => CloseCode::DecodeError,
            Self::ServerOnlyEvent(_) => CloseCode::UnknownEvent,
            Self::Encode(_) => CloseCode::UnknownError,
        }
    }
}
