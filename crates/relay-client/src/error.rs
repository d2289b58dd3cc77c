//! Client error types

use relay_core::ProtocolError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// WebSocket connection could not be established
    #[error("Failed to connect: {0}")]
    Connect(#[source] Box<tungstenite::Error>),

    /// Connected, but the relay never announced a connection id
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Relay sent something that is not a relay frame
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Connection lost and the reconnect budget is spent
    #[error("Connection lost")]
    ConnectionLost,

    /// Event loop is gone
    #[error("Client closed")]
    Closed,
}

impl From<tungstenite::Error> for ClientError {
    fn from(err: tungstenite::Error) -> Self {
        Self::Connect(Box::new(err))
    }
}

/// Client result type
pub type ClientResult<T> = Result<T, ClientError>;
