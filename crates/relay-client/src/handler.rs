//! Client-side event handler

use relay_core::ConnectionId;
use serde_json::Value;
use tokio::sync::mpsc;

/// Callbacks invoked on the client's event loop
///
/// Called in the order the transport delivers events. Implementations must
/// return quickly: a slow callback delays every later message.
pub trait ClientHandler: Send + 'static {
    /// Connected (or reconnected) and assigned `id`
    fn on_connect(&mut self, id: &ConnectionId) {
        let _ = id;
    }

    /// A message relayed from another client
    fn on_message(&mut self, payload: Value);

    /// A binary frame relayed from another client
    fn on_binary(&mut self, payload: Vec<u8>) {
        let _ = payload;
    }

    /// Connection lost or closed
    fn on_disconnect(&mut self) {}
}

/// Lifecycle event, for handlers that forward into a channel
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connected(ConnectionId),
    Message(Value),
    Binary(Vec<u8>),
    Disconnected,
}

impl ClientHandler for mpsc::UnboundedSender<ClientEvent> {
    fn on_connect(&mut self, id: &ConnectionId) {
        let _ = self.send(ClientEvent::Connected(id.clone()));
    }

    fn on_message(&mut self, payload: Value) {
        let _ = self.send(ClientEvent::Message(payload));
    }

    fn on_binary(&mut self, payload: Vec<u8>) {
        let _ = self.send(ClientEvent::Binary(payload));
    }

    fn on_disconnect(&mut self) {
        let _ = self.send(ClientEvent::Disconnected);
    }
}

/// Handler built from a closure over received payloads
#[derive(Debug, Clone)]
pub struct FnHandler<F> {
    f: F,
}

/// Wrap a closure as a [`ClientHandler`] that only handles messages
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: FnMut(Value) + Send + 'static,
{
    FnHandler { f }
}

impl<F> ClientHandler for FnHandler<F>
where
    F: FnMut(Value) + Send + 'static,
{
    fn on_message(&mut self, payload: Value) {
        (self.f)(payload);
    }
}
