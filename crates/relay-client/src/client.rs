//! Relay client
//!
//! Owns one WebSocket connection to the relay. A single event-loop task
//! multiplexes inbound frames, queued sends and reconnects.

use crate::{Backoff, ClientError, ClientHandler, ClientResult};
use futures_util::{SinkExt, StreamExt};
use relay_common::ClientConfig;
use relay_core::{CloseCode, ConnectionId, RelayFrame};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for the relay's `connect` frame after the upgrade
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Commands from the client handle to the event loop
#[derive(Debug)]
enum Command {
    Send(Value),
    SendBinary(Vec<u8>),
    Shutdown,
}

/// Why a connected session ended
#[derive(Debug)]
enum SessionEnd {
    /// Shut down by the owner
    Shutdown,
    /// Transport dropped or relay closed the connection
    Lost,
}

/// Handle to a relay connection
#[derive(Debug)]
pub struct RelayClient {
    commands: mpsc::UnboundedSender<Command>,
    id: watch::Receiver<Option<ConnectionId>>,
    task: JoinHandle<ClientResult<()>>,
}

impl RelayClient {
    /// Connect to the relay, retrying with the default backoff
    ///
    /// Returns once the first connection is established. Fails if the
    /// reconnect budget in `config` runs out first.
    pub async fn connect<H: ClientHandler>(config: ClientConfig, handler: H) -> ClientResult<Self> {
        Self::connect_with_backoff(config, Backoff::default(), handler).await
    }

    /// Connect to the relay with a custom reconnect backoff
    pub async fn connect_with_backoff<H: ClientHandler>(
        config: ClientConfig,
        backoff: Backoff,
        handler: H,
    ) -> ClientResult<Self> {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (id_tx, mut id) = watch::channel(None);

        let task = tokio::spawn(event_loop(config, backoff, handler, command_rx, id_tx));

        // Wait for the first successful connect or for the loop to give up
        loop {
            if id.borrow_and_update().is_some() {
                break;
            }
            if id.changed().await.is_err() {
                return Err(match task.await {
                    Ok(Err(e)) => e,
                    _ => ClientError::Closed,
                });
            }
        }

        Ok(Self { commands, id, task })
    }

    /// Identifier the relay assigned to the current connection
    ///
    /// `None` while reconnecting.
    pub fn id(&self) -> Option<ConnectionId> {
        self.id.borrow().clone()
    }

    /// Check if the client currently has a live connection
    pub fn is_connected(&self) -> bool {
        self.id.borrow().is_some()
    }

    /// Send a payload to the relay for broadcast
    ///
    /// Fire-and-forget: nothing confirms delivery, and sends made while the
    /// connection is down (including while a reconnect is in progress) are
    /// dropped.
    pub fn send(&self, payload: Value) {
        self.command(Command::Send(payload));
    }

    /// Send a raw binary frame to the relay for broadcast
    ///
    /// Same delivery rules as [`RelayClient::send`].
    pub fn send_binary(&self, payload: Vec<u8>) {
        self.command(Command::SendBinary(payload));
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Client event loop gone, dropping message");
        }
    }

    /// Close the connection and stop reconnecting
    pub async fn shutdown(self) -> ClientResult<()> {
        let _ = self.commands.send(Command::Shutdown);
        self.task.await.map_err(|_| ClientError::Closed)?
    }
}

/// Connect, run the session, reconnect; until shut down or out of attempts
async fn event_loop<H: ClientHandler>(
    config: ClientConfig,
    mut backoff: Backoff,
    mut handler: H,
    mut commands: mpsc::UnboundedReceiver<Command>,
    id_tx: watch::Sender<Option<ConnectionId>>,
) -> ClientResult<()> {
    loop {
        let Some(opened) = open_dropping_sends(&config.url, &mut commands).await else {
            return Ok(());
        };

        let error = match opened {
            Ok((ws, id)) => {
                backoff.reset();
                tracing::info!(connection_id = %id, url = %config.url, "Connected to relay");
                id_tx.send_replace(Some(id.clone()));
                handler.on_connect(&id);

                let end = run_session(ws, &mut handler, &mut commands).await;

                id_tx.send_replace(None);
                handler.on_disconnect();
                tracing::info!(connection_id = %id, reason = ?end, "Disconnected from relay");

                match end {
                    SessionEnd::Shutdown => return Ok(()),
                    SessionEnd::Lost => ClientError::ConnectionLost,
                }
            }
            Err(e) => {
                tracing::warn!(url = %config.url, error = %e, "Failed to connect to relay");
                e
            }
        };

        if let Some(max) = config.max_reconnect_attempts {
            if backoff.attempts() >= max {
                tracing::warn!(attempts = backoff.attempts(), "Giving up reconnecting");
                return Err(error);
            }
        }

        let delay = backoff.next_delay();
        tracing::debug!(delay_ms = delay.as_millis(), "Reconnecting after delay");
        if !wait_disconnected(delay, &mut commands).await {
            return Ok(());
        }
    }
}

/// Open the WebSocket while dropping sends that arrive in the meantime
///
/// Returns `None` if the client was shut down before the attempt finished.
async fn open_dropping_sends(
    url: &str,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> Option<ClientResult<(WsStream, ConnectionId)>> {
    let attempt = open(url);
    tokio::pin!(attempt);

    loop {
        tokio::select! {
            result = &mut attempt => return Some(result),
            command = commands.recv() => match command {
                Some(Command::Send(_) | Command::SendBinary(_)) => {
                    tracing::debug!("Not connected, dropping message");
                }
                Some(Command::Shutdown) | None => return None,
            },
        }
    }
}

/// Open the WebSocket and wait for the relay to announce our id
async fn open(url: &str) -> ClientResult<(WsStream, ConnectionId)> {
    let (mut ws, _) = connect_async(url).await?;

    let id = tokio::time::timeout(HANDSHAKE_TIMEOUT, read_connect(&mut ws))
        .await
        .map_err(|_| ClientError::Handshake("timed out waiting for connect".to_string()))??;

    Ok((ws, id))
}

/// Read frames until the relay's `connect` frame arrives
async fn read_connect(ws: &mut WsStream) -> ClientResult<ConnectionId> {
    while let Some(msg) = ws.next().await {
        match msg? {
            Message::Text(text) => {
                let frame = RelayFrame::from_json(&text)?;
                return frame
                    .as_connect()
                    .map(|payload| payload.id)
                    .ok_or_else(|| ClientError::Handshake(format!("expected connect, got {frame}")));
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Err(ClientError::Handshake("connection closed before connect".to_string()))
}

/// Pump one connected session
async fn run_session<H: ClientHandler>(
    mut ws: WsStream,
    handler: &mut H,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> SessionEnd {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(payload)) => {
                    let json = match RelayFrame::message(payload).to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to encode message");
                            continue;
                        }
                    };
                    if ws.send(Message::Text(json)).await.is_err() {
                        return SessionEnd::Lost;
                    }
                }
                Some(Command::SendBinary(payload)) => {
                    if ws.send(Message::Binary(payload)).await.is_err() {
                        return SessionEnd::Lost;
                    }
                }
                Some(Command::Shutdown) | None => {
                    let _ = ws.close(None).await;
                    return SessionEnd::Shutdown;
                }
            },
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => match RelayFrame::from_json(&text) {
                    Ok(frame) => {
                        if let Some(payload) = frame.into_message() {
                            handler.on_message(payload);
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Ignoring undecodable frame"),
                },
                Some(Ok(Message::Binary(payload))) => handler.on_binary(payload),
                Some(Ok(Message::Close(frame))) => {
                    match frame.as_ref().and_then(|f| CloseCode::from_u16(u16::from(f.code))) {
                        Some(code) => tracing::warn!(close_code = %code, "Relay closed connection"),
                        None => tracing::debug!(frame = ?frame, "Relay closed connection"),
                    }
                    return SessionEnd::Lost;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "WebSocket error");
                    return SessionEnd::Lost;
                }
                None => return SessionEnd::Lost,
            },
        }
    }
}

/// Sleep out a reconnect delay while dropping sends
///
/// Returns `false` if the client was shut down in the meantime.
async fn wait_disconnected(delay: Duration, commands: &mut mpsc::UnboundedReceiver<Command>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            () = &mut sleep => return true,
            command = commands.recv() => match command {
                Some(Command::Send(_) | Command::SendBinary(_)) => {
                    tracing::debug!("Not connected, dropping message");
                }
                Some(Command::Shutdown) | None => return false,
            },
        }
    }
}
