//! Test helpers for integration tests
//!
//! Provides utilities for spawning relay servers on ephemeral ports and
//! driving them with raw WebSocket clients.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use relay_common::RelayConfig;
use relay_core::{CloseCode, ConnectionId, RelayFrame, RELAY_PATH};
use relay_server::{create_app, serve, RelayState};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Upper bound for anything a test waits on
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// How long a test listens to conclude that nothing arrives
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Relay server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    state: RelayState,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a relay with message logging disabled
    pub async fn start() -> Result<Self> {
        Self::start_with(RelayConfig::default(), None).await
    }

    /// Start a relay with custom configuration
    pub async fn start_with(config: RelayConfig, static_dir: Option<&Path>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = RelayState::new(config);
        let app = create_app(state.clone(), static_dir);

        let handle = tokio::spawn(async move {
            serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// WebSocket URL of the relay endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, RELAY_PATH)
    }

    /// Get base URL for HTTP requests
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(reqwest::get(&url).await?)
    }

    /// Number of connections the relay currently tracks
    pub fn connection_count(&self) -> usize {
        self.state.registry().len()
    }

    /// Check if the relay tracks `id`
    pub fn is_registered(&self, id: &ConnectionId) -> bool {
        self.state.registry().contains(id)
    }

    /// Wait until the relay tracks exactly `count` connections
    pub async fn wait_for_connections(&self, count: usize) -> Result<()> {
        wait_until(|| self.connection_count() == count)
            .await
            .map_err(|_| anyhow!("expected {count} connections, have {}", self.connection_count()))
    }

    /// Stop accepting new connections
    ///
    /// Connections that are already open keep running.
    pub async fn stop_accepting(&self) {
        self.handle.abort();
        let addr = self.addr;
        wait_until(|| std::net::TcpStream::connect(addr).is_err())
            .await
            .ok();
    }

    /// Close `id` from the server side with `code`
    pub fn kick(&self, id: &ConnectionId, code: CloseCode) -> Result<()> {
        let connection = self
            .state
            .registry()
            .get(id)
            .ok_or_else(|| anyhow!("{id} is not registered"))?;
        connection
            .close(code)
            .map_err(|_| anyhow!("{id} already closed"))
    }

    /// Connect a raw WebSocket client
    pub async fn connect(&self) -> Result<WsClient> {
        WsClient::connect(&self.ws_url()).await
    }
}

/// Poll `condition` until it holds or [`TIMEOUT`] passes
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> Result<()> {
    tokio::time::timeout(TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .map_err(|_| anyhow!("condition not met within {TIMEOUT:?}"))
}

/// Raw WebSocket client speaking the relay frame format
pub struct WsClient {
    pub id: ConnectionId,
    ws: WsStream,
}

impl WsClient {
    /// Connect and read the relay's `connect` frame
    pub async fn connect(url: &str) -> Result<Self> {
        let (mut ws, _) = connect_async(url).await?;

        let first = tokio::time::timeout(TIMEOUT, ws.next())
            .await?
            .ok_or_else(|| anyhow!("closed before connect frame"))??;
        let text = match first {
            Message::Text(text) => text,
            other => bail!("expected text frame, got {other:?}"),
        };
        let id = RelayFrame::from_json(&text)?
            .as_connect()
            .ok_or_else(|| anyhow!("expected connect frame, got {text}"))?
            .id;

        Ok(Self { id, ws })
    }

    /// Send a payload as a `message` frame
    pub async fn send(&mut self, payload: Value) -> Result<()> {
        self.send_text(&RelayFrame::message(payload).to_json()?).await
    }

    /// Send a raw text frame
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a raw binary frame
    pub async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.ws.send(Message::Binary(bytes)).await?;
        Ok(())
    }

    /// Receive the next relayed payload
    pub async fn recv(&mut self) -> Result<Value> {
        self.try_recv(TIMEOUT)
            .await?
            .ok_or_else(|| anyhow!("no message within {TIMEOUT:?}"))
    }

    /// Receive the next relayed payload if one arrives within `wait`
    pub async fn try_recv(&mut self, wait: Duration) -> Result<Option<Value>> {
        let Some(text) = self.try_recv_text(wait).await? else {
            return Ok(None);
        };

        RelayFrame::from_json(&text)?
            .into_message()
            .map(Some)
            .ok_or_else(|| anyhow!("expected message frame, got {text}"))
    }

    /// Receive the next text frame exactly as the relay wrote it
    pub async fn recv_raw(&mut self) -> Result<String> {
        self.try_recv_text(TIMEOUT)
            .await?
            .ok_or_else(|| anyhow!("no message within {TIMEOUT:?}"))
    }

    /// Receive the next binary frame
    pub async fn recv_binary(&mut self) -> Result<Vec<u8>> {
        match self.next_frame(TIMEOUT).await? {
            Some(Message::Binary(bytes)) => Ok(bytes),
            Some(other) => bail!("expected binary frame, got {other:?}"),
            None => bail!("no message within {TIMEOUT:?}"),
        }
    }

    async fn try_recv_text(&mut self, wait: Duration) -> Result<Option<String>> {
        match self.next_frame(wait).await? {
            Some(Message::Text(text)) => Ok(Some(text)),
            Some(other) => bail!("unexpected frame: {other:?}"),
            None => Ok(None),
        }
    }

    async fn next_frame(&mut self, wait: Duration) -> Result<Option<Message>> {
        let next = match tokio::time::timeout(wait, self.ws.next()).await {
            Ok(next) => next,
            Err(_) => return Ok(None),
        };

        match next {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(e)) => Err(e.into()),
            None => bail!("connection closed"),
        }
    }

    /// Assert nothing arrives during [`QUIET_PERIOD`]
    pub async fn expect_silence(&mut self) -> Result<()> {
        match self.try_recv(QUIET_PERIOD).await? {
            None => Ok(()),
            Some(payload) => bail!("expected silence, received {payload}"),
        }
    }

    /// Wait for the server to close the connection and return its close code
    pub async fn recv_close_code(&mut self) -> Result<Option<u16>> {
        loop {
            let next = tokio::time::timeout(TIMEOUT, self.ws.next()).await?;
            match next {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
