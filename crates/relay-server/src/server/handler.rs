//! WebSocket handler
//!
//! Turns a WebSocket connection into `RelayHandler` lifecycle calls.

use crate::connection::Outbound;
use crate::server::RelayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use relay_core::{CloseCode, ConnectionId, RelayFrame};
use tokio::sync::mpsc;

/// WebSocket relay handler
pub async fn relay_handler(
    State(state): State<RelayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: RelayState, socket: WebSocket) {
    let id = ConnectionId::generate();

    // Outbound queue, drained by the writer task
    let (tx, rx) = mpsc::unbounded_channel::<Outbound>();

    // The first frame a client sees is its own id
    if tx.send(Outbound::Frame(RelayFrame::connect(&id))).is_err() {
        return;
    }

    // Kept to queue a close frame after the handler has dropped its sender
    let closer = tx.clone();
    state.handler().on_connect(id.clone(), tx);

    let (ws_sink, ws_stream) = socket.split();

    let mut send_task = tokio::spawn(write_loop(id.clone(), ws_sink, rx));
    let mut recv_task = tokio::spawn(read_loop(state.clone(), id.clone(), ws_stream));

    // Wait for either side to finish
    tokio::select! {
        result = &mut recv_task => {
            let close_code = result.ok().flatten();
            state.handler().on_disconnect(&id);

            if let Some(code) = close_code {
                tracing::debug!(connection_id = %id, close_code = %code, "Closing connection");
                let _ = closer.send(Outbound::Close(code));
            }
            drop(closer);

            // Flush whatever was queued before the disconnect
            let _ = send_task.await;
        }
        _ = &mut send_task => {
            tracing::debug!(connection_id = %id, "Send task ended");
            recv_task.abort();
            state.handler().on_disconnect(&id);
        }
    }
}

/// Read frames until the client goes away
///
/// Returns the close code to send when the server ends the connection.
async fn read_loop(
    state: RelayState,
    id: ConnectionId,
    mut ws_stream: SplitStream<WebSocket>,
) -> Option<CloseCode> {
    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => match RelayFrame::from_client_json(&text) {
                Ok(frame) => {
                    if let Some(payload) = frame.into_message() {
                        state.handler().on_message(&id, payload);
                    }
                }
                Err(e) => {
                    tracing::debug!(connection_id = %id, error = %e, "Rejected frame");
                    return Some(e.to_close_code());
                }
            },
            Ok(Message::Binary(bytes)) => {
                state.handler().on_binary(&id, bytes);
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Pong is handled automatically by axum
                tracing::trace!(connection_id = %id, "Ping/pong received");
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %id, "Client closed connection");
                return None;
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "WebSocket error");
                return None;
            }
        }
    }
    None
}

/// Write queued frames until the queue closes or a close is requested
async fn write_loop(
    id: ConnectionId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(item) = rx.recv().await {
        match item {
            Outbound::Frame(frame) => {
                let json = match frame.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(connection_id = %id, error = %e, "Failed to encode frame");
                        continue;
                    }
                };

                if ws_sink.send(Message::Text(json)).await.is_err() {
                    tracing::debug!(connection_id = %id, "Failed to write to WebSocket");
                    return;
                }
            }
            Outbound::Binary(bytes) => {
                if ws_sink.send(Message::Binary(bytes)).await.is_err() {
                    tracing::debug!(connection_id = %id, "Failed to write to WebSocket");
                    return;
                }
            }
            Outbound::Close(code) => {
                let frame = CloseFrame {
                    code: code.as_u16(),
                    reason: code.description().into(),
                };
                let _ = ws_sink.send(Message::Close(Some(frame))).await;
                return;
            }
        }
    }

    let _ = ws_sink.close().await;
}
