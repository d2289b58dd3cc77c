//! Relay client entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-client
//! ```
//!
//! Type `h` + Enter to send a hello to every other client, `q` to quit.
//! Everything received from the relay is logged.

use relay_client::{ClientHandler, RelayClient};
use relay_common::{try_init_tracing_with_config, AppConfig, AppError, TracingConfig};
use relay_core::ConnectionId;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Logs everything the relay sends us
struct LogHandler;

impl ClientHandler for LogHandler {
    fn on_connect(&mut self, id: &ConnectionId) {
        info!(connection_id = %id, "Connected");
    }

    fn on_message(&mut self, payload: Value) {
        info!(payload = %payload, "Received");

        if let Some(hello) = payload.get("hello").and_then(Value::as_str) {
            info!("{hello}");
        }
    }

    fn on_binary(&mut self, payload: Vec<u8>) {
        info!(bytes = payload.len(), "Received binary");
    }

    fn on_disconnect(&mut self) {
        info!("Disconnected");
    }
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(AppError::from(e).exit_code());
        }
    };

    if let Err(e) = try_init_tracing_with_config(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Client failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(url = %config.client.url, "Connecting to relay...");
    let client = RelayClient::connect(config.client, LogHandler).await?;

    info!("Press h + Enter to say hello, q + Enter to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "h" => client.send(json!({ "hello": "Hello World" })),
            "q" => break,
            "" => {}
            other => info!(input = %other, "Unknown key"),
        }
    }

    client.shutdown().await?;
    Ok(())
}
