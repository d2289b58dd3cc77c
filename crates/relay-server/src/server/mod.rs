//! Relay server setup
//!
//! Provides the router, listener binding and the serve loop.

mod handler;
mod state;

pub use handler::relay_handler;
pub use state::RelayState;

use axum::{routing::get, Router};
use relay_common::{AppConfig, AppError, AppResult};
use relay_core::RELAY_PATH;
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the relay router
pub fn create_router() -> Router<RelayState> {
    Router::new()
        .route(RELAY_PATH, get(relay_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
///
/// With `static_dir`, every path other than the relay and health routes is
/// served from that directory.
pub fn create_app(state: RelayState, static_dir: Option<&Path>) -> Router {
    let router = match static_dir {
        Some(dir) => create_router().fallback_service(ServeDir::new(dir)),
        None => create_router(),
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serve the application on an already bound listener until shutdown
pub async fn serve(listener: TcpListener, app: Router) -> AppResult<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)
}

/// Run the relay server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let addr = config.server.address();

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::bind(addr.clone(), e))?;

    tracing::info!(
        log_messages = config.relay.log_messages,
        "Relay listening on ws://{}{}",
        addr,
        RELAY_PATH
    );

    if let Some(dir) = &config.server.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static assets");
    }

    let state = RelayState::new(config.relay);
    let app = create_app(state, config.server.static_dir.as_deref());

    serve(listener, app).await
}

/// Resolve when the process receives Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
