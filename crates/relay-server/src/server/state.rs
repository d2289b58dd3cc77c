//! Relay server state
//!
//! Shared by every request handler.

use crate::connection::ConnectionRegistry;
use crate::relay::{Relay, RelayHandler};
use relay_common::RelayConfig;
use std::sync::Arc;

/// Relay application state
#[derive(Clone)]
pub struct RelayState {
    /// Lifecycle handler driven by the WebSocket transport
    handler: Arc<dyn RelayHandler>,
    /// Live connections
    registry: Arc<ConnectionRegistry>,
}

impl RelayState {
    /// Create state around the default broadcast relay
    pub fn new(config: RelayConfig) -> Self {
        let registry = ConnectionRegistry::new_shared();
        let relay = Relay::new(registry.clone(), config);
        Self::with_handler(Arc::new(relay), registry)
    }

    /// Create state around a custom handler
    pub fn with_handler(handler: Arc<dyn RelayHandler>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { handler, registry }
    }

    /// Get the lifecycle handler
    pub fn handler(&self) -> &dyn RelayHandler {
        self.handler.as_ref()
    }

    /// Get the connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("registry", &self.registry)
            .finish()
    }
}
