//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ClientConfig, ConfigError, Environment, RelayConfig, ServerConfig,
};
