//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use relay_core::{DEFAULT_PORT, RELAY_PATH};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub client: ClientConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory of static assets served next to the relay endpoint
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

/// Relay behaviour, fixed for the lifetime of the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Write every relayed payload to the diagnostic log
    #[serde(default)]
    pub log_messages: bool,
}

impl RelayConfig {
    #[must_use]
    pub fn with_message_logging(log_messages: bool) -> Self {
        Self { log_messages }
    }
}

/// Presentation client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_relay_url")]
    pub url: String,
    /// Give up after this many consecutive failed reconnects (`None` = never)
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_relay_url(),
            max_reconnect_attempts: None,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "relay".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_relay_url() -> String {
    format!("ws://127.0.0.1:{DEFAULT_PORT}{RELAY_PATH}")
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue(name, value.to_string())),
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name, value.to_string()))
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value)
                .ok_or(ConfigError::InvalidValue("APP_ENV", value))?,
            None => Environment::default(),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            server: ServerConfig {
                host: lookup("RELAY_HOST").unwrap_or_else(default_host),
                port: lookup("RELAY_PORT")
                    .map(|s| parse_number("RELAY_PORT", &s))
                    .transpose()?
                    .unwrap_or_else(default_port),
                static_dir: lookup("RELAY_STATIC_DIR")
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
            },
            relay: RelayConfig {
                log_messages: lookup("RELAY_LOG_MESSAGES")
                    .map(|s| parse_bool("RELAY_LOG_MESSAGES", &s))
                    .transpose()?
                    .unwrap_or(false),
            },
            client: ClientConfig {
                url: lookup("RELAY_URL").unwrap_or_else(default_relay_url),
                max_reconnect_attempts: lookup("RELAY_MAX_RECONNECTS")
                    .map(|s| parse_number("RELAY_MAX_RECONNECTS", &s))
                    .transpose()?,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
