//! Server and client configuration types

use crate::LogLevel;
use serde::{Deserialize, Serialize};

/// Configuration for hosting a dispatcher over HTTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Capture stacks for structured errors and send them in error envelopes
    #[serde(default)]
    pub stack_trace: bool,

    /// Largest request body accepted, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Initial log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_max_body_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            stack_trace: false,
            max_body_bytes: default_max_body_bytes(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    /// Set the listen address
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    /// Parsed log level; unrecognized names fall back to `Info`
    pub fn log_level(&self) -> LogLevel {
        self.log_level.parse().unwrap_or(LogLevel::Info)
    }
}

/// Configuration for a [`Client`](../pathrpc_client/struct.Client.html)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every normalized path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `User-Agent` header
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration pointing at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Create configuration from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }
}
