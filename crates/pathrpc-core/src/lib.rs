//! pathrpc-core - Status codes, structured errors, and call context
//!
//! This crate provides the foundational types shared by the pathrpc server
//! and client:
//! - [`Code`] and the [`CodeRegistry`] mapping codes to descriptions and HTTP statuses
//! - [`RpcError`] for structured errors that cross the wire
//! - [`CallContext`] for trace id propagation, cancellation, and header extras
//! - [`normalize_path`] and [`split_path`] for path routing rules
//! - [`ServerConfig`] and [`ClientConfig`] for configuration

mod codes;
mod config;
mod context;
mod error;
mod path;

pub use codes::{Code, CodeEntry, CodeError, CodeRegistry, register, register_desc};
pub use config::{ClientConfig, ServerConfig};
pub use context::{CallContext, TRACE_ID_HEADER, new_trace_id, trace_id_from_headers};
pub use error::{
    BoxError, Message, RpcError, RpcResult, error_cause, error_code, error_stack,
    last_error_cause, set_stack_trace, stack_trace_enabled,
};
pub use path::{normalize_path, split_path};

/// Result type returned by RPC handlers
///
/// Returning an [`RpcError`] preserves its code; any other error is reported
/// as [`Code::UNKNOWN`].
pub type HandlerResult = anyhow::Result<()>;

/// Log levels understood by the logging layer
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl LogLevel {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Off,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

/// Error returned when parsing an unknown log level name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct ParseLogLevelError(pub String);

impl std::str::FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" => Ok(LogLevel::Off),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CallContext, ClientConfig, Code, HandlerResult, LogLevel, RpcError, RpcResult,
        ServerConfig,
    };
}
