//! pathrpc-logging - tracing subscriber setup
//!
//! This crate provides:
//! - [`init_logging`] installing a `fmt` subscriber with a reloadable level
//! - [`init_logging_from_env`] installing a `fmt` subscriber driven by `RUST_LOG`
//! - [`ReloadHandle`] for changing the level while the process runs

mod init;
mod reload;

pub use init::{init_logging, init_logging_from_env};
pub use pathrpc_core::LogLevel;
pub use reload::{ReloadError, ReloadHandle};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogLevel, ReloadHandle, init_logging, init_logging_from_env};
}
