//! Global subscriber installation

use crate::reload::{ReloadHandle, level_filter};
use pathrpc_core::LogLevel;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload;

/// Install a `fmt` subscriber filtered at `level`
///
/// The level can later be changed through [`ReloadHandle::global`]. Returns
/// `false` when a global subscriber was already installed, in which case
/// nothing changes.
pub fn init_logging(level: LogLevel) -> bool {
    let (filter, handle) = reload::Layer::new(level_filter(level));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    ReloadHandle::global().set_handle(handle);
    tracing::debug!(%level, "logging initialized");
    true
}

/// Install a `fmt` subscriber configured from `RUST_LOG`
///
/// Falls back to `info` when the variable is unset or invalid. The level of
/// this subscriber is not reloadable. Returns `false` when a global
/// subscriber was already installed.
pub fn init_logging_from_env() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
