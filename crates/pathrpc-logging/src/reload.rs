//! Dynamic log level reloading support

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use pathrpc_core::LogLevel;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::reload;

/// Failure to change the active level
#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("reload handle not initialized")]
    NotInitialized,

    #[error("failed to reload filter: {0}")]
    Reload(#[from] reload::Error),
}

/// Handle for dynamically reloading the log level filter
pub struct ReloadHandle {
    handle: Mutex<Option<reload::Handle<LevelFilter, tracing_subscriber::Registry>>>,
}

impl ReloadHandle {
    /// Create a new reload handle
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// Get the global reload handle
    pub fn global() -> &'static ReloadHandle {
        static INSTANCE: OnceCell<ReloadHandle> = OnceCell::new();
        INSTANCE.get_or_init(ReloadHandle::new)
    }

    /// Set the reload handle (called during initialization)
    pub fn set_handle(&self, handle: reload::Handle<LevelFilter, tracing_subscriber::Registry>) {
        *self.handle.lock() = Some(handle);
    }

    /// Whether a subscriber has been attached to this handle
    pub fn is_initialized(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Reload the filter to use a new log level
    pub fn reload_level(&self, level: LogLevel) -> Result<(), ReloadError> {
        let guard = self.handle.lock();
        let handle = guard.as_ref().ok_or(ReloadError::NotInitialized)?;
        handle.reload(level_filter(level))?;
        tracing::debug!(%level, "log level changed");
        Ok(())
    }

    /// Currently active level, if a subscriber is attached
    pub fn current_level(&self) -> Option<LevelFilter> {
        self.handle
            .lock()
            .as_ref()
            .and_then(|handle| handle.clone_current())
    }
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert LogLevel to tracing LevelFilter
pub(crate) fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Off => LevelFilter::OFF,
    }
}

#[cfg(test)]
#[path = "reload/reload_tests.rs"]
mod reload_tests;
