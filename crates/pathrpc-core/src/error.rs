//! Structured RPC error type
//!
//! [`RpcError`] is the single error shape that crosses the wire: a [`Code`],
//! an optional wrapped cause and an optional captured stack. Errors that are
//! not an `RpcError` are reported with [`Code::UNKNOWN`].

use crate::codes::Code;
use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Boxed, thread-safe error used for wrapped causes
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type alias for operations that fail with [`RpcError`]
pub type RpcResult<T> = Result<T, RpcError>;

static STACK_TRACE: AtomicBool = AtomicBool::new(false);

/// Enable or disable stack capture for newly constructed errors
///
/// Capturing a backtrace is expensive, so it is off by default.
pub fn set_stack_trace(enabled: bool) {
    STACK_TRACE.store(enabled, Ordering::Relaxed);
}

/// Whether newly constructed errors capture a stack
pub fn stack_trace_enabled() -> bool {
    STACK_TRACE.load(Ordering::Relaxed)
}

fn capture_stack() -> Option<String> {
    if stack_trace_enabled() {
        Some(Backtrace::force_capture().to_string())
    } else {
        None
    }
}

/// Plain text cause, used for formatted messages and remote causes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct Message(pub String);

/// Structured error carrying a code, a wrapped cause and an optional stack
#[derive(Debug)]
pub struct RpcError {
    code: Code,
    cause: Option<BoxError>,
    stack: Option<String>,
}

impl RpcError {
    /// Create an error wrapping `cause`
    pub fn new(code: Code, cause: impl Into<BoxError>) -> Self {
        Self {
            code,
            cause: Some(cause.into()),
            stack: capture_stack(),
        }
    }

    /// Create an error whose cause is a plain message
    ///
    /// ```ignore
    /// return Err(RpcError::msg(NOT_FOUND, format!("user {id} not found")).into());
    /// ```
    pub fn msg(code: Code, message: impl Into<String>) -> Self {
        Self::new(code, Message(message.into()))
    }

    /// Create an error without a cause
    pub fn from_code(code: Code) -> Self {
        Self {
            code,
            cause: None,
            stack: capture_stack(),
        }
    }

    /// Rebuild an error received from a remote peer
    ///
    /// The stack is carried as text; an empty stack means none was sent.
    pub fn remote(code: Code, cause: impl Into<String>, stack: impl Into<String>) -> Self {
        let stack = stack.into();
        Self {
            code,
            cause: Some(Box::new(Message(cause.into()))),
            stack: (!stack.is_empty()).then_some(stack),
        }
    }

    /// Convert a handler failure into a structured error
    ///
    /// An `RpcError` raised by the handler is returned unchanged. Any other
    /// error is wrapped with [`Code::UNKNOWN`].
    pub fn from_handler(err: anyhow::Error) -> Self {
        match err.downcast::<RpcError>() {
            Ok(rpc) => rpc,
            Err(other) => Self::new(Code::UNKNOWN, BoxError::from(other)),
        }
    }

    /// Replace the captured stack
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Error code
    pub fn code(&self) -> Code {
        self.code
    }

    /// Registered description of the code
    pub fn description(&self) -> String {
        self.code.description()
    }

    /// Transport status the code maps to
    pub fn status(&self) -> http::StatusCode {
        self.code.status()
    }

    /// Directly wrapped cause
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Text of the directly wrapped cause, empty when there is none
    pub fn cause_text(&self) -> String {
        self.cause
            .as_ref()
            .map(|cause| cause.to_string())
            .unwrap_or_default()
    }

    /// Innermost error in the cause chain
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        last_error_cause(self)
    }

    /// Captured stack, if any
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{code: {}, desc: {}, cause: {}}}",
            self.code,
            self.code.description(),
            self.cause_text()
        )
    }
}

impl StdError for RpcError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Code of any error: the `RpcError` code, otherwise [`Code::UNKNOWN`]
pub fn error_code(err: &(dyn StdError + 'static)) -> Code {
    err.downcast_ref::<RpcError>()
        .map(RpcError::code)
        .unwrap_or(Code::UNKNOWN)
}

/// Direct cause of an `RpcError`, or the error itself for any other error
pub fn error_cause<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a (dyn StdError + 'static)> {
    match err.downcast_ref::<RpcError>() {
        Some(rpc) => rpc.source(),
        None => Some(err),
    }
}

/// Innermost error reachable through the `source` chain
pub fn last_error_cause<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current
}

/// Stack captured by an `RpcError`
pub fn error_stack<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a str> {
    err.downcast_ref::<RpcError>().and_then(RpcError::stack)
}
