//! Process-wide status code registry
//!
//! Every [`Code`] maps to an immutable description and the HTTP status the
//! server answers with. The table is append-only: a code is registered once,
//! normally during process start-up, and read-only afterwards.

use http::StatusCode;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Numeric error code carried by [`RpcError`](crate::RpcError) and the wire envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(pub i32);

impl Code {
    /// Success. Never appears in a failure envelope.
    pub const OK: Code = Code(0);
    /// An error that carries no recognized code
    pub const UNKNOWN: Code = Code(-1);
    /// A handler panicked
    pub const PANIC: Code = Code(-2);
    /// No method is registered at the requested path
    pub const INVALID_PATH: Code = Code(-101);
    /// A request header was rejected (e.g. Content-Type mismatch)
    pub const INVALID_HEADER: Code = Code(-102);
    /// The reply could not be encoded
    pub const ENCODE_BODY_FAIL: Code = Code(-201);
    /// The request body could not be decoded
    pub const DECODE_BODY_FAIL: Code = Code(-202);

    /// Raw integer value
    pub fn value(self) -> i32 {
        self.0
    }

    /// Whether this is the success code
    pub fn is_ok(self) -> bool {
        self == Code::OK
    }

    /// Registered description, or `code(N)` when the code is unknown
    pub fn description(self) -> String {
        CodeRegistry::global().description(self)
    }

    /// Registered transport status, or 500 when the code is unknown
    pub fn status(self) -> StatusCode {
        CodeRegistry::global().status(self)
    }
}

impl From<i32> for Code {
    fn from(value: i32) -> Self {
        Code(value)
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered attributes of a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    /// Human readable description, sent as the envelope's `Error` field
    pub description: String,
    /// HTTP status used for responses carrying this code
    pub status: StatusCode,
}

/// Errors raised while building the code table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The code is already taken by another subsystem
    #[error("code({code}) is registered as {existing:?}")]
    Duplicate { code: Code, existing: String },
}

/// Append-only table of code → (description, status)
pub struct CodeRegistry {
    entries: RwLock<HashMap<Code, CodeEntry>>,
}

static GLOBAL_REGISTRY: Lazy<CodeRegistry> = Lazy::new(CodeRegistry::with_reserved);

impl CodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry pre-populated with the reserved framework codes
    pub fn with_reserved() -> Self {
        let registry = Self::new();
        {
            let mut entries = registry.entries.write();
            for (code, description, status) in RESERVED {
                entries.insert(
                    *code,
                    CodeEntry {
                        description: (*description).to_string(),
                        status: *status,
                    },
                );
            }
        }
        registry
    }

    /// The process-wide registry consulted by [`Code::description`] and [`Code::status`]
    pub fn global() -> &'static CodeRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a code. Fails if the code is already present.
    pub fn register(
        &self,
        code: Code,
        description: impl Into<String>,
        status: StatusCode,
    ) -> Result<(), CodeError> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&code) {
            return Err(CodeError::Duplicate {
                code,
                existing: existing.description.clone(),
            });
        }
        let description = description.into();
        tracing::debug!(code = code.0, %description, status = status.as_u16(), "code registered");
        entries.insert(
            code,
            CodeEntry {
                description,
                status,
            },
        );
        Ok(())
    }

    /// Register a code with the default server-error status
    pub fn register_desc(
        &self,
        code: Code,
        description: impl Into<String>,
    ) -> Result<(), CodeError> {
        self.register(code, description, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Look up a code
    pub fn get(&self, code: Code) -> Option<CodeEntry> {
        self.entries.read().get(&code).cloned()
    }

    /// Check whether a code is registered
    pub fn contains(&self, code: Code) -> bool {
        self.entries.read().contains_key(&code)
    }

    /// Description for `code`, `code(N)` when unregistered
    pub fn description(&self, code: Code) -> String {
        match self.entries.read().get(&code) {
            Some(entry) => entry.description.clone(),
            None => format!("code({})", code.0),
        }
    }

    /// Status for `code`, 500 when unregistered
    pub fn status(&self, code: Code) -> StatusCode {
        self.entries
            .read()
            .get(&code)
            .map(|entry| entry.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

const RESERVED: &[(Code, &str, StatusCode)] = &[
    (Code::OK, "ok", StatusCode::OK),
    (
        Code::UNKNOWN,
        "unknown error",
        StatusCode::INTERNAL_SERVER_ERROR,
    ),
    (Code::PANIC, "panic error", StatusCode::INTERNAL_SERVER_ERROR),
    (
        Code::INVALID_PATH,
        "invalid url path",
        StatusCode::BAD_REQUEST,
    ),
    (
        Code::INVALID_HEADER,
        "invalid http header",
        StatusCode::BAD_REQUEST,
    ),
    (
        Code::ENCODE_BODY_FAIL,
        "encode http body fail",
        StatusCode::INTERNAL_SERVER_ERROR,
    ),
    (
        Code::DECODE_BODY_FAIL,
        "decode http body fail",
        StatusCode::BAD_REQUEST,
    ),
];

/// Register an application code in the process-wide registry
///
/// Call this during start-up, before any request is served. A collision
/// means two subsystems claimed the same code; the caller decides whether
/// that is fatal.
///
/// # Example
///
/// ```ignore
/// const NOT_FOUND: Code = Code(1001);
///
/// pathrpc_core::register(NOT_FOUND, "record not found", StatusCode::NOT_FOUND)
///     .map_err(|e| anyhow::anyhow!("code table: {e}"))?;
/// ```
pub fn register(
    code: Code,
    description: impl Into<String>,
    status: StatusCode,
) -> Result<(), CodeError> {
    CodeRegistry::global().register(code, description, status)
}

/// Register an application code with the default server-error status
pub fn register_desc(code: Code, description: impl Into<String>) -> Result<(), CodeError> {
    CodeRegistry::global().register_desc(code, description)
}
