//! Wire error envelope

use pathrpc_core::{Code, RpcError};
use serde::{Deserialize, Serialize};

/// Serialized form of an [`RpcError`] written as the body of a failed call
///
/// On the wire: `{"Code": -1, "Error": "unknown error", "Cause": "...", "Stack": "..."}`
/// with `Stack` omitted when no stack was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorEnvelope {
    /// Numeric error code, never 0
    pub code: i32,

    /// Registered description of the code
    #[serde(default)]
    pub error: String,

    /// Text of the wrapped cause
    #[serde(default)]
    pub cause: String,

    /// Captured stack
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stack: String,
}

impl ErrorEnvelope {
    /// Build the envelope for `err`
    ///
    /// An error carrying [`Code::OK`] is reported as [`Code::UNKNOWN`] so a
    /// failure envelope never claims success.
    pub fn from_error(err: &RpcError) -> Self {
        let code = if err.code().is_ok() {
            Code::UNKNOWN
        } else {
            err.code()
        };
        Self {
            code: code.value(),
            error: code.description(),
            cause: err.cause_text(),
            stack: err.stack().unwrap_or_default().to_string(),
        }
    }

    /// Envelope code
    pub fn code(&self) -> Code {
        Code(self.code)
    }

    /// Reconstruct the structured error; the stack is carried as text
    pub fn into_error(self) -> RpcError {
        RpcError::remote(Code(self.code), self.cause, self.stack)
    }
}

impl From<&RpcError> for ErrorEnvelope {
    fn from(err: &RpcError) -> Self {
        Self::from_error(err)
    }
}

impl From<ErrorEnvelope> for RpcError {
    fn from(envelope: ErrorEnvelope) -> Self {
        envelope.into_error()
    }
}
