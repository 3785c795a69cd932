//! Per-call context and trace id propagation

use http::{HeaderMap, HeaderName, HeaderValue};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Header carrying the trace id on every request and response
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Mint a fresh, globally unique trace id
pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Read a non-empty trace id from `headers`
pub fn trace_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Context for a single call, shared by the dispatcher, middleware, handlers and the client
///
/// On the server, `request_headers` holds the inbound request headers and
/// `response_headers` holds extras appended to a successful response. On the
/// client, `request_headers` holds extras appended to the outbound request and
/// `response_headers` receives the headers of the response.
#[derive(Debug, Clone)]
pub struct CallContext {
    trace_id: String,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    /// Inbound headers (server) or outbound extras (client)
    pub request_headers: HeaderMap,
    /// Outbound extras (server) or received headers (client)
    pub response_headers: HeaderMap,
}

impl CallContext {
    /// Create a context with a freshly minted trace id
    pub fn new() -> Self {
        Self {
            trace_id: new_trace_id(),
            cancel: CancellationToken::new(),
            deadline: None,
            request_headers: HeaderMap::new(),
            response_headers: HeaderMap::new(),
        }
    }

    /// Build the server-side context for an inbound request
    ///
    /// The inbound trace id is reused when present, otherwise one is minted.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let trace_id = trace_id_from_headers(headers).unwrap_or_else(new_trace_id);
        Self {
            trace_id,
            request_headers: headers.clone(),
            ..Self::new()
        }
    }

    /// Use a caller-supplied trace id
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Tie this call to an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Abandon the call at `deadline`
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abandon the call after `timeout`
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Trace id of this call
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Replace the trace id
    pub fn set_trace_id(&mut self, trace_id: impl Into<String>) {
        self.trace_id = trace_id.into();
    }

    /// Return the trace id, minting one if it was cleared
    pub fn ensure_trace_id(&mut self) -> &str {
        if self.trace_id.is_empty() {
            self.trace_id = new_trace_id();
        }
        &self.trace_id
    }

    /// Token observed by the client while the call is in flight
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel the call
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the call was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Deadline of the call, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Append an extra header to the outbound request (client side)
    pub fn add_request_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.request_headers.append(name, value);
    }

    /// Append an extra header to the outbound response (server side)
    pub fn add_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.append(name, value);
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}
