//! RPC client
//!
//! A call is `POST {base_url}{normalized path}` with the codec-encoded
//! arguments as body. A 2xx reply is decoded into the caller's reply value;
//! any other status carries the wire error envelope, which is rebuilt into
//! the same [`RpcError`] the server raised.

use crate::transport::{HttpTransport, Transport, TransportError};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use pathrpc_core::{CallContext, ClientConfig, Code, RpcError, TRACE_ID_HEADER, normalize_path};
use pathrpc_transport::{Codec, CodecError, ErrorEnvelope, JsonCodec};
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use thiserror::Error;

/// Local failures of a call, reported as the cause of an [`RpcError`] with [`Code::UNKNOWN`]
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("encode arguments: {0}")]
    Encode(#[source] CodecError),

    #[error("decode reply: {0}")]
    Decode(#[source] CodecError),

    #[error("decode error envelope (status {status}): {source}")]
    Envelope {
        status: StatusCode,
        #[source]
        source: CodecError,
    },

    #[error("build request: {0}")]
    Build(#[from] http::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("call cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<ClientError> for RpcError {
    fn from(err: ClientError) -> Self {
        RpcError::new(Code::UNKNOWN, err)
    }
}

/// Client for one server
///
/// ```ignore
/// let client = Client::new("http://localhost:8000");
/// let mut ctx = CallContext::new();
/// let sum: Sum = client.request(&mut ctx, "/arith/Add", &Args { a: 1, b: 2 }).await?;
/// ```
pub struct Client<T = HttpTransport, C = JsonCodec> {
    base_url: String,
    transport: T,
    codec: C,
}

impl Client<HttpTransport, JsonCodec> {
    /// Create a JSON client for `base_url` using the default HTTP transport
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(base_url, HttpTransport::new(), JsonCodec::new())
    }

    /// Create a JSON client from configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::with_transport(
            config.base_url.clone(),
            HttpTransport::from_config(config)?,
            JsonCodec::new(),
        ))
    }
}

impl<T: Transport, C: Codec> Client<T, C> {
    /// Create a client with an explicit transport and codec
    ///
    /// A trailing `/` on `base_url` is dropped.
    pub fn with_transport(base_url: impl Into<String>, transport: T, codec: C) -> Self {
        let mut base_url = base_url.into();
        if base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            transport,
            codec,
        }
    }

    /// Base URL every call path is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Active codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Full URL of `path`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, normalize_path(path))
    }

    /// Call the method at `path`
    ///
    /// `args` is encoded as the body (empty when `None`) and a 2xx response is
    /// decoded into `reply` (skipped when `None`). The context's trace id is
    /// sent, minting one if it is empty, together with its request header
    /// extras; the response headers are copied back into the context.
    /// Cancelling the context's token or passing its deadline abandons the
    /// call. Nothing is retried.
    pub async fn call<A, R>(
        &self,
        ctx: &mut CallContext,
        path: &str,
        args: Option<&A>,
        reply: Option<&mut R>,
    ) -> Result<(), RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = self.exchange(ctx, path, args).await?;
        if let Some(reply) = reply {
            *reply = self.codec.decode(&body).map_err(ClientError::Decode)?;
        }
        Ok(())
    }

    /// Call the method at `path` and return its decoded reply
    pub async fn request<A, R>(
        &self,
        ctx: &mut CallContext,
        path: &str,
        args: &A,
    ) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = self.exchange(ctx, path, Some(args)).await?;
        Ok(self.codec.decode(&body).map_err(ClientError::Decode)?)
    }

    /// Call a method that takes no arguments and returns no reply
    pub async fn notify(&self, ctx: &mut CallContext, path: &str) -> Result<(), RpcError> {
        self.call::<(), ()>(ctx, path, None, None).await
    }

    /// Send one call and return the body of a 2xx response
    async fn exchange<A>(
        &self,
        ctx: &mut CallContext,
        path: &str,
        args: Option<&A>,
    ) -> Result<Bytes, RpcError>
    where
        A: Serialize + ?Sized,
    {
        let body = match args {
            Some(args) => self.codec.encode(args).map_err(ClientError::Encode)?,
            None => Vec::new(),
        };

        let url = self.url(path);
        let trace_id = ctx.ensure_trace_id().to_string();
        let mut request = http::Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(CONTENT_TYPE, self.codec.content_type())
            .header(TRACE_ID_HEADER, trace_id.as_str())
            .body(Bytes::from(body))
            .map_err(ClientError::Build)?;
        for (name, value) in &ctx.request_headers {
            request.headers_mut().append(name.clone(), value.clone());
        }

        tracing::debug!(url = %url, trace_id = %trace_id, "rpc call");
        let response = guarded(ctx, self.transport.round_trip(request))
            .await?
            .map_err(ClientError::Transport)?;

        let (parts, body) = response.into_parts();
        ctx.response_headers.extend(parts.headers);

        if parts.status.is_success() {
            return Ok(body);
        }

        let envelope: ErrorEnvelope =
            self.codec
                .decode(&body)
                .map_err(|source| ClientError::Envelope {
                    status: parts.status,
                    source,
                })?;
        let err = envelope.into_error();
        tracing::debug!(status = parts.status.as_u16(), error = %err, "rpc call failed");
        Err(err)
    }
}

/// Await `call` unless the context is cancelled or its deadline passes first
async fn guarded<F: Future>(ctx: &CallContext, call: F) -> Result<F::Output, ClientError> {
    let cancel = ctx.cancellation().clone();
    match ctx.deadline() {
        Some(deadline) => {
            let deadline = tokio::time::Instant::from_std(deadline);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                result = tokio::time::timeout_at(deadline, call) => {
                    result.map_err(|_| ClientError::DeadlineExceeded)
                }
            }
        }
        None => {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                output = call => Ok(output),
            }
        }
    }
}
