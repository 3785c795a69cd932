//! Dispatcher: routes a request to a registered method and writes the reply
//!
//! Each request runs a linear state machine on the worker that received it:
//! preflight, content-type check, route, decode, invoke (panic-isolated) and
//! respond. Any failure along the way becomes an [`RpcError`] that is written
//! as the wire error envelope with the status its code maps to.

use crate::middleware::{Endpoint, Middleware, Next, RpcRequest, RpcResponse, compose};
use crate::panic_guard::catch_panic;
use crate::registry::{RegisterError, Registry};
use crate::service::{ReplyKind, Service};
use arc_swap::ArcSwap;
use bytes::Bytes;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE, ORIGIN,
};
use http::{HeaderMap, HeaderValue, Method as HttpMethod, Response};
use parking_lot::Mutex;
use pathrpc_core::{
    CallContext, Code, RpcError, ServerConfig, TRACE_ID_HEADER, new_trace_id, set_stack_trace,
    split_path, trace_id_from_headers,
};
use pathrpc_transport::{Codec, ErrorEnvelope, JsonCodec};
use std::sync::Arc;

const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// RPC server: method registry, middleware chain and codec
pub struct Server<C: Codec = JsonCodec> {
    codec: C,
    content_type: Option<HeaderValue>,
    registry: Registry<C>,
    chain: ArcSwap<Vec<Arc<dyn Middleware>>>,
    chain_lock: Mutex<()>,
    max_body_bytes: usize,
}

impl Server<JsonCodec> {
    /// Create a server using the JSON codec
    pub fn json() -> Self {
        Self::new(JsonCodec::new())
    }
}

impl Default for Server<JsonCodec> {
    fn default() -> Self {
        Self::json()
    }
}

impl<C: Codec> Server<C> {
    /// Create a server using `codec` for request and reply bodies
    pub fn new(codec: C) -> Self {
        let content_type = HeaderValue::from_str(codec.content_type())
            .map_err(|err| {
                tracing::error!(
                    content_type = codec.content_type(),
                    error = %err,
                    "codec content type is not a valid header value; responses will omit it"
                );
            })
            .ok();
        Self {
            codec,
            content_type,
            registry: Registry::new(),
            chain: ArcSwap::from_pointee(Vec::new()),
            chain_lock: Mutex::new(()),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Create a server configured from `config`
    ///
    /// Applies the body size limit and the process-wide stack capture toggle.
    pub fn from_config(codec: C, config: &ServerConfig) -> Self {
        set_stack_trace(config.stack_trace);
        Self::new(codec).with_max_body_bytes(config.max_body_bytes)
    }

    /// Set the largest request body accepted by the HTTP host
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Largest request body accepted by the HTTP host
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Active codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Registered classes
    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    /// Register `receiver` under `prefix`, returning the normalized path
    pub fn register<S: Service>(
        &self,
        prefix: &str,
        receiver: S,
    ) -> Result<String, RegisterError> {
        self.registry.register(prefix, Arc::new(receiver))
    }

    /// Register a receiver that is shared with other owners
    pub fn register_shared<S: Service>(
        &self,
        prefix: &str,
        receiver: Arc<S>,
    ) -> Result<String, RegisterError> {
        self.registry.register(prefix, receiver)
    }

    /// Wrap the current chain with a batch of middleware
    ///
    /// Within the batch the first element is outermost. The batch as a whole
    /// becomes the outermost layer for every later request.
    pub fn add_middleware(&self, batch: impl IntoIterator<Item = Arc<dyn Middleware>>) {
        let _guard = self.chain_lock.lock();
        let next = compose(&self.chain.load(), batch);
        self.chain.store(Arc::new(next));
    }

    /// Number of middleware layers
    pub fn middleware_len(&self) -> usize {
        self.chain.load().len()
    }

    /// Handle one request to completion
    pub fn handle(&self, req: RpcRequest) -> RpcResponse {
        let origin = req.headers().get(ORIGIN).cloned();

        if *req.method() == HttpMethod::OPTIONS {
            let trace_id = trace_id_from_headers(req.headers()).unwrap_or_else(new_trace_id);
            let mut resp = Response::new(Bytes::new());
            set_cors(resp.headers_mut(), origin.as_ref());
            set_trace_id(resp.headers_mut(), &trace_id);
            return resp;
        }

        let mut ctx = CallContext::from_headers(req.headers());
        let span = tracing::info_span!(
            "rpc",
            trace_id = %ctx.trace_id(),
            path = %req.uri().path()
        );
        let _entered = span.enter();

        let chain = self.chain.load_full();
        let mut resp = Response::new(Bytes::new());
        match Next::new(&chain, self).run(&mut ctx, &req, &mut resp) {
            Ok(()) => {
                self.finish_success(&mut ctx, origin.as_ref(), &mut resp);
                tracing::debug!(status = resp.status().as_u16(), "call completed");
                resp
            }
            Err(err) => {
                log_failure(&err);
                self.error_response(origin.as_ref(), ctx.ensure_trace_id(), &err)
            }
        }
    }

    /// Build the error response for a request that never reached the dispatcher
    pub fn reject(&self, headers: &HeaderMap, err: &RpcError) -> RpcResponse {
        let trace_id = trace_id_from_headers(headers).unwrap_or_else(new_trace_id);
        log_failure(err);
        self.error_response(headers.get(ORIGIN), &trace_id, err)
    }

    /// Headers every successful response carries, whether or not the
    /// dispatcher ran; the context's extras are written exactly once
    fn finish_success(
        &self,
        ctx: &mut CallContext,
        origin: Option<&HeaderValue>,
        resp: &mut RpcResponse,
    ) {
        let headers = resp.headers_mut();
        self.set_content_type(headers);
        set_cors(headers, origin);
        set_trace_id(headers, ctx.ensure_trace_id());
        for (name, value) in &ctx.response_headers {
            headers.append(name.clone(), value.clone());
        }
    }

    fn error_response(
        &self,
        origin: Option<&HeaderValue>,
        trace_id: &str,
        err: &RpcError,
    ) -> RpcResponse {
        let envelope = ErrorEnvelope::from_error(err);
        let body = match self.codec.encode(&envelope) {
            Ok(body) => Bytes::from(body),
            Err(encode_err) => {
                tracing::error!(error = %encode_err, "failed to encode error envelope");
                Bytes::new()
            }
        };

        let mut resp = Response::new(body);
        *resp.status_mut() = envelope.code().status();
        self.set_content_type(resp.headers_mut());
        set_cors(resp.headers_mut(), origin);
        set_trace_id(resp.headers_mut(), trace_id);
        resp
    }

    fn check_content_type(&self, headers: &HeaderMap) -> Result<(), RpcError> {
        match headers.get(CONTENT_TYPE) {
            Some(value)
                if !value.is_empty() && value.as_bytes() != self.codec.content_type().as_bytes() =>
            {
                Err(RpcError::msg(
                    Code::INVALID_HEADER,
                    format!(
                        "not support {} Content-Type header, the Content-Type header must be {} or empty",
                        String::from_utf8_lossy(value.as_bytes()),
                        self.codec.content_type()
                    ),
                ))
            }
            _ => Ok(()),
        }
    }

    fn set_content_type(&self, headers: &mut HeaderMap) {
        if let Some(content_type) = &self.content_type {
            headers.insert(CONTENT_TYPE, content_type.clone());
        }
    }
}

impl<C: Codec> Endpoint for Server<C> {
    fn call(
        &self,
        ctx: &mut CallContext,
        req: &RpcRequest,
        resp: &mut RpcResponse,
    ) -> Result<(), RpcError> {
        self.check_content_type(req.headers())?;

        let (class_path, method_name) = split_path(req.uri().path());
        let class = self.registry.class(&class_path).ok_or_else(|| {
            RpcError::msg(
                Code::INVALID_PATH,
                format!("lookup method: can not find {class_path}/{method_name}"),
            )
        })?;
        let method = class.method(&method_name).ok_or_else(|| {
            RpcError::msg(
                Code::INVALID_PATH,
                format!("lookup method: can not find {class_path}/{method_name}"),
            )
        })?;

        let mut call = method.prepare();
        call.decode_args(&self.codec, req.body())
            .map_err(|err| RpcError::new(Code::DECODE_BODY_FAIL, err))?;

        match catch_panic(|| call.invoke(ctx)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(RpcError::from_handler(err)),
            Err(report) => return Err(report.into_error()),
        }

        if method.reply() != ReplyKind::None {
            let body = call
                .encode_reply(&self.codec)
                .map_err(|err| RpcError::new(Code::ENCODE_BODY_FAIL, err))?;
            *resp.body_mut() = Bytes::from(body);
        }
        Ok(())
    }
}

fn set_cors(headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
    if let Some(origin) = origin {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    }
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
}

fn set_trace_id(headers: &mut HeaderMap, trace_id: &str) {
    let value = HeaderValue::from_str(trace_id).or_else(|_| HeaderValue::from_str(&new_trace_id()));
    if let Ok(value) = value {
        headers.insert(TRACE_ID_HEADER, value);
    }
}

fn log_failure(err: &RpcError) {
    if err.status().is_server_error() {
        tracing::warn!(code = %err.code(), error = %err, "call failed");
    } else {
        tracing::debug!(code = %err.code(), error = %err, "call rejected");
    }
}
