//! Middleware chain
//!
//! Middleware are around-advice layers: each receives the rest of the chain
//! as [`Next`] and decides whether, when and how many times to run it. The
//! chain is stored as one flat list, outermost first, and [`Next`] walks it
//! by position until it reaches the dispatcher endpoint.

use bytes::Bytes;
use pathrpc_core::{CallContext, RpcError};
use std::sync::Arc;

/// Inbound request as seen by middleware and the dispatcher
pub type RpcRequest = http::Request<Bytes>;

/// Response under construction
pub type RpcResponse = http::Response<Bytes>;

/// Innermost step of the chain
pub(crate) trait Endpoint: Send + Sync {
    fn call(
        &self,
        ctx: &mut CallContext,
        req: &RpcRequest,
        resp: &mut RpcResponse,
    ) -> Result<(), RpcError>;
}

/// A layer wrapped around the dispatcher
///
/// Returning an error short-circuits to the error envelope; a layer may also
/// replace the error returned by `next`.
pub trait Middleware: Send + Sync {
    fn handle(
        &self,
        ctx: &mut CallContext,
        req: &RpcRequest,
        resp: &mut RpcResponse,
        next: Next<'_>,
    ) -> Result<(), RpcError>;
}

impl<F> Middleware for F
where
    F: Fn(&mut CallContext, &RpcRequest, &mut RpcResponse, Next<'_>) -> Result<(), RpcError>
        + Send
        + Sync,
{
    fn handle(
        &self,
        ctx: &mut CallContext,
        req: &RpcRequest,
        resp: &mut RpcResponse,
        next: Next<'_>,
    ) -> Result<(), RpcError> {
        self(ctx, req, resp, next)
    }
}

/// Wrap a closure as a shareable middleware
///
/// ```ignore
/// server.add_middleware([from_fn(|ctx, req, resp, next| {
///     tracing::debug!(path = %req.uri().path(), "before");
///     let result = next.run(ctx, req, resp);
///     tracing::debug!(ok = result.is_ok(), "after");
///     result
/// })]);
/// ```
pub fn from_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut CallContext, &RpcRequest, &mut RpcResponse, Next<'_>) -> Result<(), RpcError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// The remainder of the chain below the current layer
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware>], endpoint: &'a dyn Endpoint) -> Self {
        Self { chain, endpoint }
    }

    /// Run the remaining layers and the dispatcher
    pub fn run(
        self,
        ctx: &mut CallContext,
        req: &RpcRequest,
        resp: &mut RpcResponse,
    ) -> Result<(), RpcError> {
        match self.chain.split_first() {
            Some((layer, rest)) => layer.handle(ctx, req, resp, Next::new(rest, self.endpoint)),
            None => self.endpoint.call(ctx, req, resp),
        }
    }

    /// Number of layers still to run before the dispatcher
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }
}

/// Compose a new batch on top of the existing chain
///
/// The batch keeps its own order, first element outermost, and as a whole
/// wraps every layer added before it.
pub(crate) fn compose(
    existing: &[Arc<dyn Middleware>],
    batch: impl IntoIterator<Item = Arc<dyn Middleware>>,
) -> Vec<Arc<dyn Middleware>> {
    let mut chain: Vec<Arc<dyn Middleware>> = batch.into_iter().collect();
    chain.extend(existing.iter().cloned());
    chain
}
