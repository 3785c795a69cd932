//! # pathrpc
//!
//! Path-routed RPC over HTTP. Plain receiver types are registered under a
//! path prefix and every suitable method becomes an endpoint at
//! `POST /{prefix}/{Method}`; the body carries the codec-encoded arguments and
//! the reply (or a structured error envelope) comes back the same way.
//!
//! ## Defining a Service
//!
//! ```ignore
//! use pathrpc::prelude::*;
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! pub struct Args {
//!     pub a: i64,
//!     pub b: i64,
//! }
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! pub struct Sum {
//!     pub c: i64,
//! }
//!
//! pub struct Arith;
//!
//! #[rpc_service]
//! impl Arith {
//!     pub fn add(&self, _ctx: &mut CallContext, args: Args, reply: &mut Sum) -> HandlerResult {
//!         reply.c = args.a + args.b;
//!         Ok(())
//!     }
//! }
//! ```
//!
//! ## Serving
//!
//! ```ignore
//! let server = Arc::new(Server::json());
//! server.register("/arith", Arith)?;
//!
//! let shutdown = CancellationToken::new();
//! let on_ctrl_c = shutdown.clone();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     on_ctrl_c.cancel();
//! });
//! HttpServer::bind("0.0.0.0:8000", server).await?.run_until_cancelled(shutdown).await?;
//! ```
//!
//! ## Calling
//!
//! ```ignore
//! let client = Client::new("http://localhost:8000");
//! let mut ctx = CallContext::new();
//! let sum: Sum = client.request(&mut ctx, "/arith/Add", &Args { a: 1, b: 2 }).await?;
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`pathrpc_core`] - Codes, errors, call context, configuration
//! - [`pathrpc_transport`] - Codec and wire error envelope
//! - [`pathrpc_server`] - Registry, dispatcher, middleware, HTTP hosting
//! - [`pathrpc_client`] - Client and transports
//! - [`pathrpc_logging`] - Subscriber installation
//! - [`pathrpc_macros`] - `#[rpc_service]`

extern crate self as pathrpc;

mod loopback;

pub use loopback::LoopbackTransport;

// Re-export core types
pub use pathrpc_core::{
    CallContext, ClientConfig, Code, CodeRegistry, HandlerResult, LogLevel, Message, RpcError,
    RpcResult, ServerConfig, TRACE_ID_HEADER, error_cause, error_code, error_stack,
    last_error_cause, normalize_path, register, register_desc, set_stack_trace,
};

// Re-export transport types
pub use pathrpc_transport::{Codec, CodecError, ErrorEnvelope, JsonCodec};

// Re-export server types
pub use pathrpc_server::{
    ArgKind, HttpServer, HttpServerError, MethodSink, Middleware, Next, RegisterError, ReplyKind,
    RpcRequest, RpcResponse, Server, Service, from_fn, install_panic_hook, router,
};

// Re-export client types
pub use pathrpc_client::{Client, ClientError, HttpTransport, Transport, TransportError};

// Re-export logging setup
pub use pathrpc_logging::{ReloadHandle, init_logging, init_logging_from_env};

// Re-export macros
pub use pathrpc_macros::{rpc, rpc_service};

// Re-export common dependencies that service authors need
pub use anyhow;
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tokio_util::sync::CancellationToken;
pub use tracing;

/// Prelude module for convenient imports.
///
/// Use `use pathrpc::prelude::*;` to import commonly used types.
///
/// This includes:
/// - Service authoring: `rpc_service`, `CallContext`, `HandlerResult`, `RpcError`, `Code`
/// - Hosting: `Server`, `HttpServer`, `CancellationToken`, `from_fn`
/// - Calling: `Client`
/// - Serde derives: `Serialize`, `Deserialize`
pub mod prelude {
    pub use crate::{
        CallContext, CancellationToken, Client, Code, HandlerResult, HttpServer, MethodSink,
        ReplyKind, RpcError, RpcResult, Server, Service, from_fn,
    };

    pub use pathrpc_macros::{rpc, rpc_service};

    pub use serde::{Deserialize, Serialize};
}
