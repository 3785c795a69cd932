//! pathrpc-server - Method registry, dispatcher, and middleware chain
//!
//! This crate provides:
//! - [`Service`] and [`MethodSink`] for describing a receiver's methods
//! - [`Registry`] mapping normalized path prefixes to method tables
//! - [`Server`], the per-request dispatcher with panic isolation
//! - [`Middleware`] layers composed around the dispatcher
//! - [`router`] and [`HttpServer`] for hosting over HTTP with graceful shutdown

mod host;
mod method;
mod middleware;
mod panic_guard;
mod registry;
mod server;
mod service;

pub use host::{HttpServer, HttpServerError, router};
pub use method::{Method, MethodTable, PendingCall};
pub use middleware::{Middleware, Next, RpcRequest, RpcResponse, from_fn};
pub use panic_guard::{PanicReport, catch_panic, install_panic_hook};
pub use registry::{Class, RegisterError, Registry};
pub use server::Server;
pub use service::{ArgKind, MethodSink, ReplyKind, Service, is_exported};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        HttpServer, Middleware, MethodSink, Next, ReplyKind, RpcRequest, RpcResponse, Server,
        Service, from_fn,
    };
}

#[cfg(test)]
mod test_services;
