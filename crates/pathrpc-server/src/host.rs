//! HTTP hosting: an axum router and a TCP server around the dispatcher

use crate::server::Server;
use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use pathrpc_core::{Code, RpcError, ServerConfig};
use pathrpc_transport::Codec;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while hosting the dispatcher
#[derive(Debug, Error)]
pub enum HttpServerError {
    /// Failed to bind to the TCP address
    #[error("failed to bind on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The bound socket has no local address
    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),

    /// The server hit an I/O error while serving
    #[error("server error: {0}")]
    Serve(String),
}

/// Build an axum router that sends every path and method to `server`
///
/// Bodies are collected up to [`Server::max_body_bytes`]; larger bodies are
/// rejected with [`Code::DECODE_BODY_FAIL`]. The dispatcher itself runs on the
/// blocking pool so handlers may block freely.
pub fn router<C: Codec>(server: Arc<Server<C>>) -> Router {
    Router::new().fallback(forward::<C>).with_state(server)
}

async fn forward<C: Codec>(State(server): State<Arc<Server<C>>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, server.max_body_bytes()).await {
        Ok(body) => body,
        Err(err) => {
            let err = RpcError::new(Code::DECODE_BODY_FAIL, err);
            return server.reject(&parts.headers, &err).map(Body::from);
        }
    };

    let headers = parts.headers.clone();
    let request = http::Request::from_parts(parts, body);
    let worker = Arc::clone(&server);
    match tokio::task::spawn_blocking(move || worker.handle(request)).await {
        Ok(response) => response.map(Body::from),
        Err(join_err) => {
            let err = RpcError::new(Code::PANIC, join_err);
            server.reject(&headers, &err).map(Body::from)
        }
    }
}

/// TCP server hosting a dispatcher
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    /// Bind `addr` and prepare to serve `server`
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP bind fails.
    pub async fn bind<C: Codec>(
        addr: &str,
        server: Arc<Server<C>>,
    ) -> Result<Self, HttpServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HttpServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self {
            listener,
            router: router(server),
        })
    }

    /// Bind the configured listen address
    pub async fn from_config<C: Codec>(
        config: &ServerConfig,
        server: Arc<Server<C>>,
    ) -> Result<Self, HttpServerError> {
        Self::bind(&config.listen_addr, server).await
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, HttpServerError> {
        self.listener.local_addr().map_err(HttpServerError::LocalAddr)
    }

    /// Serve until `shutdown` completes, then drain in-flight requests
    ///
    /// Any future works as the signal, e.g. `tokio::signal::ctrl_c()` mapped
    /// to `()`, or a token's `cancelled_owned()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server crashes.
    pub async fn run<F>(self, shutdown: F) -> Result<(), HttpServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(addr = %addr, "pathrpc HTTP server ready");
        }

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| HttpServerError::Serve(e.to_string()))?;

        tracing::info!("pathrpc HTTP server stopped");
        Ok(())
    }

    /// Serve until `token` is cancelled
    pub async fn run_until_cancelled(
        self,
        token: CancellationToken,
    ) -> Result<(), HttpServerError> {
        self.run(token.cancelled_owned()).await
    }
}
