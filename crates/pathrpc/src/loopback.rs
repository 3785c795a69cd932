//! In-process transport that hands requests straight to a [`Server`]

use async_trait::async_trait;
use bytes::Bytes;
use pathrpc_client::{Transport, TransportError};
use pathrpc_server::Server;
use pathrpc_transport::Codec;
use std::sync::Arc;

/// Client transport that dispatches on a local [`Server`] without a socket
///
/// Each request runs on a blocking worker, as it would behind the HTTP host.
pub struct LoopbackTransport<C: Codec> {
    server: Arc<Server<C>>,
}

impl<C: Codec> LoopbackTransport<C> {
    pub fn new(server: Arc<Server<C>>) -> Self {
        Self { server }
    }

    /// Server receiving the requests
    pub fn server(&self) -> &Arc<Server<C>> {
        &self.server
    }
}

impl<C: Codec> Clone for LoopbackTransport<C> {
    fn clone(&self) -> Self {
        Self {
            server: self.server.clone(),
        }
    }
}

#[async_trait]
impl<C: Codec> Transport for LoopbackTransport<C> {
    async fn round_trip(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError> {
        let server = self.server.clone();
        tokio::task::spawn_blocking(move || server.handle(request))
            .await
            .map_err(|err| TransportError::Request(Box::new(err)))
    }
}
