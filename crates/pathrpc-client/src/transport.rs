//! Request/response transport used by the client

use async_trait::async_trait;
use bytes::Bytes;
use pathrpc_core::{BoxError, ClientConfig};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while exchanging a request with the server
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request failed: {0}")]
    Request(#[source] BoxError),

    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),
}

/// Sends one HTTP request and returns the complete response
///
/// Any status is a successful round trip; interpreting it is up to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn round_trip(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError> {
        (**self).round_trip(request).await
    }
}

/// Transport backed by a pooled `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing `reqwest` client (shares its connection pool)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Create a transport configured from `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder
            .build()
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn round_trip(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, TransportError> {
        let request = reqwest::Request::try_from(request.map(reqwest::Body::from))
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| TransportError::Request(Box::new(err)))?;

        let mut builder = http::Response::builder()
            .status(response.status())
            .version(response.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers().clone());
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::Body(Box::new(err)))?;

        builder
            .body(body)
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))
    }
}
