//! pathrpc-client - Calling pathrpc services
//!
//! This crate provides:
//! - [`Client`] for encoding a call, sending it and decoding the reply or error
//! - [`Transport`], the pluggable request/response collaborator
//! - [`HttpTransport`], the reqwest-backed default transport

mod client;
mod transport;

pub use client::{Client, ClientError};
pub use transport::{HttpTransport, Transport, TransportError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Client, ClientError, HttpTransport, Transport};
}
