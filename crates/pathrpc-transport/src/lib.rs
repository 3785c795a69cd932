//! pathrpc-transport - Body codec and wire error envelope
//!
//! This crate provides:
//! - [`Codec`] trait for encoding/decoding request and reply bodies
//! - [`JsonCodec`] reference implementation
//! - [`ErrorEnvelope`] for carrying a structured error across the wire

mod codec;
mod envelope;

pub use codec::{Codec, CodecError, JsonCodec};
pub use envelope::ErrorEnvelope;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Codec, CodecError, ErrorEnvelope, JsonCodec};
}
