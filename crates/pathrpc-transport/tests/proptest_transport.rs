//! Property-based tests for the wire error envelope
//!
//! Tests that envelopes survive the JSON codec with any code, cause and stack,
//! and that reconstruction preserves the error a caller observes.

use pathrpc_core::{Code, RpcError};
use pathrpc_transport::{Codec, ErrorEnvelope, JsonCodec};
use proptest::prelude::*;

// Strategy: failure codes (0 is success and never sent)
fn arb_failure_code() -> impl Strategy<Value = i32> {
    any::<i32>().prop_filter("non-zero", |code| *code != 0)
}

proptest! {
    /// Property: an envelope survives encode/decode losslessly
    #[test]
    fn proptest_envelope_roundtrip(
        code in arb_failure_code(),
        error in ".*",
        cause in ".*",
        stack in ".*"
    ) {
        let codec = JsonCodec::new();
        let envelope = ErrorEnvelope { code, error, cause, stack };

        let bytes = codec.encode(&envelope).expect("envelope should encode");
        let recovered: ErrorEnvelope = codec.decode(&bytes).expect("envelope should decode");

        prop_assert_eq!(recovered, envelope);
    }

    /// Property: a reconstructed error reports the same code and cause
    #[test]
    fn proptest_envelope_reconstructs_error(code in arb_failure_code(), cause in ".*") {
        let local = RpcError::msg(Code(code), cause.clone());

        let remote = ErrorEnvelope::from_error(&local).into_error();

        prop_assert_eq!(remote.code(), Code(code));
        prop_assert_eq!(remote.cause_text(), cause);
    }

    /// Property: the envelope code is never success
    #[test]
    fn proptest_envelope_code_is_never_ok(code in any::<i32>()) {
        let envelope = ErrorEnvelope::from_error(&RpcError::from_code(Code(code)));

        prop_assert_ne!(envelope.code, 0);
    }
}
