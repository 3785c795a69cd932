#![allow(non_snake_case)]

use super::*;
use crate::test_services::{Arith, Builtin, Embed, Greeter};
use pathrpc_transport::JsonCodec;
use test_case::test_case;

fn table<S: Service>(receiver: S) -> HashMap<String, Method<JsonCodec>> {
    MethodTable::<S, JsonCodec>::build(Arc::new(receiver)).into_methods()
}

fn run(method: &Method<JsonCodec>, body: &[u8]) -> Vec<u8> {
    let codec = JsonCodec::new();
    let mut call = method.prepare();
    call.decode_args(&codec, body).unwrap();
    call.invoke(&mut CallContext::new()).unwrap();
    call.encode_reply(&codec).unwrap()
}

// MethodTable tests

#[test]
fn MethodTable___build___collects_every_method() {
    let methods = table(Arith);

    assert_eq!(methods.len(), 7);
    assert!(methods.contains_key("Add"));
    assert!(methods.contains_key("Error"));
}

#[test_case("Add", ArgKind::Value ; "by value")]
#[test_case("Mul", ArgKind::Reference ; "by reference")]
#[test_case("Trace", ArgKind::None ; "unit arguments")]
fn MethodTable___build___records_argument_kind(name: &str, expected: ArgKind) {
    let methods = table(Arith);

    assert_eq!(methods[name].args(), expected);
}

#[test_case("Map", ReplyKind::Container)]
#[test_case("Slice", ReplyKind::Container)]
#[test_case("Array", ReplyKind::Container)]
#[test_case("Printer", ReplyKind::None)]
fn MethodTable___build___records_reply_kind(name: &str, expected: ReplyKind) {
    let methods = table(Builtin);

    assert_eq!(methods[name].reply(), expected);
}

#[test]
fn MethodTable___embed___promotes_inner_methods() {
    let methods = table(Embed {
        greeter: Greeter { greeting: "hello" },
    });

    assert_eq!(methods.len(), 2);
    assert_eq!(run(&methods["Greet"], br#""bob""#), br#""hello, bob""#);
}

#[test]
fn MethodTable___embed_name_collision___outer_method_wins() {
    let methods = table(Embed {
        greeter: Greeter { greeting: "hi" },
    });

    assert_eq!(run(&methods["Add"], br#"{"A":2,"B":3}"#), br#"{"C":5}"#);
}

// PendingCall tests

#[test]
fn PendingCall___by_value___computes_reply() {
    let methods = table(Arith);

    assert_eq!(run(&methods["Add"], br#"{"A":1,"B":2}"#), br#"{"C":3}"#);
}

#[test]
fn PendingCall___by_reference___computes_reply() {
    let methods = table(Arith);

    assert_eq!(run(&methods["Mul"], br#"{"A":6,"B":7}"#), br#"{"C":42}"#);
}

#[test]
fn PendingCall___string_reply___encodes_json_string() {
    let methods = table(Arith);

    assert_eq!(run(&methods["String"], br#"{"A":1,"B":2}"#), br#""1+2=3""#);
}

#[test_case("Map", b"{}" ; "map")]
#[test_case("Slice", b"[]" ; "slice")]
fn PendingCall___untouched_container___encodes_empty_not_null(name: &str, expected: &[u8]) {
    let methods = table(Builtin);

    assert_eq!(run(&methods[name], b"0"), expected);
}

#[test]
fn PendingCall___array_reply___is_pre_initialized() {
    let methods = table(Builtin);
    let codec = JsonCodec::new();

    let call = methods["Array"].prepare();

    assert_eq!(call.encode_reply(&codec).unwrap(), b"[0,0,0]");
}

#[test]
fn PendingCall___unit_arguments___skip_decoding_the_body() {
    let methods = table(Arith);
    let codec = JsonCodec::new();
    let mut call = methods["Trace"].prepare();

    let result = call.decode_args(&codec, b"this is not json");

    assert!(result.is_ok());
}

#[test]
fn PendingCall___invalid_body___returns_codec_error() {
    let methods = table(Arith);
    let codec = JsonCodec::new();
    let mut call = methods["Add"].prepare();

    let result = call.decode_args(&codec, br#"{"A":"x"}"#);

    assert!(matches!(result, Err(CodecError::Deserialization(_))));
}

#[test]
fn PendingCall___invoke_without_decode___returns_error() {
    let methods = table(Arith);
    let mut call = methods["Add"].prepare();

    let result = call.invoke(&mut CallContext::new());

    assert!(result.is_err());
}

#[test]
fn PendingCall___plain_handler_error___is_returned() {
    let methods = table(Arith);
    let codec = JsonCodec::new();
    let mut call = methods["Div"].prepare();
    call.decode_args(&codec, br#"{"A":1,"B":0}"#).unwrap();

    let err = call.invoke(&mut CallContext::new()).unwrap_err();

    assert_eq!(err.to_string(), "divide by zero");
}

#[test]
fn Method___prepare___allocates_fresh_state_per_call() {
    let methods = table(Builtin);

    assert_eq!(run(&methods["Slice"], b"2"), b"[0,1]");
    assert_eq!(run(&methods["Slice"], b"1"), b"[0]");
}
