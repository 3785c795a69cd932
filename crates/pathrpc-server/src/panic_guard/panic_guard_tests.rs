#![allow(non_snake_case)]

use super::*;

#[test]
fn catch_panic___successful_function___returns_ok() {
    let result = catch_panic(|| 42);

    assert_eq!(result, Ok(42));
}

#[test]
fn catch_panic___panic_with_str___reports_message() {
    let report = catch_panic(|| -> () { panic!("Test panic") }).unwrap_err();

    assert_eq!(report.message, "Test panic");
}

#[test]
fn catch_panic___panic_with_formatted_string___reports_message() {
    let value = 7;

    let report = catch_panic(|| -> () { panic!("bad value {value}") }).unwrap_err();

    assert_eq!(report.message, "bad value 7");
}

#[test]
fn catch_panic___panic___records_location_and_stack() {
    let report = catch_panic(|| -> () { panic!("located") }).unwrap_err();

    let location = report.location.unwrap();
    assert!(location.contains("panic_guard_tests.rs"));
    assert!(!report.stack.is_empty());
}

#[test]
fn catch_panic___non_string_payload___uses_placeholder() {
    let report = catch_panic(|| -> () { std::panic::panic_any(17_u32) }).unwrap_err();

    assert_eq!(report.message, "panic with non-string payload");
}

#[test]
fn catch_panic___after_panic___thread_remains_usable() {
    let _ = catch_panic(|| -> () { panic!("first") });

    let result = catch_panic(|| "second");

    assert_eq!(result, Ok("second"));
}

#[test]
fn catch_panic___nested_guard___inner_panic_does_not_escape() {
    let result = catch_panic(|| catch_panic(|| -> () { panic!("inner") }).is_err());

    assert_eq!(result, Ok(true));
}

#[test]
fn unhooked_report___str_payload___keeps_message_and_captures_stack() {
    let payload: Box<dyn Any + Send> = Box::new("replaced hook");

    let report = unhooked_report(payload.as_ref());

    assert_eq!(report.message, "replaced hook");
    assert_eq!(report.location, None);
    assert!(!report.stack.is_empty());
}

#[test]
fn PanicReport___into_error___carries_panic_code_and_message() {
    let report = PanicReport {
        message: "ERROR".into(),
        location: None,
        stack: "frame".into(),
    };

    let err = report.into_error();

    assert_eq!(err.code(), Code::PANIC);
    assert_eq!(err.cause_text(), "ERROR");
}
