#![allow(non_snake_case)]

use super::*;
use crate::test_services::{Arith, Builtin, Empty, hidden};
use pathrpc_transport::JsonCodec;
use test_case::test_case;

fn registry() -> Registry<JsonCodec> {
    Registry::new()
}

#[test]
fn Registry___register___returns_normalized_path() {
    let registry = registry();

    let path = registry.register("arith/", Arc::new(Arith)).unwrap();

    assert_eq!(path, "/arith");
    assert!(registry.class("/arith").is_some());
}

#[test]
fn Registry___register_same_normalized_path___second_fails() {
    let registry = registry();
    registry.register("/arith", Arc::new(Arith)).unwrap();

    let result = registry.register("arith/", Arc::new(Builtin));

    assert_eq!(result, Err(RegisterError::AlreadyDefined("/arith".into())));
    assert_eq!(registry.class("/arith").unwrap().service(), "Arith");
}

#[test]
fn Registry___register_without_methods___fails() {
    let result = registry().register("/empty", Arc::new(Empty));

    assert_eq!(
        result,
        Err(RegisterError::NoMethods {
            service: "Empty".into()
        })
    );
}

#[test]
fn Registry___register_unexported_type___fails() {
    let result = registry().register("/hidden", Arc::new(hidden));

    assert_eq!(result, Err(RegisterError::NotExported("hidden".into())));
}

#[test]
fn Registry___failed_register___leaves_registry_unchanged() {
    let registry = registry();

    let _ = registry.register("/empty", Arc::new(Empty));

    assert!(registry.is_empty());
}

#[test_case("" ; "empty")]
#[test_case("/" ; "slash")]
fn Registry___register_root___is_stored_at_slash(prefix: &str) {
    let registry = registry();

    registry.register(prefix, Arc::new(Arith)).unwrap();

    assert_eq!(registry.paths(), vec!["/".to_string()]);
}

#[test]
fn Registry___paths___are_sorted() {
    let registry = registry();
    registry.register("/z", Arc::new(Arith)).unwrap();
    registry.register("/a", Arc::new(Builtin)).unwrap();

    assert_eq!(registry.paths(), vec!["/a".to_string(), "/z".to_string()]);
    assert_eq!(registry.len(), 2);
}

#[test]
fn Class___method___is_case_sensitive() {
    let registry = registry();
    registry.register("/arith", Arc::new(Arith)).unwrap();
    let class = registry.class("/arith").unwrap();

    assert!(class.method("Add").is_some());
    assert!(class.method("add").is_none());
}

#[test]
fn Class___method_names___lists_sorted_names() {
    let registry = registry();
    registry.register("/builtin", Arc::new(Builtin)).unwrap();

    let class = registry.class("/builtin").unwrap();

    assert_eq!(class.method_names(), vec!["Array", "Map", "Printer", "Slice"]);
}

#[test]
fn Registry___concurrent_readers___see_classes_registered_before_spawn() {
    let registry = Arc::new(registry());
    registry.register("/arith", Arc::new(Arith)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.class("/arith").is_some())
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn RegisterError___display___names_the_path() {
    let err = RegisterError::AlreadyDefined("/arith".into());

    assert_eq!(err.to_string(), "register: class already defined: /arith");
}
