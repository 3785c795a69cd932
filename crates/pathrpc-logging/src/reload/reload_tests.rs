#![allow(non_snake_case)]

use super::*;
use test_case::test_case;
use tracing_subscriber::prelude::*;

#[test_case(LogLevel::Trace, LevelFilter::TRACE)]
#[test_case(LogLevel::Debug, LevelFilter::DEBUG)]
#[test_case(LogLevel::Info, LevelFilter::INFO)]
#[test_case(LogLevel::Warn, LevelFilter::WARN)]
#[test_case(LogLevel::Error, LevelFilter::ERROR)]
#[test_case(LogLevel::Off, LevelFilter::OFF)]
fn level_filter___maps_each_level(level: LogLevel, expected: LevelFilter) {
    assert_eq!(level_filter(level), expected);
}

#[test]
fn ReloadHandle___new___is_not_initialized() {
    let handle = ReloadHandle::new();

    assert!(!handle.is_initialized());
    assert_eq!(handle.current_level(), None);
}

#[test]
fn ReloadHandle___reload_without_handle___fails() {
    let handle = ReloadHandle::new();

    let result = handle.reload_level(LogLevel::Debug);

    assert!(matches!(result, Err(ReloadError::NotInitialized)));
}

#[test]
fn ReloadHandle___reload_level___changes_active_filter() {
    let (layer, inner) = reload::Layer::new(LevelFilter::INFO);
    let subscriber = tracing_subscriber::registry().with(layer);
    let handle = ReloadHandle::new();
    handle.set_handle(inner);

    tracing::subscriber::with_default(subscriber, || {
        handle.reload_level(LogLevel::Warn).unwrap();
    });

    assert!(handle.is_initialized());
    assert_eq!(handle.current_level(), Some(LevelFilter::WARN));
}

#[test]
fn ReloadHandle___reload_after_subscriber_dropped___fails() {
    let handle = ReloadHandle::new();
    {
        let (layer, inner) = reload::Layer::new(LevelFilter::INFO);
        let _subscriber = tracing_subscriber::registry().with(layer);
        handle.set_handle(inner);
    }

    let result = handle.reload_level(LogLevel::Debug);

    assert!(matches!(result, Err(ReloadError::Reload(_))));
}

#[test]
fn ReloadError___display___is_readable() {
    assert_eq!(
        ReloadError::NotInitialized.to_string(),
        "reload handle not initialized"
    );
}
