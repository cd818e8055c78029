// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use fluxion_flow::PublisherCallable;
use fluxion_flow_core::{Fatal, FluxionError, Publisher};
use fluxion_flow_test_utils::{Signal, TestSubscriber};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_callable_emits_value_then_completes() {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let callable = PublisherCallable::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(42))
    });
    let subscriber = TestSubscriber::new().unbounded();
    let probe = subscriber.probe();

    // Act
    callable.subscribe(subscriber.into_downstream());

    // Assert
    assert_eq!(
        probe.signals(),
        vec![
            Signal::Subscribe { fuseable: true },
            Signal::Next(42),
            Signal::Complete,
        ]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_value_is_held_until_requested() {
    // Arrange
    let callable = PublisherCallable::new(|| Ok(Some("ready")));
    let subscriber = TestSubscriber::new();
    let probe = subscriber.probe();
    callable.subscribe(subscriber.into_downstream());
    assert!(probe.values().is_empty());

    // Act
    probe.request(1);

    // Assert
    assert_eq!(probe.values(), vec!["ready"]);
    assert_eq!(probe.completions(), 1);
}

#[test]
fn test_missing_value_is_reported_as_no_value() {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let callable = PublisherCallable::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(None::<u32>)
    });
    let subscriber = TestSubscriber::new();
    let probe = subscriber.probe();

    // Act
    callable.subscribe(subscriber.into_downstream());

    // Assert
    assert!(probe.values().is_empty());
    assert!(matches!(
        &probe.errors()[..],
        [FluxionError::NoValue { .. }]
    ));
    assert_eq!(probe.completions(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cancel_in_on_subscribe_skips_the_computation() {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let callable = PublisherCallable::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(1))
    });
    let subscriber = TestSubscriber::new().cancel_on_subscribe();
    let probe = subscriber.probe();

    // Act
    callable.subscribe(subscriber.into_downstream());

    // Assert
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(probe.signals(), vec![Signal::Subscribe { fuseable: true }]);
}

#[test]
fn test_computation_runs_once_per_subscriber() {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let callable = PublisherCallable::new(move || Ok(Some(counter.fetch_add(1, Ordering::SeqCst))));
    let first = TestSubscriber::new().unbounded();
    let second = TestSubscriber::new().unbounded();
    let (first_probe, second_probe) = (first.probe(), second.probe());

    // Act
    callable.subscribe(first.into_downstream());
    callable.clone().subscribe(second.into_downstream());

    // Assert
    assert_eq!(first_probe.values(), vec![0]);
    assert_eq!(second_probe.values(), vec![1]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_returned_error_is_unwrapped_and_delivered() {
    // Arrange
    let callable = PublisherCallable::new(|| -> fluxion_flow_core::Result<Option<u32>> {
        Err(FluxionError::stream_error("backend unavailable").propagated())
    });
    let subscriber = TestSubscriber::new().with_request(1);
    let probe = subscriber.probe();

    // Act
    callable.subscribe(subscriber.into_downstream());

    // Assert
    assert!(matches!(
        &probe.errors()[..],
        [FluxionError::StreamProcessingError { context }] if context == "backend unavailable"
    ));
}

#[test]
fn test_panicking_computation_becomes_an_error() {
    // Arrange
    let callable = PublisherCallable::new(|| -> fluxion_flow_core::Result<Option<u32>> {
        panic!("division by zero")
    });
    let subscriber = TestSubscriber::new();
    let probe = subscriber.probe();

    // Act
    callable.subscribe(subscriber.into_downstream());

    // Assert
    assert!(matches!(
        &probe.errors()[..],
        [FluxionError::CallbackPanic { context }] if context == "division by zero"
    ));
    assert_eq!(probe.terminations(), 1);
}

#[test]
fn test_fatal_computation_failure_escapes_subscribe() {
    // Arrange
    let callable = PublisherCallable::new(|| -> fluxion_flow_core::Result<Option<u32>> {
        Fatal::raise("thread death")
    });
    let subscriber = TestSubscriber::new().unbounded();
    let probe = subscriber.probe();

    // Act
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        callable.subscribe(subscriber.into_downstream());
    }));

    // Assert
    assert!(outcome.is_err());
    assert_eq!(probe.signals(), vec![Signal::Subscribe { fuseable: true }]);
}

#[test]
fn test_carrier_refuses_sync_fusion() {
    // Arrange
    let callable = PublisherCallable::new(|| Ok(Some(5_u8)));
    let subscriber = TestSubscriber::new().request_sync_fusion().with_request(1);
    let probe = subscriber.probe();

    // Act
    callable.subscribe(subscriber.into_downstream());

    // Assert
    assert!(!probe.is_fused());
    assert_eq!(probe.values(), vec![5]);
}

#[test]
fn test_call_runs_the_computation_directly() -> anyhow::Result<()> {
    // Arrange
    let callable = PublisherCallable::new(|| Ok(Some(String::from("direct"))));

    // Act
    let value = callable.call()?;

    // Assert
    assert_eq!(value.as_deref(), Some("direct"));
    assert!(callable.is_fuseable());
    Ok(())
}
