// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::sync::atomic::{AtomicU64, AtomicUsize};
use fluxion_flow_core::backpressure::{
    add_cap, enter_drain, leave_drain, produced, validate_request, UNBOUNDED,
};
use fluxion_flow_core::FluxionError;

#[test]
fn test_validate_request_rejects_zero() {
    // Act
    let result = validate_request(0);

    // Assert
    assert!(matches!(
        result,
        Err(FluxionError::InvalidRequest { requested: 0 })
    ));
    assert_eq!(validate_request(5).ok(), Some(5));
}

#[test]
fn test_add_cap_accumulates_and_saturates() {
    // Arrange
    let requested = AtomicU64::new(0);

    // Act & Assert
    assert_eq!(add_cap(&requested, 2), 0);
    assert_eq!(add_cap(&requested, 3), 2);
    assert_eq!(add_cap(&requested, u64::MAX - 1), 5);
    assert_eq!(add_cap(&requested, 1), UNBOUNDED);
    assert_eq!(produced(&requested, 0), UNBOUNDED);
}

#[test]
fn test_produced_never_decrements_unbounded_demand() {
    // Arrange
    let requested = AtomicU64::new(UNBOUNDED);

    // Act
    let remaining = produced(&requested, 1_000);

    // Assert
    assert_eq!(remaining, UNBOUNDED);
}

#[test]
fn test_produced_returns_remaining_demand() {
    // Arrange
    let requested = AtomicU64::new(10);

    // Act & Assert
    assert_eq!(produced(&requested, 4), 6);
    assert_eq!(produced(&requested, 6), 0);
}

#[test]
fn test_drain_is_entered_once_and_reports_missed_work() {
    // Arrange
    let wip = AtomicUsize::new(0);

    // Act
    let owner = enter_drain(&wip);
    let reentrant = enter_drain(&wip);
    let another = enter_drain(&wip);

    // Assert
    assert!(owner);
    assert!(!reentrant);
    assert!(!another);
    assert_eq!(leave_drain(&wip, 1), 2);
    assert_eq!(leave_drain(&wip, 2), 0);
    assert!(enter_drain(&wip));
}
