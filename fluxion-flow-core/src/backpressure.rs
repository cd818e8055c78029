// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Demand accounting and emission serialisation shared by producers.
//!
//! Demand is tracked in an `AtomicU64` where `u64::MAX` stands for unbounded. Producers
//! serialise their emission with a work-in-progress counter: whoever moves it away from
//! zero runs the drain loop, every other caller only records that more work arrived.
//!
//! ```
//! use core::sync::atomic::AtomicU64;
//! use fluxion_flow_core::backpressure::{add_cap, produced, UNBOUNDED};
//!
//! let requested = AtomicU64::new(0);
//! assert_eq!(add_cap(&requested, 3), 0);
//! assert_eq!(produced(&requested, 2), 1);
//!
//! add_cap(&requested, UNBOUNDED);
//! assert_eq!(produced(&requested, 10), UNBOUNDED);
//! ```

use crate::fluxion_error::{FluxionError, Result};
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Demand value meaning "no limit".
pub const UNBOUNDED: u64 = u64::MAX;

/// Rejects non-positive request amounts.
///
/// # Errors
/// Returns [`FluxionError::InvalidRequest`] when `n == 0`.
pub fn validate_request(n: u64) -> Result<u64> {
    if n == 0 {
        return Err(FluxionError::invalid_request(n));
    }
    Ok(n)
}

/// Adds `n` to `requested`, saturating at [`UNBOUNDED`]. Returns the previous demand.
pub fn add_cap(requested: &AtomicU64, n: u64) -> u64 {
    let mut current = requested.load(Ordering::Acquire);
    loop {
        if current == UNBOUNDED {
            return UNBOUNDED;
        }
        let next = current.saturating_add(n);
        match requested.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(previous) => return previous,
            Err(actual) => current = actual,
        }
    }
}

/// Subtracts `n` emitted values from `requested`. Returns the remaining demand.
///
/// Unbounded demand is never decremented.
pub fn produced(requested: &AtomicU64, n: u64) -> u64 {
    let mut current = requested.load(Ordering::Acquire);
    loop {
        if current == UNBOUNDED {
            return UNBOUNDED;
        }
        let next = current.saturating_sub(n);
        match requested.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

/// Registers a unit of work. Returns `true` if the caller now owns the drain loop.
pub fn enter_drain(wip: &AtomicUsize) -> bool {
    wip.fetch_add(1, Ordering::AcqRel) == 0
}

/// Acknowledges `missed` units of work. Returns how many arrived meanwhile.
///
/// The drain loop exits once this returns zero.
pub fn leave_drain(wip: &AtomicUsize, missed: usize) -> usize {
    wip.fetch_sub(missed, Ordering::AcqRel) - missed
}
