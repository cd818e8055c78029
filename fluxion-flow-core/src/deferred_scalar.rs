// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A subscription that delivers at most one value once both the value and demand exist.
//!
//! The carrier is handed to the consumer before the value is known, so the consumer can
//! request or cancel early. The producer later calls [`complete`] or [`fail`]; whichever
//! of value and demand arrives last triggers `on_next` + `on_complete`.
//!
//! [`complete`]: DeferredScalarSubscription::complete
//! [`fail`]: DeferredScalarSubscription::fail

use crate::backpressure::{enter_drain, leave_drain, validate_request};
use crate::fluxion_error::{FluxionError, Result};
use crate::hooks;
use crate::introspect::Introspect;
use crate::subscriber::{Downstream, Subscriber};
use crate::subscription::{QueueSubscription, Subscription};
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use parking_lot::Mutex;

const HAS_REQUEST: u8 = 0b0001;
const HAS_VALUE: u8 = 0b0010;
const CANCELLED: u8 = 0b0100;
const TERMINATED: u8 = 0b1000;
const INSTALLED: u8 = 0b1_0000;

pub struct DeferredScalarSubscription<T> {
    state: AtomicU8,
    value: Mutex<Option<T>>,
    error: Mutex<Option<FluxionError>>,
    downstream: Mutex<Option<Downstream<T>>>,
    wip: AtomicUsize,
}

impl<T> DeferredScalarSubscription<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
            value: Mutex::new(None),
            error: Mutex::new(None),
            downstream: Mutex::new(None),
            wip: AtomicUsize::new(0),
        }
    }

    /// Attaches the consumer once its `on_subscribe` has returned.
    ///
    /// Signals that became ready while the consumer was not attached are delivered now.
    pub fn install(&self, downstream: Downstream<T>) {
        *self.downstream.lock() = Some(downstream);
        self.state.fetch_or(INSTALLED, Ordering::AcqRel);
        self.drain();
    }

    /// Stages the single value.
    pub fn complete(&self, value: T) {
        if self.has(CANCELLED | TERMINATED) {
            return;
        }
        *self.value.lock() = Some(value);
        self.state.fetch_or(HAS_VALUE, Ordering::AcqRel);
        self.drain();
    }

    /// Stages an error in place of the value.
    ///
    /// After cancellation or termination the error goes to the dropped-signal hook.
    pub fn fail(&self, error: FluxionError) {
        if self.has(CANCELLED | TERMINATED) {
            hooks::on_error_dropped(&error);
            return;
        }
        {
            let mut pending = self.error.lock();
            if pending.is_some() {
                drop(pending);
                hooks::on_error_dropped(&error);
                return;
            }
            *pending = Some(error);
        }
        self.drain();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.has(CANCELLED)
    }

    fn has(&self, bits: u8) -> bool {
        self.state.load(Ordering::Acquire) & bits != 0
    }

    fn drain(&self) {
        if !enter_drain(&self.wip) {
            return;
        }

        let mut missed = 1;
        loop {
            self.deliver();

            missed = leave_drain(&self.wip, missed);
            if missed == 0 {
                break;
            }
        }
    }

    fn deliver(&self) {
        let mut slot = self.downstream.lock();
        let Some(downstream) = slot.as_mut() else {
            return;
        };

        let state = self.state.load(Ordering::Acquire);
        if state & CANCELLED != 0 {
            slot.take();
            return;
        }
        if state & TERMINATED != 0 {
            return;
        }

        let pending = self.error.lock().take();
        if let Some(error) = pending {
            self.state.fetch_or(TERMINATED, Ordering::AcqRel);
            downstream.on_error(error);
            slot.take();
            return;
        }

        if state & (HAS_REQUEST | HAS_VALUE) == HAS_REQUEST | HAS_VALUE {
            let value = self.value.lock().take();
            if let Some(value) = value {
                self.state.fetch_or(TERMINATED, Ordering::AcqRel);
                downstream.on_next(value);
                if !self.has(CANCELLED) {
                    downstream.on_complete();
                }
                slot.take();
            }
        }
    }
}

impl<T> Default for DeferredScalarSubscription<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Subscription for DeferredScalarSubscription<T> {
    fn request(&self, n: u64) {
        match validate_request(n) {
            Ok(_) => {
                self.state.fetch_or(HAS_REQUEST, Ordering::AcqRel);
                self.drain();
            }
            Err(error) => {
                self.value.lock().take();
                self.fail(error);
            }
        }
    }

    fn cancel(&self) {
        let previous = self.state.fetch_or(CANCELLED, Ordering::AcqRel);
        if previous & CANCELLED == 0 {
            self.value.lock().take();
            self.drain();
        }
    }
}

/// The value only exists after `on_subscribe`, so sync fusion is always refused; the
/// pull surface reads the staged value for consumers inspecting the carrier directly.
impl<T: Clone + Send> QueueSubscription<T> for DeferredScalarSubscription<T> {
    fn poll(&self) -> Result<Option<T>> {
        Ok(self.value.lock().take())
    }

    fn peek(&self) -> Result<Option<T>> {
        Ok(self.value.lock().clone())
    }

    fn drop_peeked(&self) {
        self.value.lock().take();
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.value.lock().is_none())
    }

    fn clear(&self) {
        self.value.lock().take();
    }

    fn request_sync_fusion(&self) -> bool {
        false
    }
}

impl<T> Introspect for DeferredScalarSubscription<T> {
    fn is_started(&self) -> bool {
        let state = self.state.load(Ordering::Acquire);
        state & INSTALLED != 0 && state & (CANCELLED | TERMINATED) == 0
    }

    fn is_terminated(&self) -> bool {
        self.has(CANCELLED | TERMINATED)
    }
}
