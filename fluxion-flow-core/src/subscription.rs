// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Upstream-facing handles: demand, cancellation and the synchronous pull surface.

use crate::fluxion_error::{FluxionError, Result};
use crate::hooks;
use parking_lot::Mutex;
use std::sync::Arc;

/// The handle a consumer uses to talk to its producer.
///
/// Both methods may be called concurrently with signal delivery and from any thread.
pub trait Subscription: Send + Sync {
    /// Grants permission to deliver up to `n` more values.
    ///
    /// Demand is cumulative and saturates at `u64::MAX`, which means unbounded.
    /// `n == 0` is a protocol violation that the producer reports through `on_error`.
    fn request(&self, n: u64);

    /// Stops all future signals to the consumer. Idempotent.
    fn cancel(&self);
}

/// A subscription that can also be drained synchronously.
///
/// A consumer first calls [`request_sync_fusion`](Self::request_sync_fusion). If the
/// producer agrees, the consumer pulls with [`poll`](Self::poll) until `Ok(None)` and must
/// not use `request` for the fused values.
pub trait QueueSubscription<T>: Subscription {
    /// Removes and returns the next value, or `None` when exhausted.
    ///
    /// # Errors
    /// Returns the recoverable failure raised while producing the value.
    fn poll(&self) -> Result<Option<T>>;

    /// Returns the next value without removing it.
    ///
    /// # Errors
    /// Returns the recoverable failure raised while producing the value.
    fn peek(&self) -> Result<Option<T>>;

    /// Discards the value returned by the previous [`peek`](Self::peek).
    fn drop_peeked(&self);

    /// Returns `true` if no value is available.
    ///
    /// # Errors
    /// Returns the recoverable failure raised while looking ahead.
    fn is_empty(&self) -> Result<bool>;

    /// Discards all buffered state.
    fn clear(&self);

    /// Asks the producer to operate in pure synchronous pull mode.
    fn request_sync_fusion(&self) -> bool;
}

/// What a consumer receives in `on_subscribe`.
pub enum SubscriptionHandle<T> {
    /// A push-only subscription
    Plain(Arc<dyn Subscription>),
    /// A subscription that also exposes the pull surface
    Fuseable(Arc<dyn QueueSubscription<T>>),
}

impl<T> SubscriptionHandle<T> {
    /// An inert handle that ignores every call.
    #[must_use]
    pub fn empty() -> Self {
        Self::Plain(Arc::new(EmptySubscription))
    }

    pub fn request(&self, n: u64) {
        match self {
            Self::Plain(s) => s.request(n),
            Self::Fuseable(s) => s.request(n),
        }
    }

    pub fn cancel(&self) {
        match self {
            Self::Plain(s) => s.cancel(),
            Self::Fuseable(s) => s.cancel(),
        }
    }

    #[must_use]
    pub const fn is_fuseable(&self) -> bool {
        matches!(self, Self::Fuseable(_))
    }

    /// Borrows the pull surface, if the producer offers one.
    #[must_use]
    pub const fn as_fuseable(&self) -> Option<&Arc<dyn QueueSubscription<T>>> {
        match self {
            Self::Plain(_) => None,
            Self::Fuseable(s) => Some(s),
        }
    }
}

impl<T> Clone for SubscriptionHandle<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(s) => Self::Plain(Arc::clone(s)),
            Self::Fuseable(s) => Self::Fuseable(Arc::clone(s)),
        }
    }
}

/// A subscription that does nothing. Used once a stage has released its upstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySubscription;

impl Subscription for EmptySubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}

impl<T> QueueSubscription<T> for EmptySubscription {
    fn poll(&self) -> Result<Option<T>> {
        Ok(None)
    }

    fn peek(&self) -> Result<Option<T>> {
        Ok(None)
    }

    fn drop_peeked(&self) {}

    fn is_empty(&self) -> Result<bool> {
        Ok(true)
    }

    fn clear(&self) {}

    fn request_sync_fusion(&self) -> bool {
        false
    }
}

enum SlotState<S: ?Sized> {
    Empty,
    Active(Arc<S>),
    Released,
}

/// Holds the upstream subscription of a stage.
///
/// The slot accepts exactly one subscription. A second one is cancelled and reported as a
/// [`FluxionError::DuplicateSubscription`] to the dropped-signal hook. Once released the
/// slot behaves like an [`EmptySubscription`].
pub struct SubscriptionSlot<S: ?Sized> {
    state: Mutex<SlotState<S>>,
}

impl<S: Subscription + ?Sized> SubscriptionSlot<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Stores `subscription` if the slot is empty.
    ///
    /// Returns `false` and cancels `subscription` otherwise.
    pub fn set(&self, subscription: Arc<S>) -> bool {
        {
            let mut state = self.state.lock();
            if matches!(*state, SlotState::Empty) {
                *state = SlotState::Active(subscription);
                return true;
            }
        }

        subscription.cancel();
        warn!("rejecting second subscription for an already subscribed stage");
        hooks::on_error_dropped(&FluxionError::DuplicateSubscription);
        false
    }

    /// Returns the active subscription, if any.
    pub fn get(&self) -> Option<Arc<S>> {
        match &*self.state.lock() {
            SlotState::Active(s) => Some(Arc::clone(s)),
            SlotState::Empty | SlotState::Released => None,
        }
    }

    /// Drops the held subscription without cancelling it.
    pub fn release(&self) {
        let previous = core::mem::replace(&mut *self.state.lock(), SlotState::Released);
        drop(previous);
    }

    /// Cancels and releases the held subscription.
    pub fn cancel(&self) {
        let previous = core::mem::replace(&mut *self.state.lock(), SlotState::Released);
        if let SlotState::Active(s) = previous {
            s.cancel();
        }
    }

    pub fn request(&self, n: u64) {
        if let Some(s) = self.get() {
            s.request(n);
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        !matches!(*self.state.lock(), SlotState::Empty)
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Released)
    }
}

impl<S: Subscription + ?Sized> Default for SubscriptionSlot<S> {
    fn default() -> Self {
        Self::new()
    }
}
