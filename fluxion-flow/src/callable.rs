// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Single-value source computing its value per subscriber.

use fluxion_flow_core::failure::{self, Failure};
use fluxion_flow_core::{
    DeferredScalarSubscription, Downstream, FluxionError, Introspect, Publisher, Result,
    Subscriber, SubscriptionHandle,
};
use std::sync::Arc;

/// Runs a computation for each subscriber and emits its single value.
///
/// The subscriber receives its subscription before anything is computed. If it cancels
/// from inside `on_subscribe`, the computation never runs. Otherwise the computation runs
/// exactly once and its outcome is delivered:
///
/// - `Ok(Some(value))` - `on_next(value)` then `on_complete()`, as soon as demand exists
/// - `Ok(None)` - `on_error(FluxionError::NoValue)`
/// - `Err(error)` or a recoverable panic - `on_error` with the unwrapped cause
/// - a fatal panic - rethrown to the caller of `subscribe`, no signal
///
/// # Examples
///
/// ```
/// use fluxion_flow::{PublisherCallable, PublisherStream};
/// use futures::executor::block_on_stream;
///
/// let answer = PublisherCallable::new(|| Ok(Some(42)));
/// let items: Vec<_> = block_on_stream(PublisherStream::new(&answer, 1).unwrap())
///     .map(|item| item.unwrap())
///     .collect();
///
/// assert_eq!(items, vec![42]);
/// ```
pub struct PublisherCallable<T, F> {
    callable: Arc<F>,
    _value: core::marker::PhantomData<fn() -> T>,
}

impl<T, F> PublisherCallable<T, F>
where
    F: Fn() -> Result<Option<T>> + Send + Sync,
{
    pub fn new(callable: F) -> Self {
        Self {
            callable: Arc::new(callable),
            _value: core::marker::PhantomData,
        }
    }

    /// The wrapped computation.
    #[must_use]
    pub fn callable(&self) -> &F {
        &self.callable
    }

    /// Invokes the computation directly, without a subscriber.
    ///
    /// # Errors
    /// Returns the computation's error. Panics propagate to the caller.
    pub fn call(&self) -> Result<Option<T>> {
        (self.callable)()
    }
}

impl<T, F> Clone for PublisherCallable<T, F> {
    fn clone(&self) -> Self {
        Self {
            callable: Arc::clone(&self.callable),
            _value: core::marker::PhantomData,
        }
    }
}

impl<T, F> Publisher<T> for PublisherCallable<T, F>
where
    T: Clone + Send + 'static,
    F: Fn() -> Result<Option<T>> + Send + Sync,
{
    fn subscribe(&self, mut subscriber: Downstream<T>) {
        let carrier = Arc::new(DeferredScalarSubscription::new());
        subscriber.on_subscribe(SubscriptionHandle::Fuseable(carrier.clone()));
        carrier.install(subscriber);

        if carrier.is_terminated() {
            trace!("subscriber cancelled before the computation started");
            return;
        }

        let outcome = match failure::catch_user(|| (self.callable)()) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(Failure::from_error(error)),
            Err(failure) => Err(failure),
        };

        match outcome {
            Ok(Some(value)) => carrier.complete(value),
            Ok(None) => carrier.fail(FluxionError::no_value("the callable returned no value")),
            Err(failure) => carrier.fail(failure.into_recoverable()),
        }
    }

    fn is_fuseable(&self) -> bool {
        true
    }
}
