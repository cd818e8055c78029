// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Filter operator over fusion-capable sources.

use core::fmt::Debug;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, Ordering};
use fluxion_flow_core::failure::{self, Failure};
use fluxion_flow_core::{
    hooks, ConditionalSubscriber, Downstream, FluxionError, Introspect, Publisher,
    QueueSubscription, Result, Subscriber, Subscription, SubscriptionHandle, SubscriptionSlot,
    TerminalFlag,
};
use std::sync::Arc;

/// Forwards only the values for which `predicate` returns `true`.
///
/// The source must be fuseable, which is checked when the operator is built. Values keep
/// their order and terminal signals pass through unchanged.
///
/// # Behavior
///
/// - **Push**: every rejected value is compensated with a `request(1)` upstream, so a
///   downstream demand of `n` is always answered by `n` accepted values (or completion),
///   however many values are rejected on the way. When the upstream talks to this stage
///   through `try_on_next`, rejected values are reported back instead and the upstream
///   skips them without consuming demand.
/// - **Pull**: the stage is fuseable itself. `poll` and `peek` skip rejected values, and
///   sync fusion is granted whenever the source grants it.
/// - **Failures**: if the predicate panics, the upstream is cancelled and the failure is
///   delivered as `on_error`, unless it is [`Fatal`](fluxion_flow_core::Fatal), in which
///   case it is rethrown without any further signal. In pull mode the failure is returned
///   from `poll` / `peek`.
/// - **Late signals**: anything arriving after the terminal signal goes to the
///   dropped-signal [`hooks`].
///
/// # Examples
///
/// ```
/// use fluxion_flow::{PublisherArray, PublisherFilterFuseable, PublisherStream};
/// use futures::executor::block_on_stream;
///
/// let source = PublisherArray::new(vec![3, 8, 1, 9, 4]);
/// let large = PublisherFilterFuseable::new(source, |n: &i32| *n > 3).unwrap();
///
/// let values: Vec<i32> = block_on_stream(PublisherStream::new(&large, 2).unwrap())
///     .map(|item| item.unwrap())
///     .collect();
///
/// assert_eq!(values, vec![8, 9, 4]);
/// ```
pub struct PublisherFilterFuseable<T, S, P> {
    source: S,
    predicate: Arc<P>,
    _value: PhantomData<fn() -> T>,
}

impl<T, S, P> PublisherFilterFuseable<T, S, P>
where
    S: Publisher<T>,
    P: Fn(&T) -> bool + Send + Sync,
{
    /// Builds the operator on top of `source`.
    ///
    /// # Errors
    /// Returns [`FluxionError::InvalidArgument`] if `source` is not fuseable.
    pub fn new(source: S, predicate: P) -> Result<Self> {
        if !source.is_fuseable() {
            return Err(FluxionError::invalid_argument(
                "the source must be fuseable for the filter operator to work",
            ));
        }

        Ok(Self {
            source,
            predicate: Arc::new(predicate),
            _value: PhantomData,
        })
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn predicate(&self) -> &P {
        &self.predicate
    }
}

impl<T, S, P> Publisher<T> for PublisherFilterFuseable<T, S, P>
where
    T: Debug + Send + 'static,
    S: Publisher<T>,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn subscribe(&self, subscriber: Downstream<T>) {
        let subscription = Arc::new(FilterSubscription {
            upstream: SubscriptionSlot::new(),
            predicate: Arc::clone(&self.predicate),
            done: TerminalFlag::new(),
            cancelled: AtomicBool::new(false),
        });

        self.source
            .subscribe(Downstream::conditional(FilterFuseableSubscriber {
                actual: subscriber,
                predicate: Arc::clone(&self.predicate),
                subscription,
            }));
    }

    fn is_fuseable(&self) -> bool {
        true
    }
}

/// What happened to a value offered to the stage.
enum Offer {
    Forwarded,
    Rejected,
    Stopped,
}

struct FilterFuseableSubscriber<T, P> {
    actual: Downstream<T>,
    predicate: Arc<P>,
    subscription: Arc<FilterSubscription<T, P>>,
}

impl<T, P> FilterFuseableSubscriber<T, P>
where
    T: Debug + Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn offer(&mut self, value: T) -> Offer {
        if self.subscription.done.is_terminated() {
            hooks::on_next_dropped(&value);
            return Offer::Stopped;
        }
        if self.subscription.is_cancelled() {
            return Offer::Stopped;
        }

        match failure::catch_user(|| (self.predicate)(&value)) {
            Ok(true) => {
                if self.actual.try_on_next(value) {
                    Offer::Forwarded
                } else {
                    Offer::Rejected
                }
            }
            Ok(false) => Offer::Rejected,
            Err(failure) => {
                debug!("filter predicate failed: {:?}", failure);
                self.subscription.upstream.cancel();
                let error = failure.into_recoverable();
                self.on_error(error);
                Offer::Stopped
            }
        }
    }
}

impl<T, P> Subscriber<T> for FilterFuseableSubscriber<T, P>
where
    T: Debug + Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn on_subscribe(&mut self, subscription: SubscriptionHandle<T>) {
        match subscription {
            SubscriptionHandle::Fuseable(upstream) => {
                if self.subscription.upstream.set(upstream) {
                    let handle: Arc<dyn QueueSubscription<T>> = self.subscription.clone();
                    self.actual.on_subscribe(SubscriptionHandle::Fuseable(handle));
                }
            }
            SubscriptionHandle::Plain(upstream) => {
                upstream.cancel();
                if self.subscription.done.try_terminate() {
                    self.actual.on_subscribe(SubscriptionHandle::empty());
                    self.actual.on_error(FluxionError::invalid_argument(
                        "the upstream subscription must be fuseable for the filter operator to work",
                    ));
                }
            }
        }
    }

    fn on_next(&mut self, value: T) {
        if let Offer::Rejected = self.offer(value) {
            self.subscription.upstream.request(1);
        }
    }

    fn on_error(&mut self, error: FluxionError) {
        if !self.subscription.done.try_terminate() {
            hooks::on_error_dropped(&error);
            return;
        }
        self.subscription.upstream.release();

        if self.subscription.is_cancelled() {
            hooks::on_error_dropped(&error);
            return;
        }
        self.actual.on_error(error);
    }

    fn on_complete(&mut self) {
        if !self.subscription.done.try_terminate() {
            hooks::on_complete_dropped();
            return;
        }
        self.subscription.upstream.release();

        if !self.subscription.is_cancelled() {
            self.actual.on_complete();
        }
    }
}

impl<T, P> ConditionalSubscriber<T> for FilterFuseableSubscriber<T, P>
where
    T: Debug + Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn try_on_next(&mut self, value: T) -> bool {
        matches!(self.offer(value), Offer::Forwarded)
    }
}

/// The downstream-facing side of the stage. Flow control is relayed to the upstream as-is.
struct FilterSubscription<T, P> {
    upstream: SubscriptionSlot<dyn QueueSubscription<T>>,
    predicate: Arc<P>,
    done: TerminalFlag,
    cancelled: AtomicBool,
}

impl<T, P> FilterSubscription<T, P>
where
    P: Fn(&T) -> bool,
{
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn test(&self, value: &T) -> Result<bool> {
        failure::catch_user(|| (self.predicate)(value)).map_err(Failure::into_recoverable)
    }
}

impl<T, P> Subscription for FilterSubscription<T, P>
where
    T: Send,
    P: Fn(&T) -> bool + Send + Sync,
{
    fn request(&self, n: u64) {
        self.upstream.request(n);
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.upstream.cancel();
        }
    }
}

impl<T, P> QueueSubscription<T> for FilterSubscription<T, P>
where
    T: Send,
    P: Fn(&T) -> bool + Send + Sync,
{
    fn poll(&self) -> Result<Option<T>> {
        let Some(upstream) = self.upstream.get() else {
            return Ok(None);
        };

        loop {
            let Some(value) = upstream.poll()? else {
                return Ok(None);
            };
            if self.test(&value)? {
                return Ok(Some(value));
            }
        }
    }

    fn peek(&self) -> Result<Option<T>> {
        let Some(upstream) = self.upstream.get() else {
            return Ok(None);
        };

        loop {
            let Some(value) = upstream.peek()? else {
                return Ok(None);
            };
            if self.test(&value)? {
                return Ok(Some(value));
            }
            upstream.drop_peeked();
        }
    }

    fn drop_peeked(&self) {
        if let Some(upstream) = self.upstream.get() {
            upstream.drop_peeked();
        }
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.peek()?.is_none())
    }

    fn clear(&self) {
        if let Some(upstream) = self.upstream.get() {
            upstream.clear();
        }
    }

    fn request_sync_fusion(&self) -> bool {
        self.upstream
            .get()
            .is_some_and(|upstream| upstream.request_sync_fusion())
    }
}

impl<T, P> Introspect for FilterSubscription<T, P> {
    fn is_started(&self) -> bool {
        self.upstream.get().is_some() && !self.done.is_terminated()
    }

    fn is_terminated(&self) -> bool {
        self.done.is_terminated() || self.cancelled.load(Ordering::Acquire)
    }
}
