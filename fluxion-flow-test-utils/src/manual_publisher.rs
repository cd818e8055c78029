// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A publisher driven step by step from the test body.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use fluxion_flow_core::{
    ConditionalSubscriber, Downstream, FluxionError, Publisher, QueueSubscription, Result,
    Subscriber, Subscription, SubscriptionHandle,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Fuseable,
    Plain,
    PlainClaimingFuseable,
}

struct Inner<T> {
    kind: Kind,
    grant_fusion: AtomicBool,
    downstream: Mutex<Option<Downstream<T>>>,
    requests: Mutex<Vec<u64>>,
    cancels: AtomicUsize,
    queued: Mutex<VecDeque<T>>,
}

/// A publisher for a single subscriber whose signals are emitted by the test.
///
/// Nothing checks demand or terminal state: the test decides what is sent, which makes
/// it possible to emit signals a well-behaved producer never would.
///
/// Fuseable publishers also expose a pull surface over values queued with
/// [`queue`](Self::queue). Sync fusion is granted only after
/// [`grant_fusion`](Self::grant_fusion).
pub struct ManualPublisher<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ManualPublisher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> ManualPublisher<T> {
    fn with_kind(kind: Kind) -> Self {
        Self {
            inner: Arc::new(Inner {
                kind,
                grant_fusion: AtomicBool::new(false),
                downstream: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
                cancels: AtomicUsize::new(0),
                queued: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Hands out a fuseable subscription.
    #[must_use]
    pub fn fuseable() -> Self {
        Self::with_kind(Kind::Fuseable)
    }

    /// Hands out a push-only subscription and says so.
    #[must_use]
    pub fn plain() -> Self {
        Self::with_kind(Kind::Plain)
    }

    /// Claims to be fuseable but hands out a push-only subscription.
    #[must_use]
    pub fn plain_claiming_fuseable() -> Self {
        Self::with_kind(Kind::PlainClaimingFuseable)
    }

    #[must_use]
    pub fn grant_fusion(self) -> Self {
        self.inner.grant_fusion.store(true, Ordering::Release);
        self
    }

    /// Appends values to the pull surface.
    pub fn queue(&self, values: impl IntoIterator<Item = T>) {
        self.inner.queued.lock().extend(values);
    }

    pub fn next(&self, value: T) {
        self.with_downstream(|downstream| downstream.on_next(value));
    }

    /// Offers `value` through `try_on_next` and returns the answer.
    pub fn try_next(&self, value: T) -> bool {
        let mut accepted = false;
        self.with_downstream(|downstream| accepted = downstream.try_on_next(value));
        accepted
    }

    pub fn error(&self, error: FluxionError) {
        self.with_downstream(|downstream| downstream.on_error(error));
    }

    pub fn complete(&self) {
        self.with_downstream(|downstream| downstream.on_complete());
    }

    /// Delivers a second `on_subscribe` to the attached consumer.
    pub fn resubscribe(&self)
    where
        T: Clone,
    {
        let handle = self.handle();
        self.with_downstream(|downstream| downstream.on_subscribe(handle));
    }

    /// Every `request` received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<u64> {
        self.inner.requests.lock().clone()
    }

    /// Sum of all requests, saturating at `u64::MAX`.
    #[must_use]
    pub fn total_requested(&self) -> u64 {
        self.inner
            .requests
            .lock()
            .iter()
            .fold(0_u64, |total, n| total.saturating_add(*n))
    }

    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.inner.cancels.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.inner.downstream.lock().is_some()
    }

    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.inner
            .downstream
            .lock()
            .as_ref()
            .is_some_and(Downstream::is_conditional)
    }

    fn handle(&self) -> SubscriptionHandle<T>
    where
        T: Clone,
    {
        let subscription = Arc::new(ManualSubscription {
            inner: Arc::clone(&self.inner),
        });
        match self.inner.kind {
            Kind::Fuseable => SubscriptionHandle::Fuseable(subscription),
            Kind::Plain | Kind::PlainClaimingFuseable => SubscriptionHandle::Plain(subscription),
        }
    }

    // The consumer is taken out of the slot while it runs, so it may call back into the
    // subscription freely.
    fn with_downstream(&self, signal: impl FnOnce(&mut Downstream<T>)) {
        let taken = self.inner.downstream.lock().take();
        if let Some(mut downstream) = taken {
            signal(&mut downstream);
            *self.inner.downstream.lock() = Some(downstream);
        }
    }
}

impl<T> Publisher<T> for ManualPublisher<T>
where
    T: Clone + Send + 'static,
{
    fn subscribe(&self, mut subscriber: Downstream<T>) {
        subscriber.on_subscribe(self.handle());
        *self.inner.downstream.lock() = Some(subscriber);
    }

    fn is_fuseable(&self) -> bool {
        self.inner.kind != Kind::Plain
    }
}

struct ManualSubscription<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Send> Subscription for ManualSubscription<T> {
    fn request(&self, n: u64) {
        self.inner.requests.lock().push(n);
    }

    fn cancel(&self) {
        self.inner.cancels.fetch_add(1, Ordering::AcqRel);
    }
}

impl<T: Clone + Send> QueueSubscription<T> for ManualSubscription<T> {
    fn poll(&self) -> Result<Option<T>> {
        Ok(self.inner.queued.lock().pop_front())
    }

    fn peek(&self) -> Result<Option<T>> {
        Ok(self.inner.queued.lock().front().cloned())
    }

    fn drop_peeked(&self) {
        self.inner.queued.lock().pop_front();
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.inner.queued.lock().is_empty())
    }

    fn clear(&self) {
        self.inner.queued.lock().clear();
    }

    fn request_sync_fusion(&self) -> bool {
        self.inner.grant_fusion.load(Ordering::Acquire)
    }
}
