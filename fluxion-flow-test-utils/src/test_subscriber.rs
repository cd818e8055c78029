// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A recording consumer and the probe used to inspect it.

use core::sync::atomic::{AtomicBool, Ordering};
use fluxion_flow_core::{
    ConditionalSubscriber, Downstream, FluxionError, Result, Subscriber, SubscriptionHandle,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// A signal as observed by a [`TestSubscriber`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal<T> {
    Subscribe { fuseable: bool },
    Next(T),
    /// A value turned down through `try_on_next`
    Rejected(T),
    Error(String),
    Complete,
}

struct ProbeState<T> {
    signals: Mutex<Vec<Signal<T>>>,
    errors: Mutex<Vec<FluxionError>>,
    subscription: Mutex<Option<SubscriptionHandle<T>>>,
    fused: AtomicBool,
}

/// Shared view on what a [`TestSubscriber`] received.
pub struct TestProbe<T> {
    state: Arc<ProbeState<T>>,
}

impl<T> Clone for TestProbe<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone> TestProbe<T> {
    fn new() -> Self {
        Self {
            state: Arc::new(ProbeState {
                signals: Mutex::new(Vec::new()),
                errors: Mutex::new(Vec::new()),
                subscription: Mutex::new(None),
                fused: AtomicBool::new(false),
            }),
        }
    }

    fn record(&self, signal: Signal<T>) {
        self.state.signals.lock().push(signal);
    }

    #[must_use]
    pub fn signals(&self) -> Vec<Signal<T>> {
        self.state.signals.lock().clone()
    }

    /// The values received through `on_next` or accepted through `try_on_next`.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.state
            .signals
            .lock()
            .iter()
            .filter_map(|signal| match signal {
                Signal::Next(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn rejected(&self) -> Vec<T> {
        self.state
            .signals
            .lock()
            .iter()
            .filter_map(|signal| match signal {
                Signal::Rejected(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<FluxionError> {
        self.state.errors.lock().clone()
    }

    #[must_use]
    pub fn completions(&self) -> usize {
        self.count(|signal| matches!(signal, Signal::Complete))
    }

    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.count(|signal| matches!(signal, Signal::Subscribe { .. }))
    }

    /// Number of terminal signals received so far.
    #[must_use]
    pub fn terminations(&self) -> usize {
        self.count(|signal| matches!(signal, Signal::Error(_) | Signal::Complete))
    }

    fn count(&self, predicate: impl Fn(&Signal<T>) -> bool) -> usize {
        self.state.signals.lock().iter().filter(|s| predicate(s)).count()
    }

    /// Returns `true` if sync fusion was requested and granted.
    #[must_use]
    pub fn is_fused(&self) -> bool {
        self.state.fused.load(Ordering::Acquire)
    }

    /// The handle received in `on_subscribe`.
    #[must_use]
    pub fn subscription(&self) -> Option<SubscriptionHandle<T>> {
        self.state.subscription.lock().clone()
    }

    pub fn request(&self, n: u64) {
        if let Some(subscription) = self.subscription() {
            subscription.request(n);
        }
    }

    pub fn cancel(&self) {
        if let Some(subscription) = self.subscription() {
            subscription.cancel();
        }
    }

    /// Pulls every remaining value from a fused subscription.
    ///
    /// # Errors
    /// Returns the first failure raised by `poll`.
    pub fn poll_all(&self) -> Result<Vec<T>> {
        let Some(queue) = self
            .subscription()
            .and_then(|handle| handle.as_fuseable().cloned())
        else {
            return Ok(Vec::new());
        };

        let mut values = Vec::new();
        while let Some(value) = queue.poll()? {
            values.push(value);
        }
        Ok(values)
    }
}

type Accept<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A consumer that records every signal into its [`TestProbe`].
///
/// By default it requests nothing; demand is configured with the builder methods or
/// issued later through the probe.
pub struct TestSubscriber<T> {
    probe: TestProbe<T>,
    handle: Option<SubscriptionHandle<T>>,
    initial_request: Option<u64>,
    cancel_on_subscribe: bool,
    cancel_after: Option<usize>,
    sync_fusion: bool,
    accept: Option<Accept<T>>,
    received: usize,
}

impl<T> TestSubscriber<T>
where
    T: Clone + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            probe: TestProbe::new(),
            handle: None,
            initial_request: None,
            cancel_on_subscribe: false,
            cancel_after: None,
            sync_fusion: false,
            accept: None,
            received: 0,
        }
    }

    /// Requests `n` values from inside `on_subscribe`.
    #[must_use]
    pub fn with_request(mut self, n: u64) -> Self {
        self.initial_request = Some(n);
        self
    }

    #[must_use]
    pub fn unbounded(self) -> Self {
        self.with_request(u64::MAX)
    }

    /// Cancels from inside `on_subscribe`, before any request.
    #[must_use]
    pub fn cancel_on_subscribe(mut self) -> Self {
        self.cancel_on_subscribe = true;
        self
    }

    /// Cancels from inside `on_next` once `count` values were received.
    #[must_use]
    pub fn cancel_after(mut self, count: usize) -> Self {
        self.cancel_after = Some(count);
        self
    }

    /// Asks for sync fusion in `on_subscribe`. Granted fusion replaces the initial request.
    #[must_use]
    pub fn request_sync_fusion(mut self) -> Self {
        self.sync_fusion = true;
        self
    }

    /// Makes the subscriber conditional: `try_on_next` consumes only accepted values.
    #[must_use]
    pub fn accepting(mut self, accept: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.accept = Some(Arc::new(accept));
        self
    }

    #[must_use]
    pub fn probe(&self) -> TestProbe<T> {
        self.probe.clone()
    }

    /// Wraps the subscriber with the capability matching its configuration.
    #[must_use]
    pub fn into_downstream(self) -> Downstream<T> {
        if self.accept.is_some() {
            Downstream::conditional(self)
        } else {
            Downstream::plain(self)
        }
    }
}

impl<T> Default for TestSubscriber<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Subscriber<T> for TestSubscriber<T>
where
    T: Clone + Send + 'static,
{
    fn on_subscribe(&mut self, subscription: SubscriptionHandle<T>) {
        self.probe.record(Signal::Subscribe {
            fuseable: subscription.is_fuseable(),
        });
        *self.probe.state.subscription.lock() = Some(subscription.clone());

        if self.cancel_on_subscribe {
            subscription.cancel();
            return;
        }

        let fused = self.sync_fusion
            && subscription
                .as_fuseable()
                .is_some_and(|queue| queue.request_sync_fusion());
        self.probe.state.fused.store(fused, Ordering::Release);

        if !fused {
            if let Some(n) = self.initial_request {
                subscription.request(n);
            }
        }
        self.handle = Some(subscription);
    }

    fn on_next(&mut self, value: T) {
        self.probe.record(Signal::Next(value));
        self.received += 1;

        if self.cancel_after == Some(self.received) {
            if let Some(handle) = &self.handle {
                handle.cancel();
            }
        }
    }

    fn on_error(&mut self, error: FluxionError) {
        self.probe.record(Signal::Error(error.to_string()));
        self.probe.state.errors.lock().push(error);
    }

    fn on_complete(&mut self) {
        self.probe.record(Signal::Complete);
    }
}

impl<T> ConditionalSubscriber<T> for TestSubscriber<T>
where
    T: Clone + Send + 'static,
{
    fn try_on_next(&mut self, value: T) -> bool {
        let accepted = self.accept.as_ref().map_or(true, |accept| accept(&value));
        if accepted {
            self.on_next(value);
        } else {
            self.probe.record(Signal::Rejected(value));
        }
        accepted
    }
}
