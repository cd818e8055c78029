// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Synchronous source emitting a fixed set of values.

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use fluxion_flow_core::backpressure::{add_cap, enter_drain, leave_drain, produced, validate_request};
use fluxion_flow_core::{
    ConditionalSubscriber, Downstream, FluxionError, Publisher, QueueSubscription, Result,
    Subscriber, Subscription, SubscriptionHandle, TerminalFlag,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Emits the values of a slice, in order, honouring demand.
///
/// Every subscriber sees all values followed by `on_complete`; an empty source completes
/// right after `on_subscribe`. Conditional subscribers are offered values through
/// `try_on_next` and rejected values do not consume demand. Subscriptions accept sync
/// fusion, after which the consumer walks the slice with `poll`.
///
/// # Examples
///
/// ```
/// use fluxion_flow::{PublisherArray, PublisherStream};
/// use futures::executor::block_on_stream;
///
/// let source = PublisherArray::new(vec!["a", "b"]);
/// let items: Vec<_> = block_on_stream(PublisherStream::new(&source, 1).unwrap())
///     .map(|item| item.unwrap())
///     .collect();
///
/// assert_eq!(items, vec!["a", "b"]);
/// ```
#[derive(Debug)]
pub struct PublisherArray<T> {
    values: Arc<[T]>,
}

impl<T> PublisherArray<T> {
    pub fn new(values: impl Into<Arc<[T]>>) -> Self {
        Self {
            values: values.into(),
        }
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T> Clone for PublisherArray<T> {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
        }
    }
}

impl<T> Publisher<T> for PublisherArray<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe(&self, mut subscriber: Downstream<T>) {
        let subscription = Arc::new(ArraySubscription::new(Arc::clone(&self.values)));
        subscriber.on_subscribe(SubscriptionHandle::Fuseable(subscription.clone()));
        subscription.install(subscriber);
    }

    fn is_fuseable(&self) -> bool {
        true
    }
}

struct ArraySubscription<T> {
    values: Arc<[T]>,
    index: AtomicUsize,
    requested: AtomicU64,
    cancelled: AtomicBool,
    failed: AtomicBool,
    fused: AtomicBool,
    error: Mutex<Option<FluxionError>>,
    done: TerminalFlag,
    downstream: Mutex<Option<Downstream<T>>>,
    wip: AtomicUsize,
}

impl<T: Clone> ArraySubscription<T> {
    fn new(values: Arc<[T]>) -> Self {
        Self {
            values,
            index: AtomicUsize::new(0),
            requested: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            fused: AtomicBool::new(false),
            error: Mutex::new(None),
            done: TerminalFlag::new(),
            downstream: Mutex::new(None),
            wip: AtomicUsize::new(0),
        }
    }

    fn install(&self, downstream: Downstream<T>) {
        *self.downstream.lock() = Some(downstream);
        self.drain();
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

        if self.cancelled.load(Ordering::Acquire) {
            slot.take();
            return;
        }
        if self.fused.load(Ordering::Acquire) {
            return;
        }

        let pending = self.error.lock().take();
        if let Some(error) = pending {
            if self.done.try_terminate() {
                downstream.on_error(error);
            }
            slot.take();
            return;
        }

        if self.emit(downstream) {
            slot.take();
        }
    }

    // Returns true once the downstream has received its terminal signal.
    fn emit(&self, downstream: &mut Downstream<T>) -> bool {
        let len = self.values.len();
        let mut requested = self.requested.load(Ordering::Acquire);
        let mut emitted = 0;

        loop {
            while emitted != requested {
                if self.is_interrupted() {
                    return false;
                }

                let index = self.index.load(Ordering::Acquire);
                if index == len {
                    break;
                }
                self.index.store(index + 1, Ordering::Release);

                if downstream.try_on_next(self.values[index].clone()) {
                    emitted += 1;
                }
            }

            if self.is_interrupted() {
                return false;
            }

            if self.index.load(Ordering::Acquire) == len {
                if self.done.try_terminate() {
                    downstream.on_complete();
                }
                return true;
            }

            requested = self.requested.load(Ordering::Acquire);
            if requested == emitted {
                requested = produced(&self.requested, emitted);
                if requested == 0 {
                    return false;
                }
                emitted = 0;
            }
        }
    }

    fn is_interrupted(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || self.failed.load(Ordering::Acquire)
    }
}

impl<T> Subscription for ArraySubscription<T>
where
    T: Clone + Send + Sync,
{
    fn request(&self, n: u64) {
        match validate_request(n) {
            Ok(n) => {
                if self.fused.load(Ordering::Acquire) {
                    return;
                }
                add_cap(&self.requested, n);
            }
            Err(error) => {
                debug!("array source received invalid request");
                if self.failed.swap(true, Ordering::AcqRel) {
                    return;
                }
                *self.error.lock() = Some(error);
            }
        }
        self.drain();
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.drain();
        }
    }
}

impl<T> QueueSubscription<T> for ArraySubscription<T>
where
    T: Clone + Send + Sync,
{
    fn poll(&self) -> Result<Option<T>> {
        let value = self.peek()?;
        if value.is_some() {
            self.drop_peeked();
        }
        Ok(value)
    }

    fn peek(&self) -> Result<Option<T>> {
        if self.cancelled.load(Ordering::Acquire) {
            return Ok(None);
        }
        let index = self.index.load(Ordering::Acquire);
        Ok(self.values.get(index).cloned())
    }

    fn drop_peeked(&self) {
        let len = self.values.len();
        // Only the fused consumer moves the index, so load + store cannot race.
        let index = self.index.load(Ordering::Acquire);
        if index < len {
            self.index.store(index + 1, Ordering::Release);
        }
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.cancelled.load(Ordering::Acquire)
            || self.index.load(Ordering::Acquire) >= self.values.len())
    }

    fn clear(&self) {
        self.index.store(self.values.len(), Ordering::Release);
    }

    fn request_sync_fusion(&self) -> bool {
        self.fused.store(true, Ordering::Release);
        true
    }
}
