// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Bridge from the push protocol to `futures::Stream`.

use core::fmt::Debug;
use core::pin::Pin;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::{Context, Poll};
use fluxion_flow_core::{
    hooks, Downstream, FluxionError, Publisher, QueueSubscription, Result, StreamItem,
    Subscriber, SubscriptionHandle, TerminalFlag,
};
use futures::task::AtomicWaker;
use futures::Stream;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Consumes a [`Publisher`] as a [`Stream`] of [`StreamItem`]s.
///
/// The stream subscribes eagerly in [`new`](Self::new). If the producer hands out a
/// fuseable subscription that accepts sync fusion, values are pulled straight from it.
/// Otherwise `prefetch` values are requested up front, buffered, and demand is
/// replenished after every `prefetch - prefetch / 4` consumed items.
///
/// An error is yielded as [`StreamItem::Error`] and ends the stream. Dropping the stream
/// cancels the subscription.
pub struct PublisherStream<T> {
    shared: Arc<Shared<T>>,
    limit: u64,
    consumed: u64,
    fused: Option<Arc<dyn QueueSubscription<T>>>,
    finished: bool,
}

impl<T> PublisherStream<T>
where
    T: Debug + Send + 'static,
{
    /// Subscribes to `publisher`.
    ///
    /// # Errors
    /// Returns [`FluxionError::InvalidArgument`] if `prefetch` is zero.
    pub fn new<P>(publisher: &P, prefetch: u64) -> Result<Self>
    where
        P: Publisher<T> + ?Sized,
    {
        if prefetch == 0 {
            return Err(FluxionError::invalid_argument("prefetch must be positive"));
        }

        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            subscription: Mutex::new(None),
            fused: AtomicBool::new(false),
            done: TerminalFlag::new(),
            waker: AtomicWaker::new(),
        });

        publisher.subscribe(Downstream::plain(StreamSubscriber {
            shared: Arc::clone(&shared),
            prefetch,
        }));

        Ok(Self {
            shared,
            limit: (prefetch - prefetch / 4).max(1),
            consumed: 0,
            fused: None,
            finished: false,
        })
    }

    /// Returns `true` if values are pulled from a fused subscription.
    #[must_use]
    pub fn is_fused(&self) -> bool {
        self.shared.fused.load(Ordering::Acquire)
    }

    fn poll_fused(&mut self) -> Option<Poll<Option<StreamItem<T>>>> {
        if self.fused.is_none() {
            if !self.is_fused() {
                return None;
            }
            let subscription = self.shared.subscription.lock().clone();
            self.fused = subscription.and_then(|handle| handle.as_fuseable().cloned());
        }
        let queue = self.fused.as_ref()?;

        let item = match queue.poll() {
            Ok(Some(value)) => Some(StreamItem::Value(value)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                queue.cancel();
                self.finished = true;
                Some(StreamItem::Error(error))
            }
        };
        Some(Poll::Ready(item))
    }

    fn pop(&mut self) -> Option<Poll<Option<StreamItem<T>>>> {
        let item = self.shared.queue.lock().pop_front();
        if let Some(item) = item {
            self.replenish();
            return Some(Poll::Ready(Some(item)));
        }

        if self.shared.done.is_terminated() {
            // The producer may have buffered its last values right before terminating.
            let item = self.shared.queue.lock().pop_front();
            if item.is_none() {
                self.finished = true;
            }
            return Some(Poll::Ready(item));
        }
        None
    }

    fn replenish(&mut self) {
        self.consumed += 1;
        if self.consumed == self.limit {
            self.consumed = 0;
            let subscription = self.shared.subscription.lock().clone();
            if let Some(subscription) = subscription {
                subscription.request(self.limit);
            }
        }
    }
}

impl<T> Stream for PublisherStream<T>
where
    T: Debug + Send + 'static,
{
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        if let Some(poll) = this.poll_fused() {
            return poll;
        }
        if let Some(poll) = this.pop() {
            return poll;
        }

        this.shared.waker.register(cx.waker());

        if let Some(poll) = this.poll_fused() {
            return poll;
        }
        this.pop().unwrap_or(Poll::Pending)
    }
}

impl<T> Drop for PublisherStream<T> {
    fn drop(&mut self) {
        let subscription = self.shared.subscription.lock().take();
        if let Some(subscription) = subscription {
            if !self.finished {
                trace!("stream dropped before termination, cancelling upstream");
            }
            subscription.cancel();
        }
    }
}

struct Shared<T> {
    queue: Mutex<VecDeque<StreamItem<T>>>,
    subscription: Mutex<Option<SubscriptionHandle<T>>>,
    fused: AtomicBool,
    done: TerminalFlag,
    waker: AtomicWaker,
}

struct StreamSubscriber<T> {
    shared: Arc<Shared<T>>,
    prefetch: u64,
}

impl<T> Subscriber<T> for StreamSubscriber<T>
where
    T: Debug + Send + 'static,
{
    fn on_subscribe(&mut self, subscription: SubscriptionHandle<T>) {
        let fused = subscription
            .as_fuseable()
            .is_some_and(|queue| queue.request_sync_fusion());

        *self.shared.subscription.lock() = Some(subscription.clone());

        if fused {
            trace!("stream bridge running in fused mode");
            self.shared.fused.store(true, Ordering::Release);
            self.shared.waker.wake();
        } else {
            subscription.request(self.prefetch);
        }
    }

    fn on_next(&mut self, value: T) {
        if self.shared.done.is_terminated() {
            hooks::on_next_dropped(&value);
            return;
        }
        self.shared.queue.lock().push_back(StreamItem::Value(value));
        self.shared.waker.wake();
    }

    fn on_error(&mut self, error: FluxionError) {
        if self.shared.done.is_terminated() {
            hooks::on_error_dropped(&error);
            return;
        }
        self.shared.queue.lock().push_back(StreamItem::Error(error));
        self.shared.done.try_terminate();
        self.shared.waker.wake();
    }

    fn on_complete(&mut self) {
        if !self.shared.done.try_terminate() {
            hooks::on_complete_dropped();
            return;
        }
        self.shared.waker.wake();
    }
}
