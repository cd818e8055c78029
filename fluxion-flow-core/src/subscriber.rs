// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Downstream-facing contracts: the consumer side of the push protocol.

use crate::fluxion_error::FluxionError;
use crate::subscription::SubscriptionHandle;

/// A consumer of values.
///
/// A producer calls `on_subscribe` exactly once, then `on_next` zero or more times, then at
/// most one of `on_error` / `on_complete`. Calls are never concurrent for one consumer.
pub trait Subscriber<T>: Send {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle<T>);

    fn on_next(&mut self, value: T);

    fn on_error(&mut self, error: FluxionError);

    fn on_complete(&mut self);
}

/// A consumer that can report whether it actually consumed a value.
///
/// Producers talking to a conditional consumer call [`try_on_next`](Self::try_on_next) and
/// only count accepted values against the outstanding demand, which saves the consumer a
/// compensating `request(1)` for every value it discards.
pub trait ConditionalSubscriber<T>: Subscriber<T> {
    /// Offers `value`; returns `false` if it was discarded without consuming demand.
    fn try_on_next(&mut self, value: T) -> bool;
}

/// A consumer together with its capability, decided once when subscribing.
pub enum Downstream<T> {
    Plain(Box<dyn Subscriber<T>>),
    Conditional(Box<dyn ConditionalSubscriber<T>>),
}

impl<T> Downstream<T> {
    pub fn plain(subscriber: impl Subscriber<T> + 'static) -> Self {
        Self::Plain(Box::new(subscriber))
    }

    pub fn conditional(subscriber: impl ConditionalSubscriber<T> + 'static) -> Self {
        Self::Conditional(Box::new(subscriber))
    }

    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        matches!(self, Self::Conditional(_))
    }
}

impl<T> Subscriber<T> for Downstream<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle<T>) {
        match self {
            Self::Plain(s) => s.on_subscribe(subscription),
            Self::Conditional(s) => s.on_subscribe(subscription),
        }
    }

    fn on_next(&mut self, value: T) {
        match self {
            Self::Plain(s) => s.on_next(value),
            Self::Conditional(s) => s.on_next(value),
        }
    }

    fn on_error(&mut self, error: FluxionError) {
        match self {
            Self::Plain(s) => s.on_error(error),
            Self::Conditional(s) => s.on_error(error),
        }
    }

    fn on_complete(&mut self) {
        match self {
            Self::Plain(s) => s.on_complete(),
            Self::Conditional(s) => s.on_complete(),
        }
    }
}

impl<T> ConditionalSubscriber<T> for Downstream<T> {
    /// A plain consumer always consumes what it is given.
    fn try_on_next(&mut self, value: T) -> bool {
        match self {
            Self::Plain(s) => {
                s.on_next(value);
                true
            }
            Self::Conditional(s) => s.try_on_next(value),
        }
    }
}
