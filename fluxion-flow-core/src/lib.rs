// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Protocol core for push-based, backpressure-aware reactive streams.
//!
//! A [`Publisher`] hands each [`Subscriber`] a [`SubscriptionHandle`] through which the
//! subscriber grants demand (`request(n)`) or stops the exchange (`cancel()`). Producers
//! never emit more values than requested. Stages that can expose their values through a
//! synchronous pull queue advertise a [`QueueSubscription`], letting a downstream consumer
//! negotiate *sync fusion* and `poll` values instead of receiving pushes.
//!
//! Failures raised by user code are classified by the [`failure`] module: fatal failures
//! are rethrown immediately, everything else becomes the stream's error outcome.
//!
//! # Module Organization
//!
//! - `subscriber` / `subscription` / `publisher` - the push and pull contracts
//! - `backpressure` - demand accounting and drain-loop serialisation
//! - `terminal` - exactly-once terminal transitions
//! - `deferred_scalar` - single-value carrier used by scalar sources
//! - `failure` - fatal vs recoverable classification of user-code failures
//! - `hooks` - side channel for signals arriving after a terminal state

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

#[macro_use]
mod logging;

pub mod backpressure;
pub mod deferred_scalar;
pub mod failure;
pub mod fluxion_error;
pub mod hooks;
pub mod introspect;
pub mod publisher;
pub mod stream_item;
pub mod subscriber;
pub mod subscription;
pub mod terminal;

pub use self::deferred_scalar::DeferredScalarSubscription;
pub use self::failure::{Failure, Fatal};
pub use self::fluxion_error::{FluxionError, IntoFluxionError, Result, ResultExt};
pub use self::introspect::Introspect;
pub use self::publisher::Publisher;
pub use self::stream_item::StreamItem;
pub use self::subscriber::{ConditionalSubscriber, Downstream, Subscriber};
pub use self::subscription::{
    EmptySubscription, QueueSubscription, Subscription, SubscriptionHandle, SubscriptionSlot,
};
pub use self::terminal::TerminalFlag;
