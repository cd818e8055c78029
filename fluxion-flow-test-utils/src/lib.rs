// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the fluxion-flow crates.
//!
//! Operators are driven from both ends in tests:
//!
//! - **Upstream**: [`ManualPublisher`] hands out a scriptable subscription, records every
//!   `request` / `cancel` it receives and lets the test emit arbitrary signals, including
//!   protocol-violating ones.
//! - **Downstream**: [`TestSubscriber`] records every signal it receives. Its
//!   [`TestProbe`] stays with the test after the subscriber was handed to a publisher.
//! - **Side channel**: [`DroppedSignalRecorder`] captures the signals reported to the
//!   dropped-signal hook by the current thread.
//!
//! # Examples
//!
//! ```rust
//! use fluxion_flow_core::Publisher;
//! use fluxion_flow_test_utils::{ManualPublisher, Signal, TestSubscriber};
//!
//! let publisher = ManualPublisher::fuseable();
//! let subscriber = TestSubscriber::new().with_request(1);
//! let probe = subscriber.probe();
//!
//! publisher.subscribe(subscriber.into_downstream());
//! publisher.next(7);
//! publisher.complete();
//!
//! assert_eq!(publisher.requests(), vec![1]);
//! assert_eq!(probe.values(), vec![7]);
//! assert_eq!(probe.completions(), 1);
//! assert!(matches!(probe.signals().last(), Some(Signal::Complete)));
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod dropped_signals;
pub mod manual_publisher;
pub mod person;
pub mod test_subscriber;

pub use dropped_signals::{DroppedSignal, DroppedSignalRecorder};
pub use manual_publisher::ManualPublisher;
pub use person::Person;
pub use test_subscriber::{Signal, TestProbe, TestSubscriber};
