// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Reactive stream operators built on `fluxion-flow-core`.
//!
//! - [`PublisherArray`] - synchronous, fusion-capable source over a fixed set of values
//! - [`PublisherCallable`] - computes one value per subscriber
//! - [`PublisherFilterFuseable`] - forwards the values accepted by a predicate, in push
//!   and in fused pull mode
//! - [`PublisherStream`] - consumes any publisher as a `futures::Stream`
//!
//! # Examples
//!
//! ```
//! use fluxion_flow::{PublisherArray, PublisherFilterFuseable, PublisherStream};
//! use futures::executor::block_on_stream;
//!
//! let source = PublisherArray::new(vec![1, 2, 3, 4, 5, 6]);
//! let evens = PublisherFilterFuseable::new(source, |n: &i32| n % 2 == 0).unwrap();
//!
//! let stream = PublisherStream::new(&evens, 16).unwrap();
//! let values: Vec<i32> = block_on_stream(stream).map(|item| item.unwrap()).collect();
//!
//! assert_eq!(values, vec![2, 4, 6]);
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

#[macro_use]
mod logging;

pub mod array;
pub mod callable;
pub mod filter_fuseable;
pub mod publisher_stream;

pub use self::array::PublisherArray;
pub use self::callable::PublisherCallable;
pub use self::filter_fuseable::PublisherFilterFuseable;
pub use self::publisher_stream::PublisherStream;
