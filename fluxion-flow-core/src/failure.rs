// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Classification of failures raised by user code.
//!
//! Predicates and computations fail either by returning an error or by panicking. A panic
//! carrying a [`Fatal`] payload marks a state the stream must not swallow: it is rethrown
//! with [`std::panic::resume_unwind`] before any consumer callback runs. Every other
//! failure becomes a [`FluxionError`] delivered through `on_error`, after stripping any
//! [`FluxionError::Propagated`] wrapper layers.
//!
//! ```
//! use fluxion_flow_core::failure::{self, Failure};
//!
//! let outcome = failure::catch_user(|| -> bool { panic!("predicate exploded") });
//!
//! match outcome {
//!     Err(Failure::Recoverable(e)) => assert!(e.to_string().contains("predicate exploded")),
//!     _ => unreachable!(),
//! }
//! ```

use crate::fluxion_error::FluxionError;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Panic payload for failures that must abort instead of becoming a stream error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fatal {
    reason: Cow<'static, str>,
}

impl Fatal {
    pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Unwinds with a fatal payload.
    pub fn raise(reason: impl Into<Cow<'static, str>>) -> ! {
        panic::panic_any(Self::new(reason))
    }
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fatal: {}", self.reason)
    }
}

/// Outcome of classifying a failure.
pub enum Failure {
    /// Must be rethrown as-is; carries the original panic payload.
    Fatal(Box<dyn Any + Send>),
    /// Becomes the stream's error outcome.
    Recoverable(FluxionError),
}

impl Failure {
    /// Classifies a caught panic payload.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if payload.is::<Fatal>() {
            return Self::Fatal(payload);
        }

        let payload = match payload.downcast::<FluxionError>() {
            Ok(error) => return Self::Recoverable(unwrap(*error)),
            Err(other) => other,
        };

        let context = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic payload".to_string()
        };

        Self::Recoverable(FluxionError::callback_panic(context))
    }

    /// Classifies an error returned by user code. Returned errors are never fatal.
    #[must_use]
    pub fn from_error(error: FluxionError) -> Self {
        Self::Recoverable(unwrap(error))
    }

    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Rethrows a fatal failure, returns the error of a recoverable one.
    pub fn into_recoverable(self) -> FluxionError {
        match self {
            Self::Fatal(payload) => {
                error!("fatal failure in user code, rethrowing");
                panic::resume_unwind(payload)
            }
            Self::Recoverable(error) => error,
        }
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(payload) => match payload.downcast_ref::<Fatal>() {
                Some(fatal) => f.debug_tuple("Fatal").field(fatal).finish(),
                None => f.write_str("Fatal(..)"),
            },
            Self::Recoverable(error) => f.debug_tuple("Recoverable").field(error).finish(),
        }
    }
}

/// Runs user code, turning a panic into a classified [`Failure`].
///
/// # Errors
/// Returns the classified failure if `f` panics.
pub fn catch_user<R>(f: impl FnOnce() -> R) -> Result<R, Failure> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(Failure::from_panic)
}

/// Strips every [`FluxionError::Propagated`] layer.
#[must_use]
pub fn unwrap(error: FluxionError) -> FluxionError {
    let mut error = error;
    while let FluxionError::Propagated(inner) = error {
        error = *inner;
    }
    error
}

/// Raises `error` from inside user code that cannot return one, such as a predicate.
///
/// The stage running the user code catches it and delivers the unwrapped `error`.
pub fn propagate(error: FluxionError) -> ! {
    panic::panic_any(error.propagated())
}
