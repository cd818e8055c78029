// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the Fluxion flow protocol.
//!
//! Every failure a consumer can observe through `on_error` is a [`FluxionError`]. The
//! variants fall into three groups:
//!
//! - **Protocol violations**: a participant broke the subscription contract
//!   (`InvalidRequest`, `NoValue`, `DuplicateSubscription`, `InvalidArgument`).
//! - **User-code failures**: a predicate or computation panicked or returned an error
//!   (`CallbackPanic`, `UserError`).
//! - **Wrappers**: `Propagated` marks an error that was raised across a signal boundary
//!   and is stripped again by [`failure::unwrap`](crate::failure::unwrap).
//!
//! # Examples
//!
//! ```
//! use fluxion_flow_core::{FluxionError, Result};
//!
//! fn validate(n: u64) -> Result<u64> {
//!     if n == 0 {
//!         return Err(FluxionError::invalid_request(n));
//!     }
//!     Ok(n)
//! }
//!
//! assert!(validate(0).unwrap_err().is_protocol_violation());
//! ```

/// Root error type for all Fluxion flow operations
#[derive(Debug, thiserror::Error)]
pub enum FluxionError {
    /// A consumer requested a non-positive amount of values
    #[error("Invalid request: demand must be positive, got {requested}")]
    InvalidRequest {
        /// The offending request amount
        requested: u64,
    },

    /// A producer computation returned no value where exactly one was expected
    #[error("No value produced: {context}")]
    NoValue {
        /// Which producer failed to produce
        context: String,
    },

    /// `on_subscribe` was invoked more than once on the same consumer
    #[error("Subscription already set: a consumer can only be subscribed once")]
    DuplicateSubscription,

    /// A stage was assembled with an argument it cannot work with
    #[error("Invalid argument: {context}")]
    InvalidArgument {
        /// Description of the rejected argument
        context: String,
    },

    /// A failure with a textual cause, typically a foreign error given context
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// What failed, followed by the cause
        context: String,
    },

    /// User-provided callback panicked with a recoverable payload
    #[error("User callback panicked: {context}")]
    CallbackPanic {
        /// The panic message, when one could be extracted
        context: String,
    },

    /// An error returned by a predicate or computation, kept as-is
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An error raised across a signal boundary
    #[error("{0}")]
    Propagated(Box<FluxionError>),
}

impl FluxionError {
    /// Create an invalid request error for the given amount
    #[must_use]
    pub const fn invalid_request(requested: u64) -> Self {
        Self::InvalidRequest { requested }
    }

    /// Create a no-value error with the given context
    pub fn no_value(context: impl Into<String>) -> Self {
        Self::NoValue {
            context: context.into(),
        }
    }

    /// Create an invalid argument error with the given context
    pub fn invalid_argument(context: impl Into<String>) -> Self {
        Self::InvalidArgument {
            context: context.into(),
        }
    }

    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Create a callback panic error with the given context
    pub fn callback_panic(context: impl Into<String>) -> Self {
        Self::CallbackPanic {
            context: context.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Wrap this error so it can cross a signal boundary
    #[must_use]
    pub fn propagated(self) -> Self {
        Self::Propagated(Box::new(self))
    }

    /// Check if this error reports a broken subscription contract
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            Self::InvalidRequest { .. }
            | Self::NoValue { .. }
            | Self::DuplicateSubscription
            | Self::InvalidArgument { .. } => true,
            Self::Propagated(inner) => inner.is_protocol_violation(),
            _ => false,
        }
    }

    /// Check if this error originates from user-supplied code
    #[must_use]
    pub fn is_user_failure(&self) -> bool {
        match self {
            Self::CallbackPanic { .. } | Self::UserError(_) => true,
            Self::Propagated(inner) => inner.is_user_failure(),
            _ => false,
        }
    }
}

/// Specialized Result type for Fluxion flow operations
pub type Result<T> = std::result::Result<T, FluxionError>;

/// Lifts foreign errors into [`FluxionError`].
///
/// Without context the error is kept as a [`FluxionError::UserError`]; with context it is
/// flattened into a [`FluxionError::StreamProcessingError`] message.
pub trait IntoFluxionError {
    fn into_fluxion_error(self, context: &str) -> FluxionError;

    fn into_fluxion(self) -> FluxionError
    where
        Self: Sized,
    {
        self.into_fluxion_error("")
    }
}

impl<E: std::error::Error + Send + Sync + 'static> IntoFluxionError for E {
    fn into_fluxion_error(self, context: &str) -> FluxionError {
        if context.is_empty() {
            FluxionError::user_error(self)
        } else {
            FluxionError::stream_error(format!("{context}: {self}"))
        }
    }
}

/// Context for failing `Result`s. Only user-code failures are rewritten.
pub trait ResultExt<T> {
    /// # Errors
    /// Returns the original error, with `context` attached when it is a user failure.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Like [`context`](Self::context), building the message only on failure.
    ///
    /// # Errors
    /// Returns the original error, with context attached when it is a user failure.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<FluxionError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| attach_context(context.into(), e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| attach_context(f(), e.into()))
    }
}

// Protocol violations keep their variant so callers can still match on them.
fn attach_context(context: String, error: FluxionError) -> FluxionError {
    match error {
        FluxionError::UserError(inner) => FluxionError::StreamProcessingError {
            context: format!("{context}: {inner}"),
        },
        FluxionError::CallbackPanic { context: panic } => FluxionError::CallbackPanic {
            context: format!("{context}: {panic}"),
        },
        other => other,
    }
}

impl Clone for FluxionError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidRequest { requested } => Self::InvalidRequest {
                requested: *requested,
            },
            Self::NoValue { context } => Self::NoValue {
                context: context.clone(),
            },
            Self::DuplicateSubscription => Self::DuplicateSubscription,
            Self::InvalidArgument { context } => Self::InvalidArgument {
                context: context.clone(),
            },
            Self::StreamProcessingError { context } => Self::StreamProcessingError {
                context: context.clone(),
            },
            Self::CallbackPanic { context } => Self::CallbackPanic {
                context: context.clone(),
            },
            // The boxed source is not `Clone`; keep its message.
            Self::UserError(e) => Self::StreamProcessingError {
                context: format!("User error: {e}"),
            },
            Self::Propagated(inner) => Self::Propagated(inner.clone()),
        }
    }
}
