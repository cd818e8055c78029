// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::fluxion_error::{FluxionError, Result};

/// What a publisher bridged into `futures::Stream` yields.
///
/// `on_next` becomes a `Value`, `on_error` becomes a final `Error`, and `on_complete`
/// is the end of the stream itself.
#[derive(Debug, Clone)]
pub enum StreamItem<T> {
    Value(T),
    /// Always the last item of its stream
    Error(FluxionError),
}

/// Values compare by content. Errors never compare equal, not even to themselves.
impl<T: PartialEq> PartialEq for StreamItem<T> {
    fn eq(&self, other: &Self) -> bool {
        matches!((self, other), (Self::Value(a), Self::Value(b)) if a == b)
    }
}

impl<T> StreamItem<T> {
    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Borrows the value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    /// # Errors
    /// Returns the carried error for an `Error` item.
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Error(error) => Err(error),
        }
    }

    pub fn ok(self) -> Option<T> {
        self.into_result().ok()
    }

    pub fn err(self) -> Option<FluxionError> {
        self.into_result().err()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StreamItem<U> {
        self.into_result().map(f).into()
    }

    /// # Panics
    /// Panics with the carried error for an `Error` item.
    pub fn unwrap(self) -> T {
        match self.into_result() {
            Ok(value) => value,
            Err(error) => panic!("called `StreamItem::unwrap()` on an error item: {error}"),
        }
    }
}

impl<T> From<Result<T>> for StreamItem<T> {
    fn from(result: Result<T>) -> Self {
        result.map_or_else(Self::Error, Self::Value)
    }
}

impl<T> From<StreamItem<T>> for Result<T> {
    fn from(item: StreamItem<T>) -> Self {
        item.into_result()
    }
}
