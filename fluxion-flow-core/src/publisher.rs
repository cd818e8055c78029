// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::subscriber::Downstream;
use std::sync::Arc;

/// A stage definition that can be subscribed to any number of times.
///
/// A publisher is immutable and shared: every call to [`subscribe`](Self::subscribe)
/// creates independent per-subscription state.
pub trait Publisher<T>: Send + Sync {
    /// Starts a new subscription delivering to `subscriber`.
    fn subscribe(&self, subscriber: Downstream<T>);

    /// Returns `true` if subscriptions created by this publisher expose the pull surface.
    fn is_fuseable(&self) -> bool {
        false
    }
}

impl<T, P> Publisher<T> for Arc<P>
where
    P: Publisher<T> + ?Sized,
{
    fn subscribe(&self, subscriber: Downstream<T>) {
        (**self).subscribe(subscriber);
    }

    fn is_fuseable(&self) -> bool {
        (**self).is_fuseable()
    }
}
