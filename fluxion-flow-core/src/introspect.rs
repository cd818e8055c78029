// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Read-only lifecycle accessors for tooling. Nothing in the protocol depends on them.
pub trait Introspect {
    /// The stage has a live upstream and has not terminated yet.
    fn is_started(&self) -> bool;

    /// The stage delivered, or will no longer deliver, its terminal signal.
    fn is_terminated(&self) -> bool;
}
