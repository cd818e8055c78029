// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::sync::atomic::{AtomicBool, Ordering};

/// The `done` flag of a stage.
///
/// Exactly one caller of [`try_terminate`](Self::try_terminate) observes `true`, even when
/// a terminal signal from upstream races a cancellation or another terminal signal.
#[derive(Debug, Default)]
pub struct TerminalFlag {
    done: AtomicBool,
}

impl TerminalFlag {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    /// Moves the flag to terminal. Returns `false` if it already was.
    pub fn try_terminate(&self) -> bool {
        self.done
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}
