// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Capture of signals reported to the dropped-signal hook.
//!
//! The hook is process-wide while tests run in parallel, so records are kept per thread.
//! A recorder only sees what was dropped on the thread that created it.

use fluxion_flow_core::hooks::{self, Dropped};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, ThreadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroppedSignal {
    /// The `Debug` rendering of the dropped value
    Next(String),
    Error(String),
    Complete,
}

static RECORDS: Mutex<Vec<(ThreadId, DroppedSignal)>> = parking_lot::const_mutex(Vec::new());

fn record(dropped: Dropped<'_>) {
    let signal = match dropped {
        Dropped::Next(value) => DroppedSignal::Next(format!("{value:?}")),
        Dropped::Error(error) => DroppedSignal::Error(error.to_string()),
        Dropped::Complete => DroppedSignal::Complete,
    };
    RECORDS.lock().push((thread::current().id(), signal));
}

/// Records the dropped signals of the current thread.
pub struct DroppedSignalRecorder {
    thread: ThreadId,
}

impl DroppedSignalRecorder {
    /// Installs the recording hook and forgets earlier records of this thread.
    #[must_use]
    pub fn install() -> Self {
        hooks::set_dropped_hook(Arc::new(record));
        let thread = thread::current().id();
        RECORDS.lock().retain(|(owner, _)| *owner != thread);
        Self { thread }
    }

    #[must_use]
    pub fn signals(&self) -> Vec<DroppedSignal> {
        RECORDS
            .lock()
            .iter()
            .filter(|(owner, _)| *owner == self.thread)
            .map(|(_, signal)| signal.clone())
            .collect()
    }

    #[must_use]
    pub fn nexts(&self) -> usize {
        self.count(|signal| matches!(signal, DroppedSignal::Next(_)))
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.count(|signal| matches!(signal, DroppedSignal::Error(_)))
    }

    #[must_use]
    pub fn completions(&self) -> usize {
        self.count(|signal| matches!(signal, DroppedSignal::Complete))
    }

    fn count(&self, predicate: impl Fn(&DroppedSignal) -> bool) -> usize {
        self.signals().iter().filter(|s| predicate(s)).count()
    }
}

impl Drop for DroppedSignalRecorder {
    fn drop(&mut self) {
        RECORDS.lock().retain(|(owner, _)| *owner != self.thread);
    }
}
