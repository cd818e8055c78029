// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Side channel for signals that arrive after a stage has terminated.
//!
//! A misbehaving producer may keep signalling after `on_error` / `on_complete`. Stages
//! never forward such signals and never raise because of them; they report them here
//! instead. Every dropped signal is logged, then handed to the installed hook, if any.
//! A panicking hook is contained and cannot disturb the protocol.
//!
//! ```
//! use fluxion_flow_core::hooks::{self, Dropped};
//! use std::sync::Arc;
//!
//! hooks::set_dropped_hook(Arc::new(|dropped: Dropped<'_>| {
//!     if let Dropped::Error(error) = dropped {
//!         eprintln!("undeliverable error: {error}");
//!     }
//! }));
//!
//! hooks::reset_dropped_hook();
//! ```

use crate::fluxion_error::FluxionError;
use core::fmt::Debug;
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A signal that could not be delivered.
#[derive(Debug, Clone, Copy)]
pub enum Dropped<'a> {
    Next(&'a dyn Debug),
    Error(&'a FluxionError),
    Complete,
}

/// Callback receiving dropped signals.
pub type DroppedHook = Arc<dyn Fn(Dropped<'_>) + Send + Sync>;

static DROPPED_HOOK: RwLock<Option<DroppedHook>> = parking_lot::const_rwlock(None);

/// Installs `hook`, replacing any previous one.
pub fn set_dropped_hook(hook: DroppedHook) {
    *DROPPED_HOOK.write() = Some(hook);
}

/// Removes the installed hook. Dropped signals are then only logged.
pub fn reset_dropped_hook() {
    *DROPPED_HOOK.write() = None;
}

pub fn on_next_dropped(value: &dyn Debug) {
    debug!("dropping on_next after terminal state: {:?}", value);
    dispatch(Dropped::Next(value));
}

pub fn on_error_dropped(error: &FluxionError) {
    warn!("dropping on_error after terminal state: {}", error);
    dispatch(Dropped::Error(error));
}

pub fn on_complete_dropped() {
    trace!("dropping on_complete after terminal state");
    dispatch(Dropped::Complete);
}

fn dispatch(dropped: Dropped<'_>) {
    let hook = DROPPED_HOOK.read().clone();
    if let Some(hook) = hook {
        if panic::catch_unwind(AssertUnwindSafe(|| hook(dropped))).is_err() {
            warn!("dropped-signal hook panicked; ignoring");
        }
    }
}
