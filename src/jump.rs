//! The `JumpTarget` capability: a safe stand-in for the C original's
//! `setjmp`/`longjmp` pair.
//!
//! Rust has no safe non-local goto, so an abort is expressed as a typed
//! panic carrying this target's unique id, caught only by the
//! `catch_unwind` boundary that armed it (see [`crate::scope::HandlerScope`]).
//! A panic whose id doesn't match the catching boundary is resumed
//! (`std::panic::resume_unwind`) so it keeps unwinding toward whichever
//! scope it actually targets — this is what lets a nested `signal` inside a
//! handler abort past the handler's own scope to an outer one.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::condition::Condition;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The payload carried by an abort's panic. Not part of the public API:
/// callers observe aborts through [`crate::scope::ScopeOutcome`], never by
/// catching panics themselves.
///
/// Carries its own clone of the offending condition: the dispatcher's
/// original `Condition` is still destroyed exactly once through the
/// ordinary finalizer sweep (see `dispatch::signal_at`), independent of
/// whatever the catching scope does with this clone.
pub(crate) struct AbortSignal {
    pub(crate) target_id: u64,
    pub(crate) condition: Condition,
}

/// Which entry this is: the first time the guarded region runs, or the
/// resumption after an abort fired back to this target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Running the guarded region for the first time.
    First,
    /// Resuming here because an [`Self`]'s `fire` unwound to this target.
    Resumed,
}

/// A jump destination that may fire at most once over its entire lifetime.
///
/// `arm` may be called any number of times *before* a fire (a scope that
/// completes normally and is entered again simply re-arms); `fire` may be
/// called at most once, and only after `arm`. Once fired, further `arm`
/// calls are refused — re-arming after firing is a programmer error (spec
/// §4.5: "re-arming after firing is not supported").
#[derive(Debug)]
pub struct JumpTarget {
    id: u64,
    armed: Cell<bool>,
    fired: Cell<bool>,
}

impl JumpTarget {
    pub fn new() -> Self {
        JumpTarget {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            armed: Cell::new(false),
            fired: Cell::new(false),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Arms this target for one use. Returns [`Entry::First`]; a caller
    /// never observes [`Entry::Resumed`] from `arm` itself — that indicator
    /// is produced by the scope wrapper after catching a matching abort.
    pub fn arm(&self) -> Entry {
        assert!(!self.fired.get(), "JumpTarget re-armed after firing");
        self.armed.set(true);
        Entry::First
    }

    /// Whether `arm` has been called since the last fire.
    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    /// Whether `fire` has already been called once.
    pub fn is_fired(&self) -> bool {
        self.fired.get()
    }

    /// Unwinds to this target, carrying `condition` to whichever scope
    /// catches the matching abort. Never returns.
    pub(crate) fn fire(&self, condition: Condition) -> ! {
        assert!(self.armed.get(), "JumpTarget fired before arm");
        assert!(!self.fired.get(), "JumpTarget fired twice");
        self.fired.set(true);
        std::panic::panic_any(AbortSignal {
            target_id: self.id,
            condition,
        })
    }

    pub(crate) fn matches(&self, signal: &AbortSignal) -> bool {
        signal.target_id == self.id
    }
}

impl Default for JumpTarget {
    fn default() -> Self {
        Self::new()
    }
}
