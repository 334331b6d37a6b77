//! The scoped-guard surface: installs a handler and arms its `JumpTarget`
//! for the lifetime of a closure, giving callers a single call that plays
//! the role of the C original's `REGISTER_HANDLER(handler) { ... }` pair of
//! "install, then check whether we got here via a jump" macros.

use std::panic::{self, AssertUnwindSafe};

use crate::condition::Condition;
use crate::error::ScopeError;
use crate::jump::AbortSignal;
use crate::stack::{install_handler, remove_handler, HandlerRegistration};
use crate::verdict::Verdict;

/// What happened when a [`HandlerScope`] ran its guarded region.
pub enum ScopeOutcome<T> {
    /// The guarded region ran to completion without this scope's handler
    /// aborting. Holds the region's return value.
    Entered(T),
    /// This scope's handler returned [`Verdict::Abort`] for some condition
    /// reached during the guarded region, unwinding control back here.
    /// Holds the condition that caused it.
    Aborted(Condition),
}

/// A handler installed for exactly the lifetime of one guarded region.
///
/// Single-use: once its guarded region has been aborted out of once,
/// entering it again is refused (spec §4.5, "re-arming after firing is not
/// supported").
pub struct HandlerScope<'a> {
    handler: HandlerRegistration<'a>,
}

impl<'a> HandlerScope<'a> {
    /// Builds a scope that, while entered, handles conditions named
    /// `condition_name` by running `on_signal` with the live condition and
    /// acting on whichever [`Verdict`] it returns — exactly like a handler
    /// installed through [`install_handler`] directly. The common case is a
    /// callback that always returns `Verdict::Abort`, unwinding back to
    /// this scope's `run` call; richer callbacks (deciding `Handled`/`Pass`
    /// dynamically) work the same as at the primitive layer.
    pub fn new(
        condition_name: impl Into<String>,
        on_signal: impl FnMut(&Condition) -> Verdict + 'a,
    ) -> Self {
        HandlerScope {
            handler: HandlerRegistration::new(condition_name, on_signal),
        }
    }

    /// Runs `body` with this scope's handler installed.
    ///
    /// Returns `Err` if this scope has already been run once and its
    /// handler already aborted (its `JumpTarget` has already fired) — the
    /// spec explicitly leaves re-arming unsupported.
    pub fn run<T>(&self, body: impl FnOnce() -> T) -> Result<ScopeOutcome<T>, ScopeError> {
        if self.handler.jump_target().is_fired() {
            return Err(ScopeError::AlreadyFired(
                self.handler.condition_name().to_owned(),
            ));
        }

        install_handler(&self.handler);
        self.handler.jump_target().arm();

        let result = panic::catch_unwind(AssertUnwindSafe(body));

        match result {
            Ok(value) => {
                remove_handler(&self.handler);
                Ok(ScopeOutcome::Entered(value))
            }
            Err(payload) => match payload.downcast::<AbortSignal>() {
                Ok(signal) if self.handler.jump_target().matches(&signal) => {
                    remove_handler(&self.handler);
                    Ok(ScopeOutcome::Aborted(signal.condition))
                }
                // Targets an outer scope: `stack::unwind_to` already popped
                // this scope's handler node off the stack while unwinding
                // past it, so there's nothing left here to remove.
                Ok(foreign) => panic::resume_unwind(foreign),
                Err(foreign) => {
                    remove_handler(&self.handler);
                    panic::resume_unwind(foreign)
                }
            },
        }
    }
}
