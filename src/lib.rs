//! A Common-Lisp-style condition and restart system.
//!
//! When code [`signal!`]s a named condition, the thread-local stack of
//! installed handlers is searched newest-first. Each handler inspects the
//! condition and returns a [`Verdict`]: resolve it in place (`Handled`),
//! decline and let an older handler try (`Pass`), or unwind back to the
//! handler's installation point (`Abort`), running every finalizer
//! registered between the signal site and that handler on the way. A
//! separate restart registry lets a handler invoke a named recovery
//! routine against the live condition without itself causing any control
//! transfer.
//!
//! This is a reimplementation — not a translation — of a condition system
//! originally built with C's `setjmp`/`longjmp`. Rust has no safe
//! non-local goto, so the "abort" unwind is expressed as a typed panic
//! caught only by the scope that armed it; see [`scope::HandlerScope`] for
//! the ergonomic surface built on that, and [`jump::JumpTarget`] for the
//! primitive it wraps.
//!
//! All three stacks — handlers/finalizers, restarts — are thread-local.
//! There is no cross-thread condition propagation and no condition
//! hierarchy: handler and restart names are matched by exact string
//! equality.

mod condition;
mod config;
mod dispatch;
mod error;
mod jump;
mod restart;
mod scope;
mod stack;
mod verdict;

pub use condition::{destroy_condition, format_condition, print_condition, Condition};
pub use config::{configure, current_config, Config};
pub use dispatch::{signal_at, WARNING_CONDITION_NAME};
pub use error::ScopeError;
pub use jump::{Entry, JumpTarget};
pub use restart::{install_restart, invoke_restart, remove_restart, RestartRegistration};
pub use scope::{HandlerScope, ScopeOutcome};
pub use stack::{
    install_finalizer, install_handler, remove_finalizer, remove_handler, FinalizerRegistration,
    HandlerRegistration,
};
pub use verdict::{RestartResult, Verdict};
