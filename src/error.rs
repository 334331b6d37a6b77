//! Errors the library's own surface can raise.
//!
//! The condition-dispatch loop itself never fails in a way a caller can
//! recover from (spec: "no matching handler" and "invalid verdict" are
//! fatal, full stop). The errors below are misuse of the Rust-native
//! scoped-guard surface, not conditions being signaled.

use thiserror::Error;

/// Misuse of [`crate::scope::HandlerScope`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// A [`crate::scope::HandlerScope`] was entered a second time after its
    /// guard already fired once. Re-arming after firing is not supported
    /// (spec §4.5).
    #[error("handler scope for condition {0:?} was re-entered after it already fired")]
    AlreadyFired(String),
}
