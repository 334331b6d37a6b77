//! Three-valued results produced by handler and restart callbacks.

/// What a handler callback decides to do with the condition it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Resolve the condition in place; `signal` returns normally to its caller.
    Handled,
    /// Decline; the dispatcher continues the walk toward older handlers.
    Pass,
    /// Unwind to this handler's installation point, running every finalizer
    /// installed between the signal site and this handler first.
    Abort,
}

/// The outcome of invoking a named restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartResult {
    /// The restart's callback ran and judged itself successful.
    Succeeded,
    /// The restart's callback ran and judged itself unsuccessful.
    Failed,
    /// No restart with the requested name is currently registered.
    NotFound,
}
