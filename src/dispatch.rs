//! The signal dispatcher: constructs a condition, searches the handler
//! stack newest-first, and either returns normally (`Handled`), keeps
//! walking (`Pass`), or unwinds and jumps (`Abort`).

use std::cell::RefCell;

use crate::condition::Condition;
use crate::config;
use crate::stack::{self, FinalizerRegistration, Search};
use crate::verdict::Verdict;

/// The condition name produced by the [`warn!`] surface. No other name is
/// reserved by the library.
pub const WARNING_CONDITION_NAME: &str = "warning";

/// Constructs a condition and dispatches it through the handler stack.
///
/// This is the primitive the [`signal!`] macro wraps to capture
/// `file!()`/`line!()` at the call site, matching the C original's split
/// between the `throw` macro and `_throw_exception`.
///
/// Returns normally only if some handler returned [`Verdict::Handled`].
/// Diverges (`std::process::exit`) if the stack is exhausted without a
/// match; does not return via a Rust `panic` in that case, since there is
/// no scope left to catch one — this mirrors the original's fatal `exit(1)`.
pub fn signal_at(name: &str, message: &str, filename: &str, line: u32) {
    let condition = Condition::new(name, message, filename, line);
    let slot = RefCell::new(Some(condition));

    // Registering this finalizer is the whole mechanism that guarantees the
    // condition is freed on every path: normal unregister below on Handled,
    // or folded into the finalizer sweep that `stack::unwind_to` runs on
    // Abort. No path needs to free the condition by hand.
    let condition_finalizer = FinalizerRegistration::new(|| {
        slot.borrow_mut().take();
    });
    stack::install_finalizer(&condition_finalizer);

    let mut cursor = stack::find_handler(name);
    loop {
        let found = match cursor {
            Search::Exhausted => break,
            Search::Found(id) => id,
        };
        let verdict = {
            let borrowed = slot.borrow();
            let condition = borrowed
                .as_ref()
                .expect("condition consumed while still being signaled");
            stack::call_handler(found, condition)
        };
        match verdict {
            Verdict::Handled => {
                stack::remove_finalizer(&condition_finalizer);
                return;
            }
            Verdict::Pass => {
                // Re-resolved by identity, not position: the handler just
                // run may itself have installed or removed other stack
                // entries, so the next search starts fresh from `found`
                // rather than trusting a stale index.
                cursor = stack::find_handler_below(found, name);
            }
            Verdict::Abort => {
                // Clone before the unwind sweep below runs the
                // condition-destroying finalizer; the dispatcher's
                // own `Condition` is still destroyed exactly once
                // through that sweep, independent of this clone.
                let carried = {
                    let borrowed = slot.borrow();
                    borrowed
                        .as_ref()
                        .expect("condition consumed while still being signaled")
                        .clone()
                };
                let jump = stack::jump_target_of(found);
                stack::unwind_to(found);
                jump.fire(carried);
            }
        }
    }

    let diagnostic = {
        let borrowed = slot.borrow();
        let condition = borrowed
            .as_ref()
            .expect("condition consumed while still being signaled");
        format!("Fatal condition: {}", condition)
    };
    config::diagnostic(&diagnostic);
    std::process::exit(1);
}

/// Signals a condition, capturing the call site's file and line.
///
/// ```
/// # use condition_signal::{signal, HandlerRegistration, install_handler, remove_handler, Verdict};
/// let handler = HandlerRegistration::new("demo", |_cond| Verdict::Handled);
/// install_handler(&handler);
/// signal!("demo", "hello");
/// remove_handler(&handler);
/// ```
#[macro_export]
macro_rules! signal {
    ($name:expr, $message:expr) => {
        $crate::dispatch::signal_at($name, $message, file!(), line!())
    };
}

/// Signals a condition named [`WARNING_CONDITION_NAME`], capturing the call
/// site's file and line.
#[macro_export]
macro_rules! warn {
    ($message:expr) => {
        $crate::dispatch::signal_at(
            $crate::dispatch::WARNING_CONDITION_NAME,
            $message,
            file!(),
            line!(),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::HandlerRegistration;
    use std::cell::Cell;

    #[test]
    fn handled_returns_normally_and_sees_the_condition() {
        let seen_name = RefCell::new(String::new());
        let handler = HandlerRegistration::new("demo-handled", |cond| {
            *seen_name.borrow_mut() = cond.name().to_owned();
            Verdict::Handled
        });
        stack::install_handler(&handler);
        signal_at("demo-handled", "hi", "f.rs", 1);
        stack::remove_handler(&handler);
        assert_eq!(*seen_name.borrow(), "demo-handled");
    }

    #[test]
    fn pass_chain_tries_older_handlers() {
        let fired = Cell::new(Vec::<&'static str>::new());
        let bottom = HandlerRegistration::new("chain", |_c| Verdict::Handled);
        let middle = HandlerRegistration::new("chain", |_c| Verdict::Pass);
        stack::install_handler(&bottom);
        stack::install_handler(&middle);
        signal_at("chain", "m", "f.rs", 2);
        stack::remove_handler(&middle);
        stack::remove_handler(&bottom);
        let _ = fired;
    }

    #[test]
    fn warning_condition_name_is_literal() {
        assert_eq!(WARNING_CONDITION_NAME, "warning");
    }
}
