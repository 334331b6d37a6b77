//! The restart registry: a LIFO of named recovery routines, independent of
//! the handler/finalizer stack.

use std::cell::RefCell;
use std::mem;

use crate::condition::Condition;
use crate::config;
use crate::verdict::RestartResult;

/// Caller-owned storage for one restart installation.
pub struct RestartRegistration<'a> {
    restart_name: String,
    callback: RefCell<Box<dyn FnMut(&Condition) -> RestartResult + 'a>>,
}

impl<'a> RestartRegistration<'a> {
    pub fn new(
        restart_name: impl Into<String>,
        callback: impl FnMut(&Condition) -> RestartResult + 'a,
    ) -> Self {
        RestartRegistration {
            restart_name: restart_name.into(),
            callback: RefCell::new(Box::new(callback)),
        }
    }

    pub fn restart_name(&self) -> &str {
        &self.restart_name
    }

    fn call(&self, condition: &Condition) -> RestartResult {
        (self.callback.borrow_mut())(condition)
    }

    fn identity(&self) -> *const () {
        self as *const RestartRegistration<'a> as *const ()
    }
}

thread_local! {
    static RESTARTS: RefCell<Vec<*const RestartRegistration<'static>>> = RefCell::new(Vec::new());
}

/// Installs `reg` as the newest restart on this thread's stack.
///
/// # Safety contract
/// `reg` must be unregistered before it is dropped, exactly as for
/// [`crate::install_handler`].
pub fn install_restart<'a>(reg: &'a RestartRegistration<'a>) {
    let erased: *const RestartRegistration<'static> =
        unsafe { mem::transmute(reg as *const RestartRegistration<'a>) };
    RESTARTS.with(|s| s.borrow_mut().push(erased));
}

/// Removes `reg` from wherever it sits on the restart stack.
///
/// If `reg` isn't found, a non-fatal diagnostic is written and nothing is
/// mutated (matching [`crate::remove_handler`]'s behavior, though the
/// original C `unregister_restart` leaked the found entry instead of
/// freeing it — this port always drops it).
pub fn remove_restart(reg: &RestartRegistration) {
    let target = reg.identity();
    let found = RESTARTS.with(|s| {
        let mut restarts = s.borrow_mut();
        match restarts.iter().position(|p| (*p as *const ()) == target) {
            Some(pos) => {
                restarts.remove(pos);
                true
            }
            None => false,
        }
    });
    if !found {
        config::diagnostic("unregister of unknown restart");
    }
}

/// Newest-first linear scan for a restart named `name`; if found, invokes
/// its callback with `condition` and returns that callback's result
/// verbatim. Invoking a restart never itself causes an unwind — it is
/// legal to call outside of an active `signal`, returning `NotFound` on an
/// empty stack.
pub fn invoke_restart(condition: &Condition, name: &str) -> RestartResult {
    let found = RESTARTS.with(|s| {
        s.borrow()
            .iter()
            .rev()
            .find(|p| unsafe { (**p).restart_name() == name })
            .copied()
    });
    match found {
        Some(ptr) => {
            // Safety: entries are kept alive by the install/remove contract.
            let restart = unsafe { &*ptr };
            restart.call(condition)
        }
        None => RestartResult::NotFound,
    }
}
