//! The unified handler/finalizer stack.
//!
//! Handlers and finalizers live on one thread-local LIFO because they must
//! stay interleaved in installation order: unwinding to a chosen handler
//! has to run exactly the finalizers installed after it, and a two-stack
//! design (one for handlers, one for finalizers) would need extra
//! timestamps or cross-links to recover that order. A single `Vec` of
//! tagged entries makes "newest first, stop at this handler" a plain
//! walk; lookups are keyed by handler identity rather than position; see
//! [`HandlerId`] for why.

use std::cell::RefCell;
use std::mem;

use crate::condition::Condition;
use crate::config;
use crate::jump::JumpTarget;
use crate::verdict::Verdict;

/// Caller-owned storage for one handler installation.
///
/// Registration is by reference: the library never copies this struct, and
/// [`install_handler`] requires it to outlive every signal that could reach
/// it. The `condition_name`/callback pair plays the role the C original
/// split across `condition_name` + a `handler_func` + an opaque `void*`;
/// here the `void*` user-data slot is folded into the callback closure's
/// captures, which is the idiomatic Rust replacement for a C-style context
/// pointer.
pub struct HandlerRegistration<'a> {
    condition_name: String,
    callback: RefCell<Box<dyn FnMut(&Condition) -> Verdict + 'a>>,
    jump: JumpTarget,
}

impl<'a> HandlerRegistration<'a> {
    pub fn new(
        condition_name: impl Into<String>,
        callback: impl FnMut(&Condition) -> Verdict + 'a,
    ) -> Self {
        HandlerRegistration {
            condition_name: condition_name.into(),
            callback: RefCell::new(Box::new(callback)),
            jump: JumpTarget::new(),
        }
    }

    pub fn condition_name(&self) -> &str {
        &self.condition_name
    }

    pub fn jump_target(&self) -> &JumpTarget {
        &self.jump
    }

    fn call(&self, condition: &Condition) -> Verdict {
        (self.callback.borrow_mut())(condition)
    }

    fn identity(&self) -> *const () {
        self as *const HandlerRegistration<'a> as *const ()
    }
}

/// Caller-owned storage for one finalizer installation.
pub struct FinalizerRegistration<'a> {
    callback: RefCell<Box<dyn FnMut() + 'a>>,
}

impl<'a> FinalizerRegistration<'a> {
    pub fn new(callback: impl FnMut() + 'a) -> Self {
        FinalizerRegistration {
            callback: RefCell::new(Box::new(callback)),
        }
    }

    fn run(&self) {
        (self.callback.borrow_mut())()
    }

    fn identity(&self) -> *const () {
        self as *const FinalizerRegistration<'a> as *const ()
    }
}

#[derive(Clone, Copy)]
enum Entry {
    Handler(*const HandlerRegistration<'static>),
    Finalizer(*const FinalizerRegistration<'static>),
}

impl Entry {
    fn identity(&self) -> *const () {
        match *self {
            Entry::Handler(p) => p as *const (),
            Entry::Finalizer(p) => p as *const (),
        }
    }
}

thread_local! {
    static STACK: RefCell<Vec<Entry>> = RefCell::new(Vec::new());
}

/// Installs `reg` as the newest handler on this thread's stack.
///
/// # Safety contract
/// `reg` must be unregistered (via [`remove_handler`] or an abort unwind
/// past it) before it is dropped. The library only ever reads through the
/// reference while it remains on the stack; it never extends `reg`'s
/// lifetime beyond that.
pub fn install_handler<'a>(reg: &'a HandlerRegistration<'a>) {
    // Safety: see contract above. This mirrors the teacher crate's
    // transmute-into-thread-local-storage pattern: the pointer only differs
    // from `'a` in its lifetime annotation, never in layout.
    let erased: *const HandlerRegistration<'static> =
        unsafe { mem::transmute(reg as *const HandlerRegistration<'a>) };
    STACK.with(|s| s.borrow_mut().push(Entry::Handler(erased)));
}

/// Removes `reg` from wherever it sits on the stack.
///
/// This is a linear search, not a pop: a `Pass` verdict leaves nested
/// scopes to unregister their handlers in whatever order they unwind, so a
/// handler removed here need not be at the top. If `reg` isn't found, a
/// non-fatal diagnostic is written and nothing is mutated.
pub fn remove_handler(reg: &HandlerRegistration) {
    let target = reg.identity();
    let found = STACK.with(|s| {
        let mut stack = s.borrow_mut();
        match stack
            .iter()
            .position(|e| matches!(e, Entry::Handler(_)) && e.identity() == target)
        {
            Some(pos) => {
                stack.remove(pos);
                true
            }
            None => false,
        }
    });
    if !found {
        config::diagnostic("unregister of unknown handler");
    }
}

/// Installs `reg` as the newest finalizer on this thread's stack.
///
/// # Safety contract
/// Same as [`install_handler`]: `reg` must be unregistered before it drops.
pub fn install_finalizer<'a>(reg: &'a FinalizerRegistration<'a>) {
    let erased: *const FinalizerRegistration<'static> =
        unsafe { mem::transmute(reg as *const FinalizerRegistration<'a>) };
    STACK.with(|s| s.borrow_mut().push(Entry::Finalizer(erased)));
}

/// Runs `reg`'s callback, then removes it from the stack.
///
/// Running the callback first and unconditionally, even if the matching
/// stack node can't be found, matches the run-on-unregister contract: a
/// finalizer is guaranteed to run exactly once whichever path exits its
/// scope, normal (here) or abnormal (the unwind sweep in
/// [`crate::dispatch`]).
pub fn remove_finalizer(reg: &FinalizerRegistration) {
    reg.run();
    let target = reg.identity();
    let found = STACK.with(|s| {
        let mut stack = s.borrow_mut();
        match stack
            .iter()
            .position(|e| matches!(e, Entry::Finalizer(_)) && e.identity() == target)
        {
            Some(pos) => {
                stack.remove(pos);
                true
            }
            None => false,
        }
    });
    if !found {
        config::diagnostic("unregister of unknown finalizer");
    }
}

/// A handler node located by a search, identified by the address of its
/// `HandlerRegistration` rather than by stack position.
///
/// Identity, not position, is what the dispatcher keys on throughout:
/// a handler callback run in between locating a match and acting on its
/// verdict (a nested `signal`, say) can freely install or remove other
/// nodes without invalidating this handle — every later operation
/// re-resolves it against the stack's current shape.
#[derive(Clone, Copy)]
pub(crate) struct HandlerId(*const ());

/// How far the handler search walked, and what it found.
pub(crate) enum Search {
    /// A handler matching the requested name.
    Found(HandlerId),
    /// No matching handler remains in the searched range.
    Exhausted,
}

/// Scans newest-to-oldest, stopping at the first handler node whose
/// condition name equals `name`. Finalizer nodes are skipped.
pub(crate) fn find_handler(name: &str) -> Search {
    find_handler_impl(None, name)
}

/// Scans newest-to-oldest starting strictly below `after` (used to resume
/// the walk once `after` has returned `Pass`). Finalizer nodes and
/// non-matching handler nodes are skipped.
pub(crate) fn find_handler_below(after: HandlerId, name: &str) -> Search {
    find_handler_impl(Some(after.0), name)
}

fn find_handler_impl(below: Option<*const ()>, name: &str) -> Search {
    STACK.with(|s| {
        let stack = s.borrow();
        let mut skipping = below.is_some();
        for idx in (0..stack.len()).rev() {
            if let Entry::Handler(ptr) = stack[idx] {
                if skipping {
                    if Some(ptr as *const ()) == below {
                        skipping = false;
                    }
                    continue;
                }
                // Safety: entries on the stack are kept alive by the
                // install/remove contract for exactly as long as they're here.
                let handler = unsafe { &*ptr };
                if handler.condition_name() == name {
                    return Search::Found(HandlerId(ptr as *const ()));
                }
            }
        }
        Search::Exhausted
    })
}

pub(crate) fn stack_len() -> usize {
    STACK.with(|s| s.borrow().len())
}

fn resolve_handler(id: HandlerId) -> *const HandlerRegistration<'static> {
    STACK.with(|s| {
        s.borrow()
            .iter()
            .find_map(|e| match e {
                Entry::Handler(ptr) if (*ptr as *const ()) == id.0 => Some(*ptr),
                _ => None,
            })
            .expect("HandlerId no longer present on the stack")
    })
}

pub(crate) fn call_handler(id: HandlerId, condition: &Condition) -> Verdict {
    let ptr = resolve_handler(id);
    // Safety: see find_handler_impl.
    let handler = unsafe { &*ptr };
    handler.call(condition)
}

pub(crate) fn jump_target_of(id: HandlerId) -> &'static JumpTarget {
    let ptr = resolve_handler(id);
    // Safety: see find_handler_impl. The returned reference is only used
    // immediately to fire the jump, never stored.
    unsafe { &(*ptr).jump }
}

/// Runs and removes every finalizer strictly above the handler identified
/// by `id`, then removes every non-finalizer node in that same range
/// without invoking it. The handler itself is left in place — it remains
/// registered until the caller unregisters it from the resumed program
/// point.
pub(crate) fn unwind_to(id: HandlerId) {
    loop {
        let top = STACK.with(|s| s.borrow().last().copied());
        match top {
            Some(entry) if entry.identity() == id.0 => break,
            Some(Entry::Finalizer(ptr)) => {
                // Safety: see find_handler_impl.
                unsafe { &*ptr }.run();
                STACK.with(|s| {
                    s.borrow_mut().pop();
                });
            }
            Some(Entry::Handler(_)) => {
                STACK.with(|s| {
                    s.borrow_mut().pop();
                });
            }
            None => panic!("unwind_to: handler not found on the stack"),
        }
    }
}
