//! Crate-level configuration and the diagnostic-write helper shared by the
//! fatal and non-fatal paths in [`crate::dispatch`] and [`crate::stack`].

use std::cell::Cell;
use std::io::Write;

/// Tunables for how the library reports its own non-fatal and fatal
/// diagnostics. The library has no I/O beyond these diagnostic writes; there
/// is nothing here an application-level configuration crate would help
/// with, so this stays a plain struct rather than reaching for `config` or
/// `figment`.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct Config {
    /// Whether diagnostics are also emitted through the `log` crate's
    /// `error!`/`warn!` macros, in addition to the guaranteed stderr write.
    /// Defaults to `true`.
    pub log_diagnostics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_diagnostics: true,
        }
    }
}

thread_local! {
    static CONFIG: Cell<Config> = Cell::new(Config::default());
}

/// Installs the diagnostic configuration for the current thread. Like the
/// handler/restart/finalizer stacks, this setting is thread-local.
pub fn configure(config: Config) {
    CONFIG.with(|c| c.set(config));
}

/// The diagnostic configuration in effect on the current thread.
pub fn current_config() -> Config {
    CONFIG.with(|c| c.get())
}

/// Writes a single diagnostic line to the standard diagnostic stream, and
/// (when `log_diagnostics` is set) also emits it through `log::error!`.
///
/// Used for both the non-fatal "unregister of unknown node" paths and the
/// fatal "no matching handler" / "invalid verdict" paths; the fatal paths
/// additionally terminate the process after calling this.
pub(crate) fn diagnostic(message: &str) {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{}", message);
    let should_log = current_config().log_diagnostics;
    #[cfg(test)]
    LAST_DIAGNOSTIC_LOGGED.with(|c| c.set(Some(should_log)));
    if should_log {
        log::error!("{}", message);
    }
}

/// Test-only record of whether the most recent [`diagnostic`] call decided
/// to also emit through `log::error!`, so `log_diagnostics = false` can be
/// confirmed to actually suppress that call without depending on a global
/// `log` logger (which, being process-wide, can't be installed per-test).
#[cfg(test)]
thread_local! {
    static LAST_DIAGNOSTIC_LOGGED: Cell<Option<bool>> = Cell::new(None);
}
