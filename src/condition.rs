//! The condition value signaled through the handler stack.

use std::fmt;
use std::io::{self, Write};

/// An immutable record describing the event a call to [`crate::signal_at`] raised.
///
/// A `Condition` is constructed by the dispatcher, owns its own copies of
/// `name`/`message`/`filename` (independent of the signaling call site), and
/// is handed to handler and restart callbacks by borrow only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    name: String,
    message: String,
    filename: String,
    line: u32,
}

impl Condition {
    pub(crate) fn new(name: &str, message: &str, filename: &str, line: u32) -> Self {
        Condition {
            name: name.to_owned(),
            message: message.to_owned(),
            filename: filename.to_owned(),
            line,
        }
    }

    /// The condition's name, compared by exact string equality against
    /// handler and restart registrations.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The diagnostic message attached at the signal site.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The source file captured at the signal site (usually via `file!()`).
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The source line captured at the signal site (usually via `line!()`).
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Condition {
    /// Renders `"<filename>:<line>: <name>:<message>"` with no trailing newline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}:{}", self.filename, self.line, self.name, self.message)
    }
}

/// Writes the condition to `stream` as `"<filename>:<line>: <name>:<message>"`,
/// with no trailing newline.
pub fn format_condition<W: Write>(stream: &mut W, condition: &Condition) -> io::Result<()> {
    write!(stream, "{}", condition)
}

/// Writes the condition to standard output. See [`format_condition`].
pub fn print_condition(condition: &Condition) {
    print!("{}", condition);
}

/// Releases a condition a caller has taken explicit ownership of.
///
/// The default dispatch path in [`crate::signal_at`] cleans up its condition
/// automatically via an internal finalizer; this function exists only for
/// callers who pulled a `Condition` out of that flow (for example, by
/// cloning one out of a handler callback) and need to signal that they are
/// done with it. Rust's ordinary drop glue does the actual freeing.
pub fn destroy_condition(condition: Condition) {
    drop(condition);
}
