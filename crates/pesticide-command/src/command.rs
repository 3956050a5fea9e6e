//! The command value produced by the parser.

use std::fmt;
use std::path::PathBuf;

/// One parsed prompt command.
///
/// Field constraints are guaranteed by the parser: `Break` carries an
/// absolute path and a positive line, `Evaluate` a non-empty expression,
/// `Up`/`Down` a positive frame count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the cached call stack of the focused thread.
    Backtrace,
    /// Add a source breakpoint.
    Break {
        /// Absolute path of the source file.
        file: PathBuf,
        /// 1-based line number.
        line: i64,
    },
    /// Resume the focused adapter.
    Continue,
    /// Move the focused stack frame toward the innermost frame.
    Down(usize),
    /// Evaluate an expression in the focused stack frame.
    Evaluate {
        /// The expression text.
        expr: String,
    },
    /// Start a debug session from a named configuration.
    Launch {
        /// Configuration name.
        name: String,
    },
    /// Suspend the focused adapter.
    Pause,
    /// End the focused session, or shut down when none is focused.
    Quit,
    /// Move the focused stack frame toward the outermost frame.
    Up(usize),
}

impl fmt::Display for Command {
    /// Canonical rendering; feeding it back to the parser yields an equal
    /// command.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Backtrace => write!(f, "backtrace"),
            Command::Break { file, line } => write!(f, "break {} {}", file.display(), line),
            Command::Continue => write!(f, "continue"),
            Command::Down(n) => write!(f, "down {n}"),
            Command::Evaluate { expr } => write!(f, "evaluate {expr}"),
            Command::Launch { name } => write!(f, "launch {name}"),
            Command::Pause => write!(f, "pause"),
            Command::Quit => write!(f, "quit"),
            Command::Up(n) => write!(f, "up {n}"),
        }
    }
}
