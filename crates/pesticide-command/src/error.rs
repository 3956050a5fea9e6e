use thiserror::Error;

/// Errors produced while parsing a line of user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The first token did not name a known command.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Unbalanced quoting in the input line.
    #[error("Unbalanced quotes in command")]
    UnbalancedQuotes,

    /// A command was given the wrong number of arguments.
    #[error("syntax: {0}")]
    Usage(&'static str),

    /// A numeric argument did not parse as a positive integer.
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// A file argument could not be resolved to an absolute path.
    #[error("Invalid path {path}: {reason}")]
    InvalidPath {
        /// The path as the user typed it.
        path: String,
        /// Why resolution failed.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command_display() {
        let err = ParseError::UnknownCommand("foo".into());
        assert_eq!(err.to_string(), "Unknown command: foo");
    }

    #[test]
    fn usage_display() {
        let err = ParseError::Usage("break <file> <line>");
        assert_eq!(err.to_string(), "syntax: break <file> <line>");
    }

    #[test]
    fn invalid_number_display() {
        let err = ParseError::InvalidNumber("zero".into());
        assert_eq!(err.to_string(), "Invalid number: zero");
    }

    #[test]
    fn invalid_path_display() {
        let err = ParseError::InvalidPath {
            path: "src/../".into(),
            reason: "cwd unavailable".into(),
        };
        assert!(err.to_string().contains("src/../"));
        assert!(err.to_string().contains("cwd unavailable"));
    }
}
