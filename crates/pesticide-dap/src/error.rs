//! DAP session error types.

use thiserror::Error;

/// Errors from constructing or talking to a debug adapter.
#[derive(Debug, Error)]
pub enum DapError {
    /// The configured command line could not be split.
    #[error("malformed adapter command: {0}")]
    BadCommand(String),

    /// The adapter subprocess failed to start.
    #[error("failed to spawn adapter: {0}")]
    Spawn(String),

    /// The TCP endpoint could not be dialed.
    #[error("failed to connect to adapter at {addr}: {source}")]
    Connect {
        /// The configured `host:port`.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration named neither a command nor an address.
    #[error("adapter must either have a connection or a subprocess")]
    NoEndpoint,

    /// `start` was called twice on the same adapter.
    #[error("adapter already started")]
    AlreadyStarted,

    /// Transport-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream.
    #[error("adapter stream closed")]
    Closed,

    /// Malformed wire framing.
    #[error("malformed DAP frame: {0}")]
    Frame(String),

    /// The frame body was not a valid DAP message.
    #[error("invalid DAP message: {0}")]
    Json(#[from] serde_json::Error),

    /// The send queue has been closed by `shutdown`.
    #[error("adapter send queue is closed")]
    QueueClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_display() {
        let err = DapError::Spawn("mock-adapter: not found".into());
        assert_eq!(
            err.to_string(),
            "failed to spawn adapter: mock-adapter: not found"
        );
    }

    #[test]
    fn connect_display_contains_address() {
        let err = DapError::Connect {
            addr: "127.0.0.1:5678".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:5678"));
        assert!(msg.contains("refused"));
    }

    #[test]
    fn frame_display() {
        let err = DapError::Frame("missing Content-Length header".into());
        assert!(err.to_string().contains("missing Content-Length"));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let err: DapError = io_err.into();
        assert!(matches!(err, DapError::Io(_)));
    }
}
