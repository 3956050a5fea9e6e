//! pesticide-dap — Debug Adapter Protocol client sessions.
//!
//! This crate owns everything between the router and a debug adapter:
//! protocol message types, Content-Length framing over async byte
//! streams, adapter endpoints (spawned subprocess and/or TCP), and the
//! per-session state machine with its send and receive loops.

pub mod adapter;
pub mod codec;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-export key types for convenience.
pub use adapter::{Adapter, AdapterMessage, RunState};
pub use error::DapError;
pub use protocol::*;
pub use transport::Transport;
