//! pesticide-command — prompt command parsing.
//!
//! Turns one line of user input into a tagged [`Command`] value. Tokens
//! are split with shell-like quoting, the first token selects the command
//! (full name or short alias), and per-command argument constraints are
//! checked here so the router can trust every field.

pub mod command;
pub mod error;
pub mod parse;

pub use command::Command;
pub use error::ParseError;
pub use parse::parse;
