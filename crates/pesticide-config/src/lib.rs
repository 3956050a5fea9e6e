//! pesticide-config — adapter configuration for pesticide.
//!
//! Loads the named-adapter table from a JSON file and validates that
//! every entry describes a reachable debug adapter.

pub mod config;
pub mod error;
pub mod load;

pub use config::{AdapterConfig, Config};
pub use error::ConfigError;
pub use load::{load_config, load_from_str};
