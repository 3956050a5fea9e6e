//! Configuration data model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The full configuration: a table of named adapter definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Map of configuration name to adapter definition.
    pub adapters: HashMap<String, AdapterConfig>,
}

/// How to reach one debug adapter.
///
/// At least one of `command` and `address` must be present. When both are
/// present the command is spawned first and the TCP connection is dialed
/// after a short warm-up delay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Command line to spawn the adapter (stdio mode). `$VAR` references
    /// are expanded against the process environment at load time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Opaque launch arguments, forwarded verbatim as the body of the DAP
    /// `launch` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,

    /// `host:port` to dial (TCP mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
