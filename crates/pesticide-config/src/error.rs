use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating the adapter
/// configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The adapters map was empty.
    #[error("no adapters were specified")]
    NoAdapters,

    /// An adapter entry had neither a command nor an address.
    #[error("adapter '{0}' must have an address or a command to run")]
    MissingEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_display_contains_path() {
        let err = ConfigError::Read {
            path: PathBuf::from("/tmp/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file missing"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("/tmp/missing.json"));
        assert!(msg.contains("file missing"));
    }

    #[test]
    fn no_adapters_display() {
        let err = ConfigError::NoAdapters;
        assert_eq!(err.to_string(), "no adapters were specified");
    }

    #[test]
    fn missing_endpoint_display_names_adapter() {
        let err = ConfigError::MissingEndpoint("fake".into());
        let msg = format!("{err}");
        assert!(msg.contains("'fake'"));
        assert!(msg.contains("address or a command"));
    }

    #[test]
    fn parse_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err = ConfigError::from(serde_err);
        assert!(err.to_string().contains("JSON parse error"));
    }
}
