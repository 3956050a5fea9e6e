//! Configuration loading and validation.

use std::path::Path;

use regex::Regex;

use crate::config::Config;
use crate::error::ConfigError;

/// Load the adapter table from a JSON file.
///
/// Validates that at least one adapter is defined and that every entry has
/// a command or an address. `$VAR` references in commands are expanded
/// against the process environment.
///
/// # Errors
///
/// Returns [`ConfigError`] on I/O failure, parse failure, or validation
/// failure.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}

/// Parse a JSON string directly into a validated [`Config`].
///
/// # Errors
///
/// Returns [`ConfigError`] on parse or validation failure.
pub fn load_from_str(contents: &str) -> Result<Config, ConfigError> {
    let mut config: Config = serde_json::from_str(contents)?;

    if config.adapters.is_empty() {
        return Err(ConfigError::NoAdapters);
    }
    for (name, adapter) in &mut config.adapters {
        if adapter.command.is_none() && adapter.address.is_none() {
            return Err(ConfigError::MissingEndpoint(name.clone()));
        }
        if let Some(cmd) = &adapter.command {
            adapter.command = Some(expand_env(cmd));
        }
    }

    Ok(config)
}

/// Expand `$VAR` references against the process environment.
///
/// Variables that are not set expand to the empty string.
fn expand_env(input: &str) -> String {
    let var = Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("constant pattern");
    var.replace_all(input, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_config_reads_valid_file() {
        let file = write_config(
            r#"{"adapters": {"mock": {"command": "mock-adapter", "arguments": {"a": 1}}}}"#,
        );
        let config = load_config(file.path()).unwrap();
        let mock = &config.adapters["mock"];
        assert_eq!(mock.command.as_deref(), Some("mock-adapter"));
        assert_eq!(mock.arguments.as_ref().unwrap()["a"], 1);
    }

    #[test]
    fn load_config_missing_file_fails() {
        let err = load_config(Path::new("/nonexistent/pesticide.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_from_str_rejects_invalid_json() {
        let err = load_from_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_str_rejects_empty_adapter_map() {
        let err = load_from_str(r#"{"adapters": {}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoAdapters));
    }

    #[test]
    fn load_from_str_rejects_entry_without_endpoint() {
        let err = load_from_str(r#"{"adapters": {"bad": {"arguments": {}}}}"#).unwrap_err();
        match err {
            ConfigError::MissingEndpoint(name) => assert_eq!(name, "bad"),
            other => panic!("expected MissingEndpoint, got: {other:?}"),
        }
    }

    #[test]
    fn load_from_str_accepts_address_only() {
        let config = load_from_str(r#"{"adapters": {"tcp": {"address": "localhost:5678"}}}"#)
            .unwrap();
        assert_eq!(config.adapters["tcp"].address.as_deref(), Some("localhost:5678"));
    }

    #[test]
    fn load_from_str_expands_env_vars_in_command() {
        std::env::set_var("PESTICIDE_TEST_BIN", "/opt/dbg");
        let config =
            load_from_str(r#"{"adapters": {"mock": {"command": "$PESTICIDE_TEST_BIN --port 0"}}}"#)
                .unwrap();
        assert_eq!(
            config.adapters["mock"].command.as_deref(),
            Some("/opt/dbg --port 0")
        );
    }

    #[test]
    fn expand_env_unset_var_becomes_empty() {
        std::env::remove_var("PESTICIDE_TEST_UNSET");
        assert_eq!(expand_env("run $PESTICIDE_TEST_UNSET now"), "run  now");
    }

    #[test]
    fn expand_env_leaves_plain_text_alone() {
        assert_eq!(expand_env("lldb-dap --port 9000"), "lldb-dap --port 9000");
    }

    #[test]
    fn loaded_config_round_trips_when_reserialized() {
        let source = r#"{"adapters": {"mock": {"command": "mock-adapter"}}}"#;
        let config = load_from_str(source).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let reloaded = load_from_str(&json).unwrap();
        assert_eq!(config, reloaded);
    }
}
