//! TOML configuration file parsing.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Load a TOML config file into `T`.
///
/// A missing file deserializes from an empty document, so `T` should carry
/// `#[serde(default)]` on every field that has a sensible default.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEngineConfig`] if the file exists but cannot
/// be read or parsed.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidEngineConfig {
        path: path.to_path_buf(),
        message,
    };

    if !path.exists() {
        // Return defaults for missing files by deserializing empty TOML
        return toml::from_str("").map_err(|e| invalid(e.to_string()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;

    toml::from_str(&content).map_err(|e| invalid(e.message().to_string()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq, Eq)]
    #[serde(default)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let sample: Sample = load_config(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn parses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        std::fs::write(&path, "name = \"x\"\ncount = 3\n").unwrap();
        let sample: Sample = load_config(&path).unwrap();
        assert_eq!(sample.name, "x");
        assert_eq!(sample.count, 3);
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        std::fs::write(&path, "count = \"three\"\n").unwrap();
        let err = load_config::<Sample>(&path).unwrap_err();
        assert!(err.to_string().contains("sample.toml"));
    }
}
