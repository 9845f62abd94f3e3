//! Engine configuration loading (`driftcheck.toml`).
//!
//! Every field has a default, so the file is optional. Relative file names
//! in `[files]` resolve against the data directory.
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::toml_loader;
use crate::error::ConfigError;
use crate::probe::BackendKind;

/// File name of the engine configuration inside the data directory.
pub const ENGINE_CONFIG_FILE: &str = "driftcheck.toml";

/// Tunables for a drift-detection run.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Locations of the settings documents and stores.
    pub files: FileNames,
    /// Probe backend selection and limits.
    pub probe: ProbeConfig,
    /// Domain heuristics.
    pub heuristics: HeuristicsConfig,
}

/// File names used by a run, relative to the data directory unless absolute.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileNames {
    /// Settings document for mode `all`.
    pub all_settings: String,
    /// Settings document for mode `privacy`.
    pub privacy_settings: String,
    /// Baseline snapshot store.
    pub baseline: String,
    /// Append-only change log.
    pub change_log: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            all_settings: "all_settings.json".to_string(),
            privacy_settings: "config.json".to_string(),
            baseline: "settings_database.json".to_string(),
            change_log: "settings_log.txt".to_string(),
        }
    }
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Which probe backend reads registry values.
    pub backend: BackendKind,
    /// Upper bound for a single probe, in seconds.
    pub timeout_secs: u64,
}

impl ProbeConfig {
    /// The per-probe timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            timeout_secs: 15,
        }
    }
}

/// Heuristic configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HeuristicsConfig {
    /// Keywords naming feature toggles whose registry value is absent when
    /// the feature is on. Matched case-insensitively as substrings.
    pub missing_value_defaults: Vec<String>,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            missing_value_defaults: vec!["recall".to_string(), "enabled".to_string()],
        }
    }
}

impl EngineConfig {
    /// Load `driftcheck.toml` from `root`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEngineConfig`] if the file exists but is
    /// malformed, names a field this version does not know, or sets a zero
    /// probe timeout.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(ENGINE_CONFIG_FILE);
        let config: Self = toml_loader::load_config(&path)?;
        // A zero deadline kills every probe before it can answer.
        if config.probe.timeout_secs == 0 {
            return Err(ConfigError::InvalidEngineConfig {
                path,
                message: "probe.timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(config)
    }
}
