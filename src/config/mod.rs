//! Configuration: settings documents, engine tunables, and data-directory layout.
pub mod engine;
pub mod settings;
pub mod toml_loader;

use std::fmt;
use std::path::{Path, PathBuf};

pub use engine::EngineConfig;
pub use settings::{ExpectedValue, Setting, Settings};

/// Which settings document a run monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every configured setting.
    All,
    /// The privacy subset.
    Privacy,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Privacy => write!(f, "privacy"),
        }
    }
}

/// Resolved file locations for one data directory.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    engine: EngineConfig,
}

impl Layout {
    /// Create a layout rooted at `root` using the given engine configuration.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, engine: EngineConfig) -> Self {
        Self {
            root: root.into(),
            engine,
        }
    }

    /// Load `driftcheck.toml` from `root` and build the layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine configuration exists but is invalid.
    pub fn load(root: &Path) -> Result<Self, crate::error::ConfigError> {
        Ok(Self::new(root, EngineConfig::load(root)?))
    }

    /// The data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The engine configuration in effect.
    #[must_use]
    pub const fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Mutable access for CLI overrides.
    pub const fn engine_mut(&mut self) -> &mut EngineConfig {
        &mut self.engine
    }

    /// Path of the settings document for `mode`.
    #[must_use]
    pub fn settings_path(&self, mode: Mode) -> PathBuf {
        let name = match mode {
            Mode::All => &self.engine.files.all_settings,
            Mode::Privacy => &self.engine.files.privacy_settings,
        };
        self.root.join(name)
    }

    /// Path of the baseline store.
    #[must_use]
    pub fn baseline_path(&self) -> PathBuf {
        self.root.join(&self.engine.files.baseline)
    }

    /// Path of the change log.
    #[must_use]
    pub fn change_log_path(&self) -> PathBuf {
        self.root.join(&self.engine.files.change_log)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mode_display() {
        assert_eq!(Mode::All.to_string(), "all");
        assert_eq!(Mode::Privacy.to_string(), "privacy");
    }

    #[test]
    fn layout_selects_document_by_mode() {
        let layout = Layout::new("/data", EngineConfig::default());
        assert_eq!(
            layout.settings_path(Mode::All),
            Path::new("/data").join("all_settings.json")
        );
        assert_eq!(
            layout.settings_path(Mode::Privacy),
            Path::new("/data").join("config.json")
        );
        assert_eq!(
            layout.baseline_path(),
            Path::new("/data").join("settings_database.json")
        );
        assert_eq!(
            layout.change_log_path(),
            Path::new("/data").join("settings_log.txt")
        );
    }

    #[test]
    fn absolute_file_names_are_kept() {
        let mut engine = EngineConfig::default();
        engine.files.baseline = "/var/lib/driftcheck/baseline.json".to_string();
        let layout = Layout::new("/data", engine);
        assert_eq!(
            layout.baseline_path(),
            PathBuf::from("/var/lib/driftcheck/baseline.json")
        );
    }
}
