//! Domain-specific error types for the drift engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Engine modules return typed errors (e.g., [`ConfigError`], [`StoreError`])
//! while command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! DriftError
//! ├── Store(StoreError): baseline save and change-log append failures
//! └── Cancelled        : the run's cancellation token was tripped
//!
//! ConfigError          : missing, malformed or invalid configuration
//! ```
//!
//! A [`ConfigError`] never becomes a [`DriftError`]: loading the layout fails
//! before a run starts, and a run reports an invalid settings document as
//! an outcome rather than an error.
//!
//! Probe failures never appear here. They degrade to warnings inside the
//! diff engine and do not cross the probe boundary as errors.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a drift-detection run.
#[derive(Error, Debug)]
pub enum DriftError {
    /// Persisting the baseline or appending the change log failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The run was cancelled before it finished probing.
    #[error("run cancelled before completion")]
    Cancelled,
}

/// Errors that arise from loading and validating configuration.
///
/// Every variant aborts the run before any stored state is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings document does not exist.
    #[error("Configuration file '{}' not found.", .path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The settings document exists but could not be read.
    #[error("Configuration file '{}' could not be read: {source}", .path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings document is not valid JSON.
    #[error("Configuration file '{}' is not valid JSON: {message}.", .path.display())]
    InvalidJson {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser message, including line and column.
        message: String,
    },

    /// The settings document parsed, but its top level is not an object.
    #[error("Configuration file '{}' must contain an object keyed by setting name.", .path.display())]
    NotAnObject {
        /// Path to the offending file.
        path: PathBuf,
    },

    /// One or more entries violate the settings schema.
    ///
    /// Every violation found in the document is listed, one per line.
    #[error("{}", .0.join("\n"))]
    Invalid(Vec<String>),

    /// The optional engine configuration (TOML) could not be used.
    #[error("Engine configuration '{}' is invalid: {message}", .path.display())]
    InvalidEngineConfig {
        /// Path to the engine configuration file.
        path: PathBuf,
        /// Reader or parser message.
        message: String,
    },
}

/// Errors that arise from writing the baseline store or the change log.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A filesystem operation on a store failed.
    #[error("{action} '{}': {source}", .path.display())]
    Io {
        /// What was being attempted (e.g., "write baseline").
        action: &'static str,
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The baseline snapshot could not be serialized.
    #[error("serialize baseline: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // ConfigError
    // -----------------------------------------------------------------------

    #[test]
    fn config_error_not_found_display() {
        let e = ConfigError::NotFound {
            path: PathBuf::from("config.json"),
        };
        assert_eq!(e.to_string(), "Configuration file 'config.json' not found.");
    }

    #[test]
    fn config_error_invalid_json_display() {
        let e = ConfigError::InvalidJson {
            path: PathBuf::from("all_settings.json"),
            message: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Configuration file 'all_settings.json' is not valid JSON: expected value at line 1 column 1."
        );
    }

    #[test]
    fn config_error_invalid_lists_every_violation() {
        let e = ConfigError::Invalid(vec![
            "Setting 'A' is missing a string 'path'.".to_string(),
            "Setting 'B' must be an object.".to_string(),
        ]);
        assert_eq!(
            e.to_string(),
            "Setting 'A' is missing a string 'path'.\nSetting 'B' must be an object."
        );
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: PathBuf::from("config.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
    }

    // -----------------------------------------------------------------------
    // StoreError
    // -----------------------------------------------------------------------

    #[test]
    fn store_error_io_display() {
        let e = StoreError::io(
            "append change log",
            "settings_log.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            e.to_string(),
            "append change log 'settings_log.txt': denied"
        );
    }

    // -----------------------------------------------------------------------
    // DriftError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn drift_error_is_transparent_over_config_error() {
        let e: DriftError = ConfigError::Invalid(vec!["bad".to_string()]).into();
        assert_eq!(e.to_string(), "bad");
    }

    #[test]
    fn drift_error_from_store_error() {
        let e: DriftError =
            StoreError::io("write baseline", "db.json", io::Error::other("disk full")).into();
        assert!(e.to_string().contains("disk full"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<DriftError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<StoreError>();
    }

    #[test]
    fn config_error_converts_to_anyhow() {
        let e = ConfigError::NotFound {
            path: PathBuf::from("x"),
        };
        let _anyhow_err: anyhow::Error = e.into();
    }
}
