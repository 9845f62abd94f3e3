//! Reading the current value of a monitored setting.
//!
//! A [`Probe`] turns a [`Setting`] into a [`ProbeOutcome`]. Two backends are
//! provided:
//!
//! - **[`command::CommandProbe`]**: asks `PowerShell` for the value
//! - **[`native::NativeProbe`]**: reads the registry directly through `winreg`
//!
//! Backends never return errors: every platform fault collapses into
//! [`ProbeOutcome::NotFound`] at this boundary. The missing-value heuristic
//! lives in [`heuristic`] and is applied by the diff engine on top of
//! whichever backend is in use.
pub mod command;
pub mod heuristic;
pub mod native;

use std::time::Duration;

use serde::Deserialize;

use crate::cancel::CancelToken;
use crate::config::Setting;

pub use heuristic::MissingValueDefaults;

/// Result of probing a single setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The value was read; the string is the raw, un-normalized value.
    Found(String),
    /// The key or value does not exist, or could not be read.
    NotFound,
}

impl ProbeOutcome {
    /// Shorthand for [`ProbeOutcome::Found`].
    #[must_use]
    pub fn found(raw: impl Into<String>) -> Self {
        Self::Found(raw.into())
    }
}

/// A backend that reads one registry value.
///
/// Implementations must return promptly once `cancel` is tripped and must
/// not panic or propagate platform errors.
pub trait Probe: Send + Sync {
    /// Read the current raw value of `setting`.
    fn probe(&self, setting: &Setting, cancel: &CancelToken) -> ProbeOutcome;
}

/// Which probe backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Native on Windows, external command elsewhere.
    #[default]
    Auto,
    /// Shell out to `PowerShell`.
    Command,
    /// Read the registry directly.
    Native,
}

impl BackendKind {
    /// Resolve [`BackendKind::Auto`] for the current platform.
    #[must_use]
    pub const fn resolve(self) -> Self {
        match self {
            Self::Auto if cfg!(windows) => Self::Native,
            Self::Auto => Self::Command,
            other => other,
        }
    }
}

/// Build the probe backend for `kind`.
///
/// `timeout` bounds each external command; the native backend does not
/// spawn processes and ignores it.
#[must_use]
pub fn select(kind: BackendKind, timeout: Duration) -> Box<dyn Probe> {
    match kind.resolve() {
        BackendKind::Native => {
            tracing::debug!("using native registry probe");
            Box::new(native::NativeProbe::new())
        }
        BackendKind::Command | BackendKind::Auto => {
            tracing::debug!("using PowerShell probe (timeout {}s)", timeout.as_secs());
            Box::new(command::CommandProbe::detect(timeout))
        }
    }
}
