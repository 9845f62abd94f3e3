// Shared helpers for integration tests.
//
// Provides a temporary data directory with a fluent builder, a scripted
// in-memory registry probe whose values can be changed between runs, and
// shortcuts for reading the stores back.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use driftcheck::cancel::CancelToken;
use driftcheck::config::{EngineConfig, Layout, Mode, Setting};
use driftcheck::error::DriftError;
use driftcheck::monitor::{CollectingSink, Monitor, RunOutcome};
use driftcheck::probe::{Probe, ProbeOutcome};

/// An in-memory registry keyed by value name.
///
/// Clones share the same table, so a test can hand one clone to a
/// [`Monitor`] and keep another to change values between runs. Every
/// value name not in the table probes as `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    values: Arc<Mutex<BTreeMap<String, ProbeOutcome>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw value reported for `value_name`.
    pub fn set(&self, value_name: &str, raw: &str) -> &Self {
        self.table()
            .insert(value_name.to_string(), ProbeOutcome::found(raw));
        self
    }

    /// Make `value_name` probe as `NotFound`.
    pub fn remove(&self, value_name: &str) -> &Self {
        self.table().remove(value_name);
        self
    }

    /// Number of probes served so far.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn table(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, ProbeOutcome>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Probe for ScriptedProbe {
    fn probe(&self, setting: &Setting, _cancel: &CancelToken) -> ProbeOutcome {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.table()
            .get(&setting.value_name)
            .cloned()
            .unwrap_or(ProbeOutcome::NotFound)
    }
}

/// An isolated data directory backed by a [`tempfile::TempDir`].
pub struct DataDir {
    pub root: tempfile::TempDir,
}

impl DataDir {
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Path to the default baseline store.
    pub fn baseline_path(&self) -> PathBuf {
        self.file("settings_database.json")
    }

    /// Path to the default change log.
    pub fn change_log_path(&self) -> PathBuf {
        self.file("settings_log.txt")
    }

    /// Parse the baseline store as raw JSON.
    pub fn baseline(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(self.baseline_path()).expect("read baseline");
        serde_json::from_str(&text).expect("baseline is valid JSON")
    }

    /// Lines of the change log, or nothing if it does not exist.
    pub fn change_log(&self) -> Vec<String> {
        std::fs::read_to_string(self.change_log_path())
            .map(|text| text.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Build a monitor over this directory using `probe`.
    pub fn monitor(&self, probe: &ScriptedProbe) -> Monitor {
        let layout = Layout::load(self.path()).expect("load layout");
        Monitor::new(layout, Box::new(probe.clone()))
    }

    /// Build a monitor with the built-in engine defaults, ignoring any
    /// `driftcheck.toml`.
    pub fn default_monitor(&self, probe: &ScriptedProbe) -> Monitor {
        Monitor::new(
            Layout::new(self.path(), EngineConfig::default()),
            Box::new(probe.clone()),
        )
    }
}

/// Fluent builder for [`DataDir`].
pub struct DataDirBuilder {
    dir: DataDir,
}

impl DataDirBuilder {
    pub fn new() -> Self {
        Self {
            dir: DataDir {
                root: tempfile::tempdir().expect("create temp dir"),
            },
        }
    }

    /// Write `content` to `name` inside the data directory.
    pub fn with_file(self, name: &str, content: &str) -> Self {
        std::fs::write(self.dir.file(name), content).expect("write data file");
        self
    }

    /// Write the `all` mode settings document.
    pub fn with_all_settings(self, json: &str) -> Self {
        self.with_file("all_settings.json", json)
    }

    /// Write the `privacy` mode settings document.
    pub fn with_privacy_settings(self, json: &str) -> Self {
        self.with_file("config.json", json)
    }

    pub fn build(self) -> DataDir {
        self.dir
    }
}

/// A run's outcome together with everything it emitted.
pub struct Run {
    pub outcome: Result<RunOutcome, DriftError>,
    pub lines: Vec<String>,
}

impl Run {
    pub fn outcome(&self) -> &RunOutcome {
        self.outcome.as_ref().expect("run should succeed")
    }
}

/// Perform one run and collect its output.
pub fn run(monitor: &Monitor, mode: Mode, reset_baseline: bool) -> Run {
    let sink = CollectingSink::new();
    let outcome = monitor.run(mode, &sink, reset_baseline, &CancelToken::new());
    Run {
        outcome,
        lines: sink.lines(),
    }
}

/// Three settings covering the plain, heuristic, and expectation paths.
pub const SAMPLE_SETTINGS: &str = r#"{
    "Telemetry": {
        "path": "HKLM:\\SOFTWARE\\Policies\\Microsoft\\Windows\\DataCollection",
        "name": "AllowTelemetry",
        "expected_value": 0
    },
    "Location": {
        "path": "HKLM:\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\CapabilityAccessManager\\ConsentStore\\location",
        "name": "Value",
        "expected_value": "Deny"
    },
    "Copilot": {
        "path": "HKCU:\\Software\\Microsoft\\Windows\\Shell\\Copilot",
        "name": "IsCopilotEnabled"
    }
}"#;
