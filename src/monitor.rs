//! The run entry point.
//!
//! A [`Monitor`] owns a data-directory [`Layout`] and a probe backend and
//! performs one complete check per call to [`Monitor::run`]:
//!
//! 1. load and validate the settings document for the requested mode
//! 2. optionally discard the stored baseline
//! 3. bootstrap a new baseline, or diff against the existing one
//! 4. report, append the change log, then replace the baseline
//!
//! User-facing text goes through an [`OutputSink`]; diagnostics go through
//! `tracing`.
use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::cancel::CancelToken;
use crate::config::{Layout, Mode, Settings, settings};
use crate::diff::{Change, DiffEngine, Warning};
use crate::error::{ConfigError, DriftError};
use crate::probe::{self, MissingValueDefaults, Probe};
use crate::store::{BaselineStore, ChangeLog};

/// Printed when `reset_baseline` removed an existing baseline.
pub const MSG_BASELINE_REMOVED: &str = "Existing baseline removed. A new snapshot will be created.";
/// Printed after a bootstrap run saved its snapshot.
pub const MSG_INITIAL_SETUP: &str = "Initial setup complete. Settings saved.";
/// Header printed before the list of changes.
pub const MSG_CHANGES_DETECTED: &str = "Changes detected:";
/// Printed when a diff run found nothing.
pub const MSG_NO_CHANGES: &str = "No changes detected.";

/// Receives the user-facing lines a run produces.
pub trait OutputSink {
    /// Emit one line of output.
    fn emit(&self, line: &str);

    /// Emit a warning line. Sinks without a separate warning channel treat
    /// it as an ordinary line.
    fn emit_warning(&self, line: &str) {
        self.emit(line);
    }
}

impl<F: Fn(&str)> OutputSink for F {
    fn emit(&self, line: &str) {
        self(line);
    }
}

/// An [`OutputSink`] that keeps every line in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    lines: Mutex<Vec<String>>,
}

impl CollectingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line emitted so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OutputSink for CollectingSink {
    fn emit(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// How a completed run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// No usable baseline existed; the current state is now the baseline.
    InitialSetup {
        /// Settings that could not be read.
        warnings: Vec<Warning>,
    },
    /// Every setting matched its expectation and the baseline.
    NoChanges {
        /// Settings that could not be read.
        warnings: Vec<Warning>,
    },
    /// At least one setting drifted.
    ChangesDetected {
        /// The detected changes, in setting-name order.
        changes: Vec<Change>,
        /// Settings that could not be read.
        warnings: Vec<Warning>,
    },
    /// The settings document was unusable; nothing was probed or stored.
    ConfigurationInvalid(ConfigError),
}

impl RunOutcome {
    /// Returns `true` for outcomes that should yield a non-zero exit status.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::ConfigurationInvalid(_))
    }

    /// Warnings collected during the run.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        match self {
            Self::InitialSetup { warnings }
            | Self::NoChanges { warnings }
            | Self::ChangesDetected { warnings, .. } => warnings,
            Self::ConfigurationInvalid(_) => &[],
        }
    }
}

/// Performs drift checks against one data directory.
///
/// Runs on the same monitor are serialized; the baseline and change log are
/// never written by two runs at once.
pub struct Monitor {
    layout: Layout,
    probe: Box<dyn Probe>,
    defaults: MissingValueDefaults,
    run_lock: Mutex<()>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("layout", &self.layout)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Create a monitor with an explicit probe backend.
    ///
    /// The missing-value heuristic keywords come from the layout's engine
    /// configuration.
    #[must_use]
    pub fn new(layout: Layout, probe: Box<dyn Probe>) -> Self {
        let defaults = MissingValueDefaults::new(&layout.engine().heuristics.missing_value_defaults);
        Self {
            layout,
            probe,
            defaults,
            run_lock: Mutex::new(()),
        }
    }

    /// Create a monitor using the probe backend named in the engine
    /// configuration.
    #[must_use]
    pub fn from_layout(layout: Layout) -> Self {
        let probe_config = &layout.engine().probe;
        let probe = probe::select(probe_config.backend, probe_config.timeout());
        Self::new(layout, probe)
    }

    /// The data directory layout.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Load and validate the settings document for `mode` without probing.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing every problem found.
    pub fn validate(&self, mode: Mode) -> Result<Settings, ConfigError> {
        settings::load(&self.layout.settings_path(mode))
    }

    /// Perform one drift check.
    ///
    /// An invalid settings document is reported through `sink` and returned
    /// as [`RunOutcome::ConfigurationInvalid`]; no state is touched.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Cancelled`] if `cancel` trips before probing
    /// completes (nothing is persisted), or [`DriftError::Store`] if the
    /// baseline or change log cannot be written.
    pub fn run(
        &self,
        mode: Mode,
        sink: &dyn OutputSink,
        reset_baseline: bool,
        cancel: &CancelToken,
    ) -> Result<RunOutcome, DriftError> {
        let _guard = self.run_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let settings = match self.validate(mode) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!("{mode} configuration rejected");
                sink.emit(&e.to_string());
                return Ok(RunOutcome::ConfigurationInvalid(e));
            }
        };
        tracing::debug!("checking {} {mode} setting(s)", settings.len());

        let baseline = BaselineStore::new(self.layout.baseline_path());
        let change_log = ChangeLog::new(self.layout.change_log_path());
        let engine = DiffEngine::new(self.probe.as_ref(), &self.defaults);

        if reset_baseline && baseline.reset()? {
            sink.emit(MSG_BASELINE_REMOVED);
        }

        let previous = baseline.load();
        if previous.is_empty() {
            let report = engine.observe(&settings, cancel)?;
            baseline.save(&report.snapshot)?;
            sink.emit(MSG_INITIAL_SETUP);
            emit_warnings(sink, &report.warnings);
            return Ok(RunOutcome::InitialSetup {
                warnings: report.warnings,
            });
        }

        let report = engine.diff(&settings, &previous, cancel)?;
        emit_warnings(sink, &report.warnings);
        if report.changes.is_empty() {
            sink.emit(MSG_NO_CHANGES);
        } else {
            sink.emit(MSG_CHANGES_DETECTED);
            for change in &report.changes {
                sink.emit(&format!(" - {change}"));
            }
        }

        // The log is written first: if it fails, the old baseline still
        // holds the pre-change values and the next run reports them again.
        change_log.append(&report.changes)?;
        baseline.save(&report.snapshot)?;

        if report.changes.is_empty() {
            Ok(RunOutcome::NoChanges {
                warnings: report.warnings,
            })
        } else {
            Ok(RunOutcome::ChangesDetected {
                changes: report.changes,
                warnings: report.warnings,
            })
        }
    }
}

fn emit_warnings(sink: &dyn OutputSink, warnings: &[Warning]) {
    for warning in warnings {
        sink.emit_warning(&warning.to_string());
    }
}
