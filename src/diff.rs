//! The drift diff engine.
//!
//! For every setting the engine probes the registry, applies the
//! missing-value heuristic, normalizes the raw value, and compares it with
//! the setting's declared expectation and the previous baseline snapshot.
use std::collections::BTreeMap;
use std::fmt;

use crate::cancel::CancelToken;
use crate::config::{Setting, Settings};
use crate::error::DriftError;
use crate::normalize::{self, Value};
use crate::probe::{MissingValueDefaults, Probe, ProbeOutcome};

/// Normalized values keyed by setting name.
pub type Snapshot = BTreeMap<String, Value>;

/// A setting whose current value disagrees with its expectation, its
/// previous observation, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Setting name.
    pub name: String,
    /// Current normalized value.
    pub current: Value,
    /// Declared expected value; present only when it differs from `current`.
    pub expected: Option<Value>,
    /// Baseline value; present only when it differs from `current`.
    pub previous: Option<Value>,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: Current={}", self.name, self.current)?;
        if let Some(expected) = &self.expected {
            write!(f, ", Expected={expected}")?;
        }
        if let Some(previous) = &self.previous {
            write!(f, ", Previous={previous}")?;
        }
        Ok(())
    }
}

/// Why a setting produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A feature-named setting is simply not present on this machine.
    FeatureAbsent,
    /// The setting could not be read.
    Unreadable,
}

/// A non-fatal note about a setting that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Setting name.
    pub setting: String,
    /// Which message applies.
    pub kind: WarningKind,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::FeatureAbsent => write!(
                f,
                "Warning: {} feature not found on this machine, skipping.",
                self.setting
            ),
            WarningKind::Unreadable => {
                write!(f, "Warning: Unable to read setting '{}'.", self.setting)
            }
        }
    }
}

/// Everything one pass over the settings produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    /// Detected drift, in setting-name order.
    pub changes: Vec<Change>,
    /// Every successfully observed, normalized value.
    pub snapshot: Snapshot,
    /// Settings that could not be read.
    pub warnings: Vec<Warning>,
}

/// Compares probed values against expectations and a baseline.
pub struct DiffEngine<'a> {
    probe: &'a dyn Probe,
    defaults: &'a MissingValueDefaults,
}

impl fmt::Debug for DiffEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffEngine")
            .field("defaults", self.defaults)
            .finish_non_exhaustive()
    }
}

impl<'a> DiffEngine<'a> {
    /// Create an engine over `probe` using the given heuristic allow-list.
    #[must_use]
    pub const fn new(probe: &'a dyn Probe, defaults: &'a MissingValueDefaults) -> Self {
        Self { probe, defaults }
    }

    /// Observe every setting without comparing anything.
    ///
    /// Used to establish the first baseline: the report never contains
    /// changes, even when declared expectations disagree.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Cancelled`] if `cancel` is tripped mid-pass.
    pub fn observe(&self, settings: &Settings, cancel: &CancelToken) -> Result<DiffReport, DriftError> {
        self.pass(settings, None, cancel)
    }

    /// Observe every setting and compare it with its expectation and with
    /// `baseline`.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Cancelled`] if `cancel` is tripped mid-pass.
    pub fn diff(
        &self,
        settings: &Settings,
        baseline: &Snapshot,
        cancel: &CancelToken,
    ) -> Result<DiffReport, DriftError> {
        self.pass(settings, Some(baseline), cancel)
    }

    fn pass(
        &self,
        settings: &Settings,
        baseline: Option<&Snapshot>,
        cancel: &CancelToken,
    ) -> Result<DiffReport, DriftError> {
        let mut report = DiffReport::default();

        for setting in settings.iter() {
            if cancel.is_cancelled() {
                return Err(DriftError::Cancelled);
            }

            let outcome = self.probe.probe(setting, cancel);
            if cancel.is_cancelled() {
                // The probe may have been cut short; its outcome is meaningless.
                return Err(DriftError::Cancelled);
            }

            let raw = match self.defaults.resolve(setting, outcome) {
                ProbeOutcome::Found(raw) => raw,
                ProbeOutcome::NotFound => {
                    report.warnings.push(self.warning_for(setting));
                    continue;
                }
            };

            let Some(current) = normalize::normalize(Some(&raw)) else {
                tracing::debug!("{}: value unknown, skipping", setting.name);
                continue;
            };
            tracing::debug!("{}: {current}", setting.name);

            if let Some(baseline) = baseline
                && let Some(change) = compare(setting, &current, baseline.get(&setting.name))
            {
                report.changes.push(change);
            }
            report.snapshot.insert(setting.name.clone(), current);
        }

        Ok(report)
    }

    fn warning_for(&self, setting: &Setting) -> Warning {
        let kind = if self.defaults.names_feature(setting) {
            WarningKind::FeatureAbsent
        } else {
            WarningKind::Unreadable
        };
        tracing::debug!("{}: not found ({kind:?})", setting.name);
        Warning {
            setting: setting.name.clone(),
            kind,
        }
    }
}

/// Compare one observed value with its expectation and previous value.
///
/// An expectation that normalizes to "unknown" is treated as undeclared; a
/// setting absent from the baseline is a first observation, not a change.
fn compare(setting: &Setting, current: &Value, previous: Option<&Value>) -> Option<Change> {
    let expected = setting
        .expected_value
        .as_ref()
        .and_then(normalize::normalize_expected)
        .filter(|expected| expected != current);
    let previous = previous.filter(|previous| *previous != current).cloned();

    if expected.is_none() && previous.is_none() {
        return None;
    }
    Some(Change {
        name: setting.name.clone(),
        current: current.clone(),
        expected,
        previous,
    })
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::needless_pass_by_value
)]
mod tests {
    use super::*;
    use crate::config::ExpectedValue;
    use mockall::mock;
    use mockall::predicate::always;

    mock! {
        pub Registry {}
        impl Probe for Registry {
            fn probe(&self, setting: &Setting, cancel: &CancelToken) -> ProbeOutcome;
        }
    }

    /// A mock probe answering from a fixed table of `value_name -> outcome`.
    fn registry(values: &[(&str, ProbeOutcome)]) -> MockRegistry {
        let table: BTreeMap<String, ProbeOutcome> = values
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        let mut mock = MockRegistry::new();
        mock.expect_probe()
            .with(always(), always())
            .returning(move |setting, _| {
                table
                    .get(&setting.value_name)
                    .cloned()
                    .unwrap_or(ProbeOutcome::NotFound)
            });
        mock
    }

    fn defaults() -> MissingValueDefaults {
        MissingValueDefaults::new(["recall", "enabled"])
    }

    fn value(raw: &str) -> Value {
        normalize::normalize(Some(raw)).unwrap()
    }

    fn one_setting(expected: Option<ExpectedValue>) -> Settings {
        let mut setting = Setting::new("A", "HKCU:\\P", "N");
        setting.expected_value = expected;
        Settings::from_settings([setting])
    }

    #[test]
    fn bootstrap_observes_without_comparing() {
        let probe = registry(&[("N", ProbeOutcome::found(" 0 "))]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = one_setting(Some(ExpectedValue::Text("1".into())));

        let report = engine.observe(&settings, &CancelToken::new()).unwrap();
        assert!(report.changes.is_empty());
        assert_eq!(report.snapshot.get("A"), Some(&Value::Integer(0)));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn matching_expected_value_is_not_a_change() {
        let probe = registry(&[("N", ProbeOutcome::found("1"))]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = one_setting(Some(ExpectedValue::Text("1".into())));
        let baseline = Snapshot::from([("A".to_string(), value("1"))]);

        let report = engine.diff(&settings, &baseline, &CancelToken::new()).unwrap();
        assert!(report.changes.is_empty());
    }

    #[test]
    fn expected_mismatch_reports_expected_only() {
        let probe = registry(&[("N", ProbeOutcome::found("0"))]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = one_setting(Some(ExpectedValue::Text("1".into())));
        let baseline = Snapshot::from([("A".to_string(), value("0"))]);

        let report = engine.diff(&settings, &baseline, &CancelToken::new()).unwrap();
        assert_eq!(
            report.changes,
            vec![Change {
                name: "A".into(),
                current: value("0"),
                expected: Some(value("1")),
                previous: None,
            }]
        );
    }

    #[test]
    fn baseline_mismatch_reports_previous() {
        let probe = registry(&[("N", ProbeOutcome::found("2"))]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = one_setting(None);
        let baseline = Snapshot::from([("A".to_string(), value("1"))]);

        let report = engine.diff(&settings, &baseline, &CancelToken::new()).unwrap();
        assert_eq!(report.changes.len(), 1);
        let change = &report.changes[0];
        assert_eq!(change.current, value("2"));
        assert_eq!(change.previous, Some(value("1")));
        assert_eq!(change.expected, None);
        assert_eq!(change.to_string(), "A: Current=2, Previous=1");
    }

    #[test]
    fn both_mismatches_are_reported_together() {
        let probe = registry(&[("N", ProbeOutcome::found("2"))]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = one_setting(Some(ExpectedValue::Integer(0)));
        let baseline = Snapshot::from([("A".to_string(), value("1"))]);

        let report = engine.diff(&settings, &baseline, &CancelToken::new()).unwrap();
        assert_eq!(
            report.changes[0].to_string(),
            "A: Current=2, Expected=0, Previous=1"
        );
    }

    #[test]
    fn new_setting_is_first_observation() {
        let probe = registry(&[("N", ProbeOutcome::found("5"))]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = one_setting(None);
        let baseline = Snapshot::from([("Other".to_string(), value("1"))]);

        let report = engine.diff(&settings, &baseline, &CancelToken::new()).unwrap();
        assert!(report.changes.is_empty());
        assert_eq!(report.snapshot.get("A"), Some(&Value::Integer(5)));
    }

    #[test]
    fn missing_value_heuristic_reads_absent_as_zero() {
        let probe = registry(&[]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = Settings::from_settings([Setting::new("Feature", "HKCU:\\P", "Enabled")]);
        let baseline = Snapshot::from([("Feature".to_string(), value("0"))]);

        let report = engine.diff(&settings, &baseline, &CancelToken::new()).unwrap();
        assert!(report.warnings.is_empty());
        assert!(report.changes.is_empty());
        assert_eq!(report.snapshot.get("Feature"), Some(&Value::Integer(0)));
    }

    #[test]
    fn unreadable_setting_warns_and_is_dropped() {
        let probe = registry(&[]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings =
            Settings::from_settings([Setting::new("SomeOtherKey", "HKCU:\\P", "SomeOtherKey")]);
        let baseline = Snapshot::from([("SomeOtherKey".to_string(), value("1"))]);

        let report = engine.diff(&settings, &baseline, &CancelToken::new()).unwrap();
        assert!(report.changes.is_empty());
        assert!(report.snapshot.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            report.warnings[0].to_string(),
            "Warning: Unable to read setting 'SomeOtherKey'."
        );
    }

    #[test]
    fn feature_named_setting_gets_soft_warning() {
        let probe = registry(&[]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = Settings::from_settings([Setting::new(
            "Recall",
            "HKCU:\\Software\\Policies\\Microsoft\\Windows\\WindowsAI",
            "DisableAIDataAnalysis",
        )]);

        let report = engine.observe(&settings, &CancelToken::new()).unwrap();
        assert_eq!(report.warnings[0].kind, WarningKind::FeatureAbsent);
        assert_eq!(
            report.warnings[0].to_string(),
            "Warning: Recall feature not found on this machine, skipping."
        );
    }

    #[test]
    fn unknown_values_are_skipped_silently() {
        let probe = registry(&[
            ("Blank", ProbeOutcome::found("  ")),
            ("Denied", ProbeOutcome::found(normalize::ACCESS_DENIED)),
        ]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = Settings::from_settings([
            Setting::new("Blank", "HKCU:\\P", "Blank").expecting(ExpectedValue::Integer(1)),
            Setting::new("Denied", "HKCU:\\P", "Denied"),
        ]);
        let baseline = Snapshot::from([
            ("Blank".to_string(), value("1")),
            ("Denied".to_string(), value("1")),
        ]);

        let report = engine.diff(&settings, &baseline, &CancelToken::new()).unwrap();
        assert!(report.changes.is_empty());
        assert!(report.warnings.is_empty());
        assert!(report.snapshot.is_empty());
    }

    #[test]
    fn boolean_expectation_matches_case_insensitive_text() {
        let probe = registry(&[("N", ProbeOutcome::found("True"))]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = one_setting(Some(ExpectedValue::Boolean(true)));

        let report = engine
            .diff(&settings, &Snapshot::new(), &CancelToken::new())
            .unwrap();
        assert!(report.changes.is_empty());
    }

    #[test]
    fn blank_expectation_is_ignored() {
        let probe = registry(&[("N", ProbeOutcome::found("3"))]);
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = one_setting(Some(ExpectedValue::Text("  ".into())));

        let report = engine
            .diff(&settings, &Snapshot::new(), &CancelToken::new())
            .unwrap();
        assert!(report.changes.is_empty());
    }

    #[test]
    fn cancelled_pass_is_an_error() {
        let mut probe = MockRegistry::new();
        probe.expect_probe().never();
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = engine.observe(&one_setting(None), &cancel);
        assert!(matches!(result, Err(DriftError::Cancelled)));
    }

    #[test]
    fn cancellation_during_probe_discards_outcome() {
        let cancel = CancelToken::new();
        let trip = cancel.clone();
        let mut probe = MockRegistry::new();
        probe.expect_probe().times(1).returning(move |_, _| {
            trip.cancel();
            ProbeOutcome::NotFound
        });
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = Settings::from_settings([
            Setting::new("A", "HKCU:\\P", "A"),
            Setting::new("B", "HKCU:\\P", "B"),
        ]);

        let result = engine.observe(&settings, &cancel);
        assert!(matches!(result, Err(DriftError::Cancelled)));
    }

    #[test]
    fn settings_are_probed_once_each() {
        let mut probe = MockRegistry::new();
        probe
            .expect_probe()
            .times(3)
            .returning(|_, _| ProbeOutcome::found("1"));
        let defaults = defaults();
        let engine = DiffEngine::new(&probe, &defaults);
        let settings = Settings::from_settings([
            Setting::new("A", "HKCU:\\P", "A"),
            Setting::new("B", "HKCU:\\P", "B"),
            Setting::new("C", "HKCU:\\P", "C"),
        ]);

        let report = engine.observe(&settings, &CancelToken::new()).unwrap();
        assert_eq!(report.snapshot.len(), 3);
    }
}
