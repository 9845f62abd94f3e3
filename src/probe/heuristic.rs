//! The missing-value heuristic.
//!
//! Some Windows feature toggles only write their registry value when the
//! feature is switched *off*; while the feature is on the value is simply
//! absent. For settings whose value name matches one of the configured
//! keywords, a `NotFound` probe result is read as an explicit `"0"`.
//!
//! The same keywords, matched against the setting's own name, select the
//! softer "feature not found" warning when a setting cannot be read.
use crate::config::Setting;

use super::ProbeOutcome;

/// Raw value substituted for an absent feature toggle.
pub const ABSENT_FEATURE_VALUE: &str = "0";

/// Case-insensitive keyword allow-list for the missing-value heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingValueDefaults {
    keywords: Vec<String>,
}

impl MissingValueDefaults {
    /// Build the allow-list. Empty keywords are ignored.
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// Returns `true` if an absent value for `setting` means "feature on".
    #[must_use]
    pub fn applies_to(&self, setting: &Setting) -> bool {
        self.matches(&setting.value_name)
    }

    /// Returns `true` if `setting` names a feature that may legitimately be
    /// missing from this machine.
    #[must_use]
    pub fn names_feature(&self, setting: &Setting) -> bool {
        self.matches(&setting.name)
    }

    /// Rewrite a `NotFound` outcome to `Found("0")` when the heuristic
    /// applies to `setting`; every other outcome passes through.
    #[must_use]
    pub fn resolve(&self, setting: &Setting, outcome: ProbeOutcome) -> ProbeOutcome {
        match outcome {
            ProbeOutcome::NotFound if self.applies_to(setting) => {
                tracing::debug!(
                    "{}: value '{}' absent, treating as {ABSENT_FEATURE_VALUE}",
                    setting.name,
                    setting.value_name
                );
                ProbeOutcome::found(ABSENT_FEATURE_VALUE)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> MissingValueDefaults {
        MissingValueDefaults::new(["Recall", "enabled", "  "])
    }

    #[test]
    fn matches_value_name_case_insensitively() {
        let setting = Setting::new("Copilot", "HKCU:\\Software", "IsCopilotEnabled");
        assert!(defaults().applies_to(&setting));
    }

    #[test]
    fn rewrites_not_found_for_matching_value_name() {
        let setting = Setting::new("Feature", "HKCU:\\Software", "Enabled");
        assert_eq!(
            defaults().resolve(&setting, ProbeOutcome::NotFound),
            ProbeOutcome::found("0")
        );
    }

    #[test]
    fn found_values_pass_through() {
        let setting = Setting::new("Feature", "HKCU:\\Software", "Enabled");
        assert_eq!(
            defaults().resolve(&setting, ProbeOutcome::found("1")),
            ProbeOutcome::found("1")
        );
    }

    #[test]
    fn non_matching_value_name_stays_not_found() {
        let setting = Setting::new("SomeOtherKey", "HKCU:\\Software", "SomeOtherKey");
        assert_eq!(
            defaults().resolve(&setting, ProbeOutcome::NotFound),
            ProbeOutcome::NotFound
        );
    }

    #[test]
    fn feature_match_uses_setting_name() {
        let setting = Setting::new("Recall", "HKCU:\\Software\\WindowsAI", "DisableAIDataAnalysis");
        let defaults = defaults();
        assert!(defaults.names_feature(&setting));
        assert!(!defaults.applies_to(&setting));
    }

    #[test]
    fn blank_keywords_are_dropped() {
        let empty = MissingValueDefaults::new([" ", ""]);
        let setting = Setting::new("Anything", "HKCU:\\Software", "Anything");
        assert!(!empty.applies_to(&setting));
    }
}
