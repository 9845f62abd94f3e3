//! Settings document loading and validation.
//!
//! A settings document is a JSON object keyed by setting name. Each value
//! names a registry location and, optionally, the value it is expected to
//! hold:
//!
//! ```json
//! {
//!     "Telemetry": {
//!         "path": "HKLM:\\SOFTWARE\\Policies\\Microsoft\\Windows\\DataCollection",
//!         "name": "AllowTelemetry",
//!         "expected_value": 0
//!     }
//! }
//! ```
//!
//! The document's `name` field is the registry value name; it is exposed as
//! [`Setting::value_name`] so it is never confused with the setting's key.
use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::ConfigError;

/// A scalar declared as the value a setting should hold.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedValue {
    /// A string literal.
    Text(String),
    /// An integer literal.
    Integer(i64),
    /// A floating-point literal.
    Float(f64),
    /// A boolean literal.
    Boolean(bool),
}

/// One monitored registry value.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    /// Unique key of the setting within its document.
    pub name: String,
    /// Registry key path (e.g., `HKCU:\Software\Microsoft\Windows`).
    pub path: String,
    /// Registry value name under `path`.
    pub value_name: String,
    /// Value the setting is expected to hold, if declared.
    pub expected_value: Option<ExpectedValue>,
}

impl Setting {
    /// Create a setting without an expected value.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>, value_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            value_name: value_name.into(),
            expected_value: None,
        }
    }

    /// Declare the value this setting is expected to hold.
    #[must_use]
    pub fn expecting(mut self, expected: ExpectedValue) -> Self {
        self.expected_value = Some(expected);
        self
    }
}

/// A validated set of settings, iterated in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    entries: BTreeMap<String, Setting>,
}

impl Settings {
    /// Build a settings set from already-validated entries.
    ///
    /// Later entries with a duplicate name replace earlier ones.
    #[must_use]
    pub fn from_settings(settings: impl IntoIterator<Item = Setting>) -> Self {
        Self {
            entries: settings.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }

    /// Iterate settings in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.entries.values()
    }

    /// Look up a setting by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.entries.get(name)
    }

    /// Number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the document declared no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load and validate the settings document at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file is absent, unreadable, not valid
/// JSON, not a JSON object, or if any entry violates the schema. Schema
/// violations are collected across the whole document and reported together.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let document: Value =
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let Value::Object(entries) = document else {
        return Err(ConfigError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let settings = parse_entries(&entries)?;
    tracing::debug!("loaded {} settings from {}", settings.len(), path.display());
    Ok(settings)
}

/// Validate every entry of a settings object, collecting all violations.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] listing each violation when at least one
/// entry is malformed.
pub fn parse_entries(entries: &Map<String, Value>) -> Result<Settings, ConfigError> {
    let mut errors = Vec::new();
    let mut settings = BTreeMap::new();

    for (name, info) in entries {
        let Value::Object(info) = info else {
            errors.push(format!("Setting '{name}' must be an object."));
            continue;
        };

        let path = required_string(name, info, "path", &mut errors);
        let value_name = required_string(name, info, "name", &mut errors);
        let expected_value = match info.get("expected_value") {
            None | Some(Value::Null) => Ok(None),
            Some(value) => expected_from_json(value).map(Some).ok_or_else(|| {
                format!(
                    "Setting '{name}' has an unsupported 'expected_value' type: {}.",
                    json_type_name(value)
                )
            }),
        };
        let expected_value = match expected_value {
            Ok(v) => v,
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if let (Some(path), Some(value_name)) = (path, value_name) {
            settings.insert(
                name.clone(),
                Setting {
                    name: name.clone(),
                    path,
                    value_name,
                    expected_value,
                },
            );
        }
    }

    if errors.is_empty() {
        Ok(Settings { entries: settings })
    } else {
        Err(ConfigError::Invalid(errors))
    }
}

fn required_string(
    setting: &str,
    info: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<String> {
    match info.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => {
            errors.push(format!("Setting '{setting}' is missing a string '{key}'."));
            None
        }
    }
}

fn expected_from_json(value: &Value) -> Option<ExpectedValue> {
    match value {
        Value::String(s) => Some(ExpectedValue::Text(s.clone())),
        Value::Bool(b) => Some(ExpectedValue::Boolean(*b)),
        Value::Number(n) => n.as_i64().map_or_else(
            || {
                if n.is_u64() {
                    // Beyond i64: keep the exact digits rather than rounding through f64.
                    Some(ExpectedValue::Text(n.to_string()))
                } else {
                    n.as_f64().map(ExpectedValue::Float)
                }
            },
            |i| Some(ExpectedValue::Integer(i)),
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn write_doc(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_valid_document() {
        let (_dir, path) = write_doc(
            r#"{
                "Telemetry": {"path": "HKLM:\\Policies\\DataCollection", "name": "AllowTelemetry", "expected_value": 0},
                "Location": {"path": "HKCU:\\Location", "name": "Value"}
            }"#,
        );

        let settings = load(&path).unwrap();
        assert_eq!(settings.len(), 2);

        let telemetry = settings.get("Telemetry").expect("Telemetry entry");
        assert_eq!(telemetry.path, "HKLM:\\Policies\\DataCollection");
        assert_eq!(telemetry.value_name, "AllowTelemetry");
        assert_eq!(telemetry.expected_value, Some(ExpectedValue::Integer(0)));

        let location = settings.get("Location").expect("Location entry");
        assert_eq!(location.expected_value, None);
    }

    #[test]
    fn settings_iterate_in_name_order() {
        let (_dir, path) = write_doc(
            r#"{"b": {"path": "P", "name": "N"}, "a": {"path": "P", "name": "N"}}"#,
        );
        let settings = load(&path).unwrap();
        let names: Vec<&str> = settings.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let (_dir, path) = write_doc("{ not json");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson { .. }));
        assert!(err.to_string().contains("is not valid JSON"));
    }

    #[test]
    fn top_level_array_is_rejected() {
        let (_dir, path) = write_doc("[]");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject { .. }));
    }

    #[test]
    fn every_violation_is_reported() {
        let (_dir, path) = write_doc(
            r#"{
                "NoPath": {"name": "N"},
                "ListExpected": {"path": "P", "name": "N", "expected_value": [1, 2]},
                "ObjectExpected": {"path": "P", "name": "N", "expected_value": {"a": 1}},
                "NotObject": "HKCU:\\Foo",
                "EmptyName": {"path": "P", "name": ""},
                "Fine": {"path": "P", "name": "N"}
            }"#,
        );

        let err = load(&path).unwrap_err();
        let ConfigError::Invalid(errors) = err else {
            panic!("expected Invalid, got {err:?}");
        };
        assert_eq!(errors.len(), 5, "errors: {errors:?}");
        assert!(errors.contains(&"Setting 'NoPath' is missing a string 'path'.".to_string()));
        assert!(errors.contains(
            &"Setting 'ListExpected' has an unsupported 'expected_value' type: array.".to_string()
        ));
        assert!(errors.contains(
            &"Setting 'ObjectExpected' has an unsupported 'expected_value' type: object."
                .to_string()
        ));
        assert!(errors.contains(&"Setting 'NotObject' must be an object.".to_string()));
        assert!(errors.contains(&"Setting 'EmptyName' is missing a string 'name'.".to_string()));
    }

    #[test]
    fn non_string_path_is_rejected() {
        let (_dir, path) = write_doc(r#"{"A": {"path": 5, "name": "N"}}"#);
        let err = load(&path).unwrap_err();
        assert_eq!(err.to_string(), "Setting 'A' is missing a string 'path'.");
    }

    #[test]
    fn scalar_expected_values_are_accepted() {
        let (_dir, path) = write_doc(
            r#"{
                "S": {"path": "P", "name": "N", "expected_value": "on"},
                "I": {"path": "P", "name": "N", "expected_value": -3},
                "F": {"path": "P", "name": "N", "expected_value": 1.5},
                "B": {"path": "P", "name": "N", "expected_value": true},
                "Null": {"path": "P", "name": "N", "expected_value": null}
            }"#,
        );

        let settings = load(&path).unwrap();
        let expected = |name: &str| settings.get(name).unwrap().expected_value.clone();
        assert_eq!(expected("S"), Some(ExpectedValue::Text("on".to_string())));
        assert_eq!(expected("I"), Some(ExpectedValue::Integer(-3)));
        assert_eq!(expected("F"), Some(ExpectedValue::Float(1.5)));
        assert_eq!(expected("B"), Some(ExpectedValue::Boolean(true)));
        assert_eq!(expected("Null"), None);
    }

    #[test]
    fn huge_unsigned_expected_value_keeps_digits() {
        let (_dir, path) = write_doc(
            r#"{"Q": {"path": "P", "name": "N", "expected_value": 18446744073709551615}}"#,
        );
        let settings = load(&path).unwrap();
        assert_eq!(
            settings.get("Q").unwrap().expected_value,
            Some(ExpectedValue::Text("18446744073709551615".to_string()))
        );
    }

    #[test]
    fn from_settings_keys_by_name() {
        let settings = Settings::from_settings([
            Setting::new("A", "P", "N"),
            Setting::new("B", "P", "M").expecting(ExpectedValue::Boolean(false)),
        ]);
        assert_eq!(settings.len(), 2);
        assert_eq!(settings.get("B").unwrap().value_name, "M");
    }
}
