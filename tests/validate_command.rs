#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing,
    clippy::panic
)]
//! Integration tests for settings document validation.
//!
//! These tests load settings documents from isolated temporary directories
//! through the public configuration API, verifying that:
//! - well-formed documents load with every field intact
//! - every schema violation in a document is reported, not just the first
//! - missing files, bad JSON, and non-object documents are rejected
//! - a bad `driftcheck.toml` is rejected before anything else happens

mod common;

use common::DataDirBuilder;
use driftcheck::config::{ExpectedValue, Layout, Mode, settings};
use driftcheck::error::ConfigError;

// ---------------------------------------------------------------------------
// Valid documents
// ---------------------------------------------------------------------------

/// Every supported `expected_value` type loads into its typed form.
#[test]
fn all_expected_value_types_load() {
    let dir = DataDirBuilder::new()
        .with_all_settings(
            r#"{
                "Text":    {"path": "HKCU:\\P", "name": "A", "expected_value": "Deny"},
                "Integer": {"path": "HKCU:\\P", "name": "B", "expected_value": 1},
                "Float":   {"path": "HKCU:\\P", "name": "C", "expected_value": 1.5},
                "Boolean": {"path": "HKCU:\\P", "name": "D", "expected_value": true},
                "Null":    {"path": "HKCU:\\P", "name": "E", "expected_value": null},
                "Absent":  {"path": "HKCU:\\P", "name": "F"}
            }"#,
        )
        .build();
    let layout = Layout::load(dir.path()).unwrap();
    let settings = settings::load(&layout.settings_path(Mode::All)).unwrap();

    assert_eq!(settings.len(), 6);
    let expected = |name: &str| settings.get(name).unwrap().expected_value.clone();
    assert_eq!(expected("Text"), Some(ExpectedValue::Text("Deny".into())));
    assert_eq!(expected("Integer"), Some(ExpectedValue::Integer(1)));
    assert_eq!(expected("Float"), Some(ExpectedValue::Float(1.5)));
    assert_eq!(expected("Boolean"), Some(ExpectedValue::Boolean(true)));
    assert_eq!(expected("Null"), None);
    assert_eq!(expected("Absent"), None);
}

/// The JSON `name` field becomes the setting's value name; the object key
/// becomes its name.
#[test]
fn keys_and_value_names_are_distinct() {
    let dir = DataDirBuilder::new()
        .with_privacy_settings(
            r#"{"Telemetry": {"path": "HKLM:\\SOFTWARE\\Policies", "name": "AllowTelemetry"}}"#,
        )
        .build();
    let settings = settings::load(&dir.file("config.json")).unwrap();
    let setting = settings.get("Telemetry").unwrap();
    assert_eq!(setting.name, "Telemetry");
    assert_eq!(setting.value_name, "AllowTelemetry");
    assert_eq!(setting.path, "HKLM:\\SOFTWARE\\Policies");
}

/// An empty object is a valid, empty document.
#[test]
fn empty_document_is_valid() {
    let dir = DataDirBuilder::new().with_all_settings("{}").build();
    assert!(settings::load(&dir.file("all_settings.json")).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Invalid documents
// ---------------------------------------------------------------------------

/// All violations are collected and reported together, in key order.
#[test]
fn every_violation_is_reported() {
    let dir = DataDirBuilder::new()
        .with_all_settings(
            r#"{
                "NotAnObject": 5,
                "NoPath":      {"name": "A"},
                "EmptyName":   {"path": "HKCU:\\P", "name": ""},
                "NumberPath":  {"path": 7, "name": "B"},
                "ListValue":   {"path": "HKCU:\\P", "name": "C", "expected_value": [1]},
                "Fine":        {"path": "HKCU:\\P", "name": "D"}
            }"#,
        )
        .build();
    let err = settings::load(&dir.file("all_settings.json")).unwrap_err();

    let ConfigError::Invalid(violations) = &err else {
        panic!("expected ConfigError::Invalid, got {err:?}");
    };
    assert_eq!(violations.len(), 5);
    insta::assert_snapshot!(err.to_string(), @r"
    Setting 'EmptyName' is missing a string 'name'.
    Setting 'ListValue' has an unsupported 'expected_value' type: array.
    Setting 'NoPath' is missing a string 'path'.
    Setting 'NotAnObject' must be an object.
    Setting 'NumberPath' is missing a string 'path'.
    ");
}

/// A missing file is reported by path.
#[test]
fn missing_file_is_rejected() {
    let dir = DataDirBuilder::new().build();
    let err = settings::load(&dir.file("config.json")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert!(err.to_string().contains("config.json"));
}

/// Malformed JSON is rejected with the parser's message.
#[test]
fn malformed_json_is_rejected() {
    let dir = DataDirBuilder::new().with_all_settings("{\"A\": ").build();
    let err = settings::load(&dir.file("all_settings.json")).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidJson { .. }));
    assert!(err.to_string().contains("is not valid JSON"));
}

/// A top-level array is not a settings document.
#[test]
fn non_object_document_is_rejected() {
    let dir = DataDirBuilder::new().with_all_settings("[]").build();
    let err = settings::load(&dir.file("all_settings.json")).unwrap_err();
    assert!(matches!(err, ConfigError::NotAnObject { .. }));
}

/// An unknown backend in `driftcheck.toml` is rejected when the layout loads.
#[test]
fn bad_engine_config_is_rejected() {
    let dir = DataDirBuilder::new()
        .with_file("driftcheck.toml", "[probe]\nbackend = \"telepathy\"\n")
        .build();
    let err = Layout::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEngineConfig { .. }));
    assert!(err.to_string().contains("driftcheck.toml"));
}
