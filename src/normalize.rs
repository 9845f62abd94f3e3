//! Canonical comparable form for registry values.
//!
//! Raw probe output, declared expected values, and stored baseline entries
//! all pass through the same rules before they are compared:
//!
//! 1. blank text, a missing value, and [`ACCESS_DENIED`] are *unknown* (`None`)
//! 2. surrounding whitespace is trimmed
//! 3. text that parses as an integer becomes [`Value::Integer`]
//! 4. anything else becomes lowercase [`Value::Text`]
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ExpectedValue;

/// Raw value reported by the native probe when the registry denies access.
pub const ACCESS_DENIED: &str = "ACCESS_DENIED";

/// A normalized registry value.
///
/// Serializes as a bare JSON number or string, which is the baseline
/// store's on-disk form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An integral value.
    Integer(i64),
    /// A lowercase, trimmed string value.
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Normalize a raw string value. `None` means the value is unknown.
///
/// # Examples
///
/// ```
/// use driftcheck::normalize::{normalize, Value};
///
/// assert_eq!(normalize(Some(" 123 ")), Some(Value::Integer(123)));
/// assert_eq!(normalize(Some("True")), Some(Value::Text("true".into())));
/// assert_eq!(normalize(Some("ACCESS_DENIED")), None);
/// assert_eq!(normalize(None), None);
/// ```
#[must_use]
pub fn normalize(raw: Option<&str>) -> Option<Value> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed == ACCESS_DENIED {
        return None;
    }
    Some(
        trimmed
            .parse::<i64>()
            .map_or_else(|_| Value::Text(trimmed.to_lowercase()), Value::Integer),
    )
}

/// Normalize a value declared in a settings document.
///
/// Booleans stringify to `"true"`/`"false"` so they compare equal to the
/// string forms registry tools print. Floats keep their decimal point.
#[must_use]
pub fn normalize_expected(expected: &ExpectedValue) -> Option<Value> {
    match expected {
        ExpectedValue::Integer(i) => Some(Value::Integer(*i)),
        ExpectedValue::Boolean(b) => normalize(Some(if *b { "true" } else { "false" })),
        ExpectedValue::Float(f) => normalize(Some(&format!("{f:?}"))),
        ExpectedValue::Text(s) => normalize(Some(s)),
    }
}

/// Normalize a value read back from the baseline store.
///
/// Older stores hold every value as a string; numbers and booleans are
/// accepted too. `null` and composite values are unknown.
#[must_use]
pub fn normalize_stored(stored: &serde_json::Value) -> Option<Value> {
    match stored {
        serde_json::Value::String(s) => normalize(Some(s)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map_or_else(|| normalize(Some(&n.to_string())), |i| Some(Value::Integer(i))),
        serde_json::Value::Bool(b) => normalize_expected(&ExpectedValue::Boolean(*b)),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}
