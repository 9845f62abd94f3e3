//! Native registry probe backend.
//!
//! Uses the `winreg` crate on Windows. Keys are opened with
//! `KEY_WOW64_64KEY` so a 32-bit build sees the same values as the 64-bit
//! registry view instead of the `WOW6432Node` redirect.
use std::fmt::Write as _;

use super::{Probe, ProbeOutcome};
use crate::cancel::CancelToken;
use crate::config::Setting;

/// A predefined registry root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hive {
    /// `HKEY_CURRENT_USER` (`HKCU:`).
    CurrentUser,
    /// `HKEY_LOCAL_MACHINE` (`HKLM:`).
    LocalMachine,
    /// `HKEY_CLASSES_ROOT` (`HKCR:`).
    ClassesRoot,
    /// `HKEY_USERS` (`HKU:`).
    Users,
    /// `HKEY_CURRENT_CONFIG` (`HKCC:`).
    CurrentConfig,
}

impl Hive {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "HKCU" | "HKEY_CURRENT_USER" => Some(Self::CurrentUser),
            "HKLM" | "HKEY_LOCAL_MACHINE" => Some(Self::LocalMachine),
            "HKCR" | "HKEY_CLASSES_ROOT" => Some(Self::ClassesRoot),
            "HKU" | "HKEY_USERS" => Some(Self::Users),
            "HKCC" | "HKEY_CURRENT_CONFIG" => Some(Self::CurrentConfig),
            _ => None,
        }
    }
}

/// Split a registry path into its hive and subkey.
///
/// Accepts `PowerShell` drive paths (`HKLM:\SOFTWARE\…`), full hive names
/// (`HKEY_LOCAL_MACHINE\SOFTWARE\…`), and provider-qualified paths
/// (`Registry::HKEY_LOCAL_MACHINE\SOFTWARE\…`).
#[must_use]
pub fn split_key_path(path: &str) -> Option<(Hive, &str)> {
    let path = path.trim();
    let path = strip_prefix_ignore_case(path, "Registry::").unwrap_or(path);
    let (head, rest) = path.split_once(['\\', '/']).unwrap_or((path, ""));
    let hive = Hive::from_name(head.trim_end_matches(':'))?;
    Some((hive, rest.trim_matches(['\\', '/'])))
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .and_then(|_| s.get(prefix.len()..))
}

/// Render binary registry data as space-separated hex bytes.
#[cfg_attr(not(windows), allow(dead_code))]
fn format_binary(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Reads registry values through the Windows registry API.
///
/// "Access denied" reads as [`ACCESS_DENIED`](crate::normalize::ACCESS_DENIED)
/// so the normalizer can drop it; every other fault reads as
/// [`ProbeOutcome::NotFound`]. On other platforms every probe is `NotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProbe;

impl NativeProbe {
    /// Create a native probe.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Probe for NativeProbe {
    fn probe(&self, setting: &Setting, cancel: &CancelToken) -> ProbeOutcome {
        if cancel.is_cancelled() {
            return ProbeOutcome::NotFound;
        }
        let Some((hive, subkey)) = split_key_path(&setting.path) else {
            tracing::debug!("{}: unrecognised registry hive in '{}'", setting.name, setting.path);
            return ProbeOutcome::NotFound;
        };
        read(setting, hive, subkey)
    }
}

#[cfg(windows)]
fn read(setting: &Setting, hive: Hive, subkey: &str) -> ProbeOutcome {
    use std::io::ErrorKind;

    match read_value(hive, subkey, &setting.value_name) {
        Ok(value) => ProbeOutcome::Found(value),
        Err(e) if e.kind() == ErrorKind::NotFound => ProbeOutcome::NotFound,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            tracing::debug!("{}: access denied", setting.name);
            ProbeOutcome::found(crate::normalize::ACCESS_DENIED)
        }
        Err(e) => {
            tracing::debug!("{}: registry read failed: {e}", setting.name);
            ProbeOutcome::NotFound
        }
    }
}

#[cfg(not(windows))]
fn read(setting: &Setting, hive: Hive, subkey: &str) -> ProbeOutcome {
    tracing::debug!(
        "{}: native registry access unavailable on this platform ({hive:?}\\{subkey})",
        setting.name
    );
    ProbeOutcome::NotFound
}

#[cfg(windows)]
fn read_value(hive: Hive, subkey: &str, value_name: &str) -> std::io::Result<String> {
    use winreg::RegKey;
    use winreg::enums::{
        HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE,
        HKEY_USERS, KEY_READ, KEY_WOW64_64KEY, RegType,
    };

    let root = RegKey::predef(match hive {
        Hive::CurrentUser => HKEY_CURRENT_USER,
        Hive::LocalMachine => HKEY_LOCAL_MACHINE,
        Hive::ClassesRoot => HKEY_CLASSES_ROOT,
        Hive::Users => HKEY_USERS,
        Hive::CurrentConfig => HKEY_CURRENT_CONFIG,
    });
    let key = if subkey.is_empty() {
        root
    } else {
        root.open_subkey_with_flags(subkey, KEY_READ | KEY_WOW64_64KEY)?
    };

    let raw = key.get_raw_value(value_name)?;
    let rendered = match raw.vtype {
        RegType::REG_DWORD => key.get_value::<u32, _>(value_name)?.to_string(),
        RegType::REG_QWORD => key.get_value::<u64, _>(value_name)?.to_string(),
        RegType::REG_SZ | RegType::REG_EXPAND_SZ => key.get_value::<String, _>(value_name)?,
        RegType::REG_MULTI_SZ => key.get_value::<Vec<String>, _>(value_name)?.join("\n"),
        _ => format_binary(&raw.bytes),
    };
    Ok(rendered)
}
