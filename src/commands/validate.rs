//! Command: validate a settings document without probing.
use anyhow::Result;

use super::load_layout;
use crate::cli::{GlobalOpts, ValidateOpts};
use crate::config::{Mode, settings};
use crate::error::ConfigError;
use crate::logging::Logger;

/// Run the `validate` subcommand.
///
/// Every schema violation is reported, not just the first. Stored state is
/// never read or written.
///
/// # Errors
///
/// Returns an error if the document is missing, unreadable, or invalid.
pub fn run(global: &GlobalOpts, opts: &ValidateOpts, log: &Logger) -> Result<()> {
    let mode = Mode::from(opts.mode);
    let layout = load_layout(global, log)?;
    let path = layout.settings_path(mode);

    log.stage(&format!("Validating {}", path.display()));
    match settings::load(&path) {
        Ok(settings) => {
            log.info(&format!("{} {mode} setting(s), no problems found", settings.len()));
            Ok(())
        }
        Err(ConfigError::Invalid(violations)) => {
            for violation in &violations {
                log.error(violation);
            }
            anyhow::bail!("{} problem(s) in {}", violations.len(), path.display())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::ModeArg;
    use crate::logging::isolated_logger;

    fn global(root: &std::path::Path) -> GlobalOpts {
        GlobalOpts {
            root: Some(root.to_path_buf()),
            backend: None,
            timeout: None,
        }
    }

    #[test]
    fn valid_document_passes() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"Telemetry": {"path": "HKLM:\\P", "name": "AllowTelemetry", "expected_value": 0}}"#,
        )
        .unwrap();
        let opts = ValidateOpts {
            mode: ModeArg::Privacy,
        };
        run(&global(dir.path()), &opts, &log).unwrap();
    }

    #[test]
    fn every_violation_is_counted() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("all_settings.json"),
            r#"{"A": {"name": "x"}, "B": {"path": "HKCU:\\P"}, "C": 1}"#,
        )
        .unwrap();
        let opts = ValidateOpts { mode: ModeArg::All };
        let err = run(&global(dir.path()), &opts, &log).unwrap_err();
        assert!(err.to_string().starts_with("3 problem(s)"), "{err}");
    }

    #[test]
    fn validation_never_creates_stores() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("all_settings.json"), "{}").unwrap();
        run(&global(dir.path()), &ValidateOpts { mode: ModeArg::All }, &log).unwrap();
        assert!(!dir.path().join("settings_database.json").exists());
        assert!(!dir.path().join("settings_log.txt").exists());
    }
}
