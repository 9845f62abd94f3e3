//! Command: run one drift check.
use anyhow::Result;

use super::load_layout;
use crate::cancel::CancelToken;
use crate::cli::{CheckOpts, GlobalOpts};
use crate::config::Mode;
use crate::logging::Logger;
use crate::monitor::{Monitor, RunOutcome};

/// Run the `check` subcommand.
///
/// # Errors
///
/// Returns an error if the settings document is invalid, the run was
/// cancelled, or the baseline or change log could not be written.
pub fn run(global: &GlobalOpts, opts: &CheckOpts, log: &Logger, cancel: &CancelToken) -> Result<()> {
    let mode = Mode::from(opts.mode);
    let layout = load_layout(global, log)?;

    log.stage(&format!("Checking {mode} settings"));
    let monitor = Monitor::from_layout(layout);
    let outcome = monitor.run(mode, log, opts.reset_baseline, cancel)?;

    match &outcome {
        RunOutcome::ConfigurationInvalid(_) => {
            anyhow::bail!("{mode} settings document is invalid");
        }
        RunOutcome::InitialSetup { warnings } => {
            log.debug(&format!("baseline created, {} warning(s)", warnings.len()));
        }
        RunOutcome::NoChanges { warnings } => {
            log.debug(&format!("no drift, {} warning(s)", warnings.len()));
        }
        RunOutcome::ChangesDetected { changes, warnings } => {
            log.debug(&format!(
                "{} change(s) recorded in {}, {} warning(s)",
                changes.len(),
                monitor.layout().change_log_path().display(),
                warnings.len()
            ));
        }
    }
    log.print_log_location();
    Ok(())
}
