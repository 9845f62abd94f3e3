//! `PowerShell` probe backend.
use std::path::PathBuf;
use std::time::Duration;

use super::{Probe, ProbeOutcome};
use crate::cancel::CancelToken;
use crate::config::Setting;
use crate::exec::{self, Completion, ExecResult};

/// Arguments passed before the script.
const SHELL_ARGS: &[&str] = &["-NoProfile", "-NonInteractive", "-Command"];

/// Reads registry values by running `Get-ItemProperty` in a child process.
///
/// A non-zero exit, empty output, a timeout, or a missing shell all read as
/// [`ProbeOutcome::NotFound`].
#[derive(Debug, Clone)]
pub struct CommandProbe {
    shell: Option<PathBuf>,
    timeout: Duration,
}

impl CommandProbe {
    /// Locate `powershell` (or `pwsh`) on `PATH`.
    #[must_use]
    pub fn detect(timeout: Duration) -> Self {
        let shell = which::which("powershell")
            .or_else(|_| which::which("pwsh"))
            .ok();
        if shell.is_none() {
            tracing::warn!("neither powershell nor pwsh found on PATH; command probes will fail");
        }
        Self { shell, timeout }
    }

    /// Use an explicit shell executable.
    #[must_use]
    pub fn with_shell(shell: Option<PathBuf>, timeout: Duration) -> Self {
        Self { shell, timeout }
    }

    /// The shell this probe runs, if one was found.
    #[must_use]
    pub const fn shell(&self) -> Option<&PathBuf> {
        self.shell.as_ref()
    }
}

impl Probe for CommandProbe {
    fn probe(&self, setting: &Setting, cancel: &CancelToken) -> ProbeOutcome {
        let Some(shell) = &self.shell else {
            return ProbeOutcome::NotFound;
        };

        let script = probe_script(&setting.path, &setting.value_name);
        let mut args = SHELL_ARGS.to_vec();
        args.push(&script);

        match exec::run_with_deadline(shell, &args, self.timeout, cancel) {
            Ok(Completion::Exited(result)) => interpret(&result),
            Ok(Completion::TimedOut) => {
                tracing::warn!(
                    "{}: probe timed out after {}s",
                    setting.name,
                    self.timeout.as_secs()
                );
                ProbeOutcome::NotFound
            }
            Ok(Completion::Cancelled) => ProbeOutcome::NotFound,
            Err(e) => {
                tracing::debug!("{}: probe failed to run: {e:#}", setting.name);
                ProbeOutcome::NotFound
            }
        }
    }
}

/// Build the `PowerShell` script that prints one value or exits non-zero.
fn probe_script(key_path: &str, value_name: &str) -> String {
    let key = key_path.replace('\'', "''");
    let name = value_name.replace('\'', "''");
    format!(
        "$item = Get-ItemProperty -Path '{key}' -Name '{name}' -ErrorAction SilentlyContinue\n\
         if ($null -eq $item) {{ exit 1 }}\n\
         $value = $item.'{name}'\n\
         if ($null -eq $value) {{ exit 1 }}\n\
         Write-Output $value"
    )
}

/// Map a finished process to a probe outcome.
fn interpret(result: &ExecResult) -> ProbeOutcome {
    let output = result.stdout.trim();
    if !result.success || output.is_empty() {
        ProbeOutcome::NotFound
    } else {
        ProbeOutcome::found(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exited(stdout: &str, success: bool) -> ExecResult {
        ExecResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            success,
            code: Some(i32::from(!success)),
        }
    }

    #[test]
    fn script_escapes_single_quotes() {
        let script = probe_script("HKCU:\\It's", "O'Brien");
        assert!(script.contains("-Path 'HKCU:\\It''s'"));
        assert!(script.contains("-Name 'O''Brien'"));
        assert!(script.contains("$item.'O''Brien'"));
    }

    #[test]
    fn successful_output_is_trimmed() {
        assert_eq!(
            interpret(&exited("  1\r\n", true)),
            ProbeOutcome::found("1")
        );
    }

    #[test]
    fn non_zero_exit_is_not_found() {
        assert_eq!(interpret(&exited("1", false)), ProbeOutcome::NotFound);
    }

    #[test]
    fn empty_output_is_not_found() {
        assert_eq!(interpret(&exited(" \n", true)), ProbeOutcome::NotFound);
    }

    #[test]
    fn missing_shell_is_not_found() {
        let probe = CommandProbe::with_shell(None, Duration::from_secs(1));
        let setting = Setting::new("A", "HKCU:\\Software", "Value");
        assert_eq!(
            probe.probe(&setting, &CancelToken::new()),
            ProbeOutcome::NotFound
        );
    }

    #[test]
    fn unrunnable_shell_is_not_found() {
        let probe = CommandProbe::with_shell(
            Some(PathBuf::from("this-shell-does-not-exist-12345")),
            Duration::from_secs(1),
        );
        let setting = Setting::new("A", "HKCU:\\Software", "Value");
        assert_eq!(
            probe.probe(&setting, &CancelToken::new()),
            ProbeOutcome::NotFound
        );
    }
}
