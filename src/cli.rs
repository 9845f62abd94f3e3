//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Mode;
use crate::probe::BackendKind;

/// Top-level CLI entry point for the settings drift detector.
#[derive(Parser, Debug)]
#[command(
    name = "driftcheck",
    about = "Detect drift in monitored Windows registry settings",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Data directory holding the settings documents and stores
    #[arg(long, global = true, env = "DRIFTCHECK_ROOT")]
    pub root: Option<PathBuf>,

    /// Probe backend (overrides driftcheck.toml)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// Per-probe timeout in seconds (overrides driftcheck.toml)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare current settings with the baseline and record drift
    Check(CheckOpts),
    /// Validate a settings document without probing anything
    Validate(ValidateOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Subcommand name, used to name the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Check(_) => "check",
            Self::Validate(_) => "validate",
            Self::Version => "version",
        }
    }
}

/// Options for the `check` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CheckOpts {
    /// Which settings document to monitor
    #[arg(short, long, value_enum, default_value_t = ModeArg::All)]
    pub mode: ModeArg,

    /// Discard the stored baseline and take a fresh snapshot
    #[arg(long)]
    pub reset_baseline: bool,
}

/// Options for the `validate` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ValidateOpts {
    /// Which settings document to validate
    #[arg(short, long, value_enum, default_value_t = ModeArg::All)]
    pub mode: ModeArg,
}

/// Command-line spelling of [`Mode`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Every configured setting
    All,
    /// The privacy subset
    Privacy,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::All => Self::All,
            ModeArg::Privacy => Self::Privacy,
        }
    }
}

/// Command-line spelling of [`BackendKind`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// Native on Windows, `PowerShell` elsewhere
    Auto,
    /// Shell out to `PowerShell`
    Command,
    /// Read the registry directly
    Native,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => Self::Auto,
            BackendArg::Command => Self::Command,
            BackendArg::Native => Self::Native,
        }
    }
}
