//! Settings drift detector.
//!
//! Monitors a declared set of Windows registry settings, compares their
//! current values with declared expectations and with the previous run's
//! snapshot, reports every difference, and keeps an append-only change log.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: parse and validate settings documents and `driftcheck.toml`
//! - **[`probe`]**: read current registry values (`PowerShell` or native `winreg`)
//! - **[`normalize`]**: canonical comparable form for raw, expected, and stored values
//! - **[`diff`]**: compare observations with expectations and the baseline
//! - **[`store`]**: the baseline snapshot and the change log
//! - **[`monitor`]**: one complete run, reported through an [`OutputSink`](monitor::OutputSink)
//! - **[`commands`]**: top-level subcommand orchestration (`check`, `validate`, `version`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cancel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod exec;
pub mod logging;
pub mod monitor;
pub mod normalize;
pub mod probe;
pub mod store;
