//! The append-only change log.
//!
//! One line per detected change:
//!
//! ```text
//! [CHANGE DETECTED] <name>: Current=<v>[, Expected=<e>][, Previous=<p>]
//! ```
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::diff::Change;
use crate::error::StoreError;

/// Prefix written before every logged change.
pub const ENTRY_PREFIX: &str = "[CHANGE DETECTED]";

/// Appends detected changes to a plain-text log file.
#[derive(Debug, Clone)]
pub struct ChangeLog {
    path: PathBuf,
}

impl ChangeLog {
    /// Create a log backed by `path`. The file is created on first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per change. Existing content is never rewritten.
    ///
    /// An empty slice is a no-op and does not create the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub fn append(&self, changes: &[Change]) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut text = String::new();
        for change in changes {
            text.push_str(ENTRY_PREFIX);
            text.push(' ');
            text.push_str(&change.to_string());
            text.push('\n');
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io("cannot open", &self.path, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| StoreError::io("cannot append to", &self.path, e))?;
        tracing::debug!(
            "appended {} change(s) to {}",
            changes.len(),
            self.path.display()
        );
        Ok(())
    }
}
