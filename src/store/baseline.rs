//! The baseline snapshot store.
//!
//! The baseline is a JSON object mapping setting names to normalized values,
//! written with four-space indentation and sorted keys so that saving the
//! same snapshot twice produces byte-identical files.
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use serde::Serialize as _;

use crate::diff::Snapshot;
use crate::error::StoreError;
use crate::normalize;

/// Reads and writes the baseline snapshot file.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    /// Create a store backed by `path`. Nothing is read until [`load`](Self::load).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a baseline file is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the stored snapshot.
    ///
    /// A missing, unreadable, or corrupt file loads as an empty snapshot so
    /// the next run re-bootstraps. Entries whose value normalizes to
    /// "unknown" are dropped.
    #[must_use]
    pub fn load(&self) -> Snapshot {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no baseline at {}", self.path.display());
                return Snapshot::new();
            }
            Err(e) => {
                tracing::warn!("cannot read baseline {}: {e}", self.path.display());
                return Snapshot::new();
            }
        };

        let entries = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(serde_json::Value::Object(entries)) => entries,
            Ok(_) => {
                tracing::warn!(
                    "baseline {} is not a JSON object, starting fresh",
                    self.path.display()
                );
                return Snapshot::new();
            }
            Err(e) => {
                tracing::warn!(
                    "baseline {} is corrupt ({e}), starting fresh",
                    self.path.display()
                );
                return Snapshot::new();
            }
        };

        let snapshot: Snapshot = entries
            .iter()
            .filter_map(|(name, value)| {
                normalize::normalize_stored(value).map(|value| (name.clone(), value))
            })
            .collect();
        tracing::debug!(
            "loaded {} baseline entries from {}",
            snapshot.len(),
            self.path.display()
        );
        snapshot
    }

    /// Replace the stored snapshot with `snapshot`.
    ///
    /// The file is written to a sibling temporary file first and then
    /// renamed over the old one, so a failed write leaves the previous
    /// baseline intact.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        snapshot.serialize(&mut serializer)?;
        buf.push(b'\n');

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::io("cannot create directory", parent, e))?;
        }

        let tmp = self.tmp_path();
        if let Err(e) = write_synced(&tmp, &buf) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::io("cannot write", &tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::io("cannot replace", &self.path, e));
        }
        tracing::debug!(
            "saved {} baseline entries to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Delete the stored snapshot. Returns `true` if a file was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn reset(&self) -> Result<bool, StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("removed baseline {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io("cannot remove", &self.path, e)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Write `bytes` to `path` and flush them to disk before returning, so a
/// rename that follows never exposes a file whose contents were lost.
fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
