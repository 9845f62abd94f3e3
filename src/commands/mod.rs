//! Subcommand handlers.
pub mod check;
pub mod validate;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::Layout;
use crate::logging::Logger;

/// Resolve the data directory: `--root` / `DRIFTCHECK_ROOT`, else the
/// current directory.
///
/// # Errors
///
/// Returns an error if no root was given and the current directory cannot
/// be determined.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(root) = &global.root {
        return Ok(root.clone());
    }
    std::env::current_dir().context("cannot determine the data directory; use --root")
}

/// Load the data-directory layout and apply command-line overrides.
///
/// # Errors
///
/// Returns an error if the root cannot be resolved or `driftcheck.toml`
/// exists but is invalid.
pub fn load_layout(global: &GlobalOpts, log: &Logger) -> Result<Layout> {
    let root = resolve_root(global)?;
    log.debug(&format!("data directory: {}", root.display()));

    let mut layout = Layout::load(&root)?;
    let probe = &mut layout.engine_mut().probe;
    if let Some(backend) = global.backend {
        probe.backend = backend.into();
    }
    if let Some(timeout) = global.timeout {
        probe.timeout_secs = timeout;
    }
    log.debug(&format!(
        "probe backend: {:?}, timeout {}s",
        probe.backend.resolve(),
        probe.timeout_secs
    ));
    Ok(layout)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use crate::probe::BackendKind;

    fn global(root: &std::path::Path) -> GlobalOpts {
        GlobalOpts {
            root: Some(root.to_path_buf()),
            backend: None,
            timeout: None,
        }
    }

    #[test]
    fn resolve_root_uses_explicit_root() {
        let opts = GlobalOpts {
            root: Some(PathBuf::from("/explicit/path")),
            backend: None,
            timeout: None,
        };
        assert_eq!(resolve_root(&opts).unwrap(), PathBuf::from("/explicit/path"));
    }

    #[test]
    fn overrides_replace_engine_config() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("driftcheck.toml"),
            "[probe]\nbackend = \"command\"\ntimeout_secs = 30\n",
        )
        .unwrap();

        let mut opts = global(dir.path());
        let layout = load_layout(&opts, &log).unwrap();
        assert_eq!(layout.engine().probe.backend, BackendKind::Command);
        assert_eq!(layout.engine().probe.timeout_secs, 30);

        opts.backend = Some(crate::cli::BackendArg::Native);
        opts.timeout = Some(2);
        let layout = load_layout(&opts, &log).unwrap();
        assert_eq!(layout.engine().probe.backend, BackendKind::Native);
        assert_eq!(layout.engine().probe.timeout_secs, 2);
    }

    #[test]
    fn invalid_engine_config_is_an_error() {
        let (log, _tmp, _guard) = isolated_logger();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("driftcheck.toml"), "[probe]\nbogus = 1\n").unwrap();
        assert!(load_layout(&global(dir.path()), &log).is_err());
    }
}
