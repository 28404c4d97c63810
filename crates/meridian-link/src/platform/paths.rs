//! Platform-specific bin directories.

use crate::config::LinkConfig;
use crate::error::{InstallError, Result};
use std::path::PathBuf;

/// Well-known system-wide directory for command-line entry points.
pub fn system_bin_dir() -> PathBuf {
    PathBuf::from(LinkConfig::SYSTEM_BIN_DIR)
}

/// Per-user bin directory.
///
/// # Platform Behavior
/// Uses the `dirs` crate for the home directory, then `~/.local/bin`
/// (the XDG convention, also on `PATH` for most macOS shells set up by
/// developer tooling).
pub fn user_bin_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| InstallError::Config {
        message: "Could not determine home directory".to_string(),
    })?;
    Ok(home.join(LinkConfig::USER_BIN_DIR))
}
