//! Link creation capability.
//!
//! The installer only decides *whether* a link must be written; a
//! [`PrivilegedLinkCreator`] decides *how*. Each supported platform has one
//! implementation that wraps the link script in its own elevation mechanism:
//!
//! - `osascript` - macOS administrator prompt via AppleScript
//! - `pkexec` - polkit prompt on Linux desktops
//! - `direct` - no elevation, for user-writable bin directories

mod direct;
mod osascript;
mod pkexec;

pub use direct::DirectLinkCreator;
pub use osascript::OsascriptLinkCreator;
pub use pkexec::PkexecLinkCreator;

use crate::error::{InstallError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// A single "point `link` at `target`" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// Executable the link should resolve to.
    pub target: PathBuf,
    /// Public symlink path.
    pub link: PathBuf,
}

impl LinkRequest {
    pub fn new(target: impl Into<PathBuf>, link: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            link: link.into(),
        }
    }

    /// Directory that has to exist before linking.
    pub fn link_dir(&self) -> Result<&Path> {
        self.link.parent().ok_or_else(|| InstallError::Config {
            message: format!("Link path has no parent: {}", self.link.display()),
        })
    }
}

/// Creates (or replaces) a symlink, elevating privileges when needed.
///
/// Implementations must ensure the parent directory exists and must overwrite
/// whatever entry is at `request.link`, so that repeated calls converge.
#[async_trait]
pub trait PrivilegedLinkCreator: Send + Sync {
    /// Short identifier used in logs and status output.
    fn name(&self) -> &'static str;

    /// Whether calling [`Self::create_link`] shows an OS prompt.
    fn requires_elevation(&self) -> bool {
        true
    }

    /// Run the link operation to completion.
    ///
    /// # Errors
    /// - [`InstallError::PermissionDenied`] when the user declines elevation
    /// - [`InstallError::CommandFailed`] for any other failure
    async fn create_link(&self, request: &LinkRequest) -> Result<()>;
}

/// Quote a string for POSIX `sh`.
pub(crate) fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Convert a path for embedding in a script, rejecting non-UTF-8 paths.
pub(crate) fn script_path(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| InstallError::Config {
        message: format!("Path is not valid UTF-8: {}", path.display()),
    })
}

/// `mkdir -p <dir> && ln <flags> <target> <link>` with every path quoted.
pub(crate) fn link_script(request: &LinkRequest, ln_flags: &str) -> Result<String> {
    let dir = script_path(request.link_dir()?)?;
    let target = script_path(&request.target)?;
    let link = script_path(&request.link)?;

    Ok(format!(
        "mkdir -p {} && ln {} {} {}",
        shell_quote(dir),
        ln_flags,
        shell_quote(target),
        shell_quote(link)
    ))
}

/// Spawn `command` and wait for it, mapping launch failures.
pub(crate) async fn run_to_completion(mut command: Command, program: &str) -> Result<Output> {
    debug!("Running {:?}", command.as_std());
    command
        .output()
        .await
        .map_err(|e| InstallError::launch_failed(program, e))
}

/// Build a [`InstallError::CommandFailed`] from a finished process.
pub(crate) fn command_failed(program: &str, output: &Output) -> InstallError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    InstallError::CommandFailed {
        command: program.to_string(),
        exit_code: output.status.code(),
        message: if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr
        },
    }
}
