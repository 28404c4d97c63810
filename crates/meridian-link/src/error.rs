//! Error types for the launcher link installer.
//!
//! Status queries never fail outward; only `install()` and configuration
//! construction surface these errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for link installation.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The user declined or cancelled the elevation prompt.
    #[error("Permission denied while linking {link}")]
    PermissionDenied { link: PathBuf },

    /// The link command could not be launched, exited non-zero, or one of its
    /// filesystem steps failed.
    #[error("Command `{command}` failed (exit code {exit_code:?}): {message}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        message: String,
    },

    /// A non-symlink entry occupies the link path and the policy refuses to replace it.
    #[error("Refusing to replace non-symlink entry at {0}")]
    Occupied(PathBuf),

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for installer operations.
pub type Result<T> = std::result::Result<T, InstallError>;

impl InstallError {
    /// Create a command failure for a filesystem step run in-process.
    pub fn fs_failed(command: impl Into<String>, err: std::io::Error, path: &Path) -> Self {
        InstallError::CommandFailed {
            command: command.into(),
            exit_code: None,
            message: format!("{}: {}", path.display(), err),
        }
    }

    /// Create a command failure for a process that never started.
    pub fn launch_failed(command: impl Into<String>, err: std::io::Error) -> Self {
        InstallError::CommandFailed {
            command: command.into(),
            exit_code: None,
            message: format!("failed to launch: {}", err),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32003: Installation failed
    /// - -32004: Cancelled by user
    /// - -32005: Validation error
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            InstallError::CommandFailed { .. } => -32003,
            InstallError::PermissionDenied { .. } => -32004,
            InstallError::Occupied(_) | InstallError::Config { .. } => -32005,
        }
    }

    /// True when the failure came from the user rather than the system.
    pub fn is_user_denial(&self) -> bool {
        matches!(self, InstallError::PermissionDenied { .. })
    }
}
