//! Platform abstraction layer.
//!
//! All `#[cfg]` blocks for OS-specific behavior live here so the installer
//! itself stays platform-neutral.
//!
//! # Supported Platforms
//!
//! - **macOS**: administrator prompt through `osascript`
//! - **Linux**: polkit prompt through `pkexec`
//! - **Other**: unprivileged linking only

pub mod paths;

pub use paths::{system_bin_dir, user_bin_dir};

use crate::creator::{DirectLinkCreator, PrivilegedLinkCreator};
use std::sync::Arc;

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}

/// The elevating link creator for this build target.
///
/// Targets without a supported elevation helper get [`DirectLinkCreator`].
pub fn default_link_creator() -> Arc<dyn PrivilegedLinkCreator> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(crate::creator::OsascriptLinkCreator::new())
    }
    #[cfg(target_os = "linux")]
    {
        Arc::new(crate::creator::PkexecLinkCreator::new())
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Arc::new(DirectLinkCreator::new())
    }
}

/// The non-elevating link creator.
pub fn unprivileged_link_creator() -> Arc<dyn PrivilegedLinkCreator> {
    Arc::new(DirectLinkCreator::new())
}
