//! Check-and-install logic for the launcher link.

use crate::config::{ExistingEntryPolicy, InstallerConfig};
use crate::creator::{LinkRequest, PrivilegedLinkCreator};
use crate::error::{InstallError, Result};
use crate::platform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What currently sits at the link path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkStatus {
    /// Nothing at the link path.
    Missing,
    /// Symlink pointing exactly at the executable.
    Installed,
    /// Symlink pointing somewhere else.
    LinkedElsewhere { target: PathBuf },
    /// Symlink naming the executable, but the executable does not exist.
    Dangling { target: PathBuf },
    /// A regular file or directory.
    NotSymlink,
    /// The entry could not be inspected.
    Unreadable { reason: String },
}

impl LinkStatus {
    /// Inspect `link` and compare its target against `executable`.
    ///
    /// The target is compared as written by `readlink`, not canonicalized, and
    /// must also resolve to an existing entry.
    pub fn probe(link: &Path, executable: &Path) -> Self {
        let metadata = match fs::symlink_metadata(link) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LinkStatus::Missing,
            Err(e) => {
                return LinkStatus::Unreadable {
                    reason: e.to_string(),
                }
            }
        };

        if !metadata.file_type().is_symlink() {
            return LinkStatus::NotSymlink;
        }

        let target = match fs::read_link(link) {
            Ok(target) => target,
            Err(e) => {
                return LinkStatus::Unreadable {
                    reason: e.to_string(),
                }
            }
        };
        if target != executable {
            return LinkStatus::LinkedElsewhere { target };
        }

        match fs::metadata(link) {
            Ok(_) => LinkStatus::Installed,
            Err(e) if e.kind() == io::ErrorKind::NotFound => LinkStatus::Dangling { target },
            Err(e) => LinkStatus::Unreadable {
                reason: e.to_string(),
            },
        }
    }

    pub fn is_installed(&self) -> bool {
        matches!(self, LinkStatus::Installed)
    }
}

/// Installs the public command-line link for the application executable.
#[derive(Clone)]
pub struct LauncherLinkInstaller {
    config: InstallerConfig,
    creator: Arc<dyn PrivilegedLinkCreator>,
}

impl std::fmt::Debug for LauncherLinkInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LauncherLinkInstaller")
            .field("config", &self.config)
            .field("creator", &self.creator.name())
            .finish()
    }
}

impl LauncherLinkInstaller {
    /// Create an installer with an explicit link creator.
    pub fn new(config: InstallerConfig, creator: Arc<dyn PrivilegedLinkCreator>) -> Self {
        Self { config, creator }
    }

    /// Create an installer using the elevation helper of the current platform.
    pub fn for_current_platform(config: InstallerConfig) -> Self {
        Self::new(config, platform::default_link_creator())
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn executable_path(&self) -> &Path {
        &self.config.executable_path
    }

    pub fn link_path(&self) -> &Path {
        &self.config.link_path
    }

    /// Name of the link creator in use.
    pub fn creator_name(&self) -> &'static str {
        self.creator.name()
    }

    /// Report what currently sits at the link path.
    pub fn status(&self) -> LinkStatus {
        let status = LinkStatus::probe(&self.config.link_path, &self.config.executable_path);
        debug!("Link status for {}: {:?}", self.config.link_path.display(), status);
        status
    }

    /// True only if the link path is a symlink to the executable.
    ///
    /// Filesystem errors count as "not installed".
    pub fn is_installed(&self) -> bool {
        self.status().is_installed()
    }

    /// Point the link path at the executable, replacing whatever is there.
    ///
    /// Blocks the calling task until the elevation prompt is answered and the
    /// link command finishes. Safe to call repeatedly.
    ///
    /// # Errors
    /// - [`InstallError::PermissionDenied`] if the user declines elevation
    /// - [`InstallError::CommandFailed`] if the link command fails
    /// - [`InstallError::Occupied`] if a non-symlink entry is present and the
    ///   policy is [`ExistingEntryPolicy::Refuse`]
    pub async fn install(&self) -> Result<()> {
        let before = self.status();

        if self.config.existing_entry == ExistingEntryPolicy::Refuse
            && before == LinkStatus::NotSymlink
        {
            warn!(
                "Refusing to replace non-symlink entry at {}",
                self.config.link_path.display()
            );
            return Err(InstallError::Occupied(self.config.link_path.clone()));
        }

        info!(
            "Installing {} -> {} via {} (was {:?})",
            self.config.link_path.display(),
            self.config.executable_path.display(),
            self.creator.name(),
            before
        );

        let request = LinkRequest::new(
            self.config.executable_path.clone(),
            self.config.link_path.clone(),
        );
        self.creator.create_link(&request).await?;

        let after = self.status();
        if !after.is_installed() {
            warn!(
                "Link command succeeded but {} is {:?}",
                self.config.link_path.display(),
                after
            );
        }
        Ok(())
    }
}
