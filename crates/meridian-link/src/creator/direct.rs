//! Unprivileged link creation for user-writable directories.

use super::{LinkRequest, PrivilegedLinkCreator};
use crate::config::LinkConfig;
use crate::error::{InstallError, Result};
use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const NAME: &str = "direct";

/// Writes the link with the current user's permissions.
///
/// The new link is created under a temporary sibling name and renamed over
/// the link path, so readers never observe a missing link mid-replace.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectLinkCreator;

impl DirectLinkCreator {
    pub fn new() -> Self {
        Self
    }

    fn link_now(request: &LinkRequest) -> Result<()> {
        let dir = request.link_dir()?;
        fs::create_dir_all(dir).map_err(|e| InstallError::fs_failed(NAME, e, dir))?;

        let temp = temp_link_path(&request.link)?;
        remove_if_present(&temp)?;
        symlink(&request.target, &temp).map_err(|e| InstallError::fs_failed(NAME, e, &temp))?;

        // rename() cannot replace a directory with a symlink; clear an empty one first.
        if let Ok(meta) = fs::symlink_metadata(&request.link) {
            if meta.is_dir() {
                debug!("Removing empty directory at {}", request.link.display());
                if let Err(e) = fs::remove_dir(&request.link) {
                    let _ = fs::remove_file(&temp);
                    return Err(InstallError::fs_failed(NAME, e, &request.link));
                }
            }
        }

        if let Err(e) = fs::rename(&temp, &request.link) {
            let _ = fs::remove_file(&temp);
            return Err(InstallError::fs_failed(NAME, e, &request.link));
        }
        Ok(())
    }
}

#[async_trait]
impl PrivilegedLinkCreator for DirectLinkCreator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn requires_elevation(&self) -> bool {
        false
    }

    async fn create_link(&self, request: &LinkRequest) -> Result<()> {
        Self::link_now(request)?;
        info!("Linked {} -> {}", request.link.display(), request.target.display());
        Ok(())
    }
}

fn temp_link_path(link: &Path) -> Result<PathBuf> {
    let file_name = link.file_name().ok_or_else(|| InstallError::Config {
        message: format!("Link path has no file name: {}", link.display()),
    })?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(format!("{}.{}", LinkConfig::TEMP_LINK_SUFFIX, std::process::id()));
    Ok(link.with_file_name(temp_name))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallError::fs_failed(NAME, e, path)),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
