//! polkit prompt via `pkexec` for Linux desktops.

use super::{command_failed, link_script, run_to_completion, LinkRequest, PrivilegedLinkCreator};
use crate::config::LinkConfig;
use crate::error::{InstallError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{info, warn};

/// Runs the link script as root through `pkexec /bin/sh -c`.
#[derive(Debug, Clone)]
pub struct PkexecLinkCreator {
    pkexec: PathBuf,
    shell: PathBuf,
}

impl Default for PkexecLinkCreator {
    fn default() -> Self {
        Self {
            pkexec: PathBuf::from(LinkConfig::PKEXEC_PATH),
            shell: PathBuf::from(LinkConfig::SHELL_PATH),
        }
    }
}

impl PkexecLinkCreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different elevation helper and shell.
    pub fn with_programs(pkexec: impl Into<PathBuf>, shell: impl Into<PathBuf>) -> Self {
        Self {
            pkexec: pkexec.into(),
            shell: shell.into(),
        }
    }

    /// Shell script passed to `sh -c`.
    pub fn script(request: &LinkRequest) -> Result<String> {
        // GNU ln: -n keeps an existing symlink-to-directory from being followed.
        link_script(request, "-s -f -n")
    }

    fn command(&self, request: &LinkRequest) -> Result<Command> {
        let mut command = Command::new(&self.pkexec);
        command
            .arg(&self.shell)
            .arg("-c")
            .arg(Self::script(request)?);
        Ok(command)
    }
}

#[async_trait]
impl PrivilegedLinkCreator for PkexecLinkCreator {
    fn name(&self) -> &'static str {
        "pkexec"
    }

    async fn create_link(&self, request: &LinkRequest) -> Result<()> {
        let output = run_to_completion(self.command(request)?, self.name()).await?;

        match output.status.code() {
            Some(0) => {
                info!("Linked {} -> {}", request.link.display(), request.target.display());
                Ok(())
            }
            Some(code) if is_authorization_refusal(code, &output.stderr) => {
                warn!("Authorization refused for {}", request.link.display());
                Err(InstallError::PermissionDenied {
                    link: request.link.clone(),
                })
            }
            _ => Err(command_failed(self.name(), &output)),
        }
    }
}

/// Exit codes 126 and 127 are shared with `sh`; only the polkit message
/// marks them as a refused prompt.
fn is_authorization_refusal(code: i32, stderr: &[u8]) -> bool {
    if code != LinkConfig::PKEXEC_DISMISSED && code != LinkConfig::PKEXEC_NOT_AUTHORIZED {
        return false;
    }
    let stderr = String::from_utf8_lossy(stderr);
    LinkConfig::PKEXEC_REFUSAL_MESSAGES
        .iter()
        .any(|message| stderr.contains(message))
}
