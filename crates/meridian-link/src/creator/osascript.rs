//! macOS administrator prompt via `osascript`.

use super::{command_failed, link_script, run_to_completion, LinkRequest, PrivilegedLinkCreator};
use crate::config::LinkConfig;
use crate::error::{InstallError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{info, warn};

/// Runs the link script through `do shell script ... with administrator privileges`.
#[derive(Debug, Clone)]
pub struct OsascriptLinkCreator {
    osascript: PathBuf,
}

impl Default for OsascriptLinkCreator {
    fn default() -> Self {
        Self {
            osascript: PathBuf::from(LinkConfig::OSASCRIPT_PATH),
        }
    }
}

impl OsascriptLinkCreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different `osascript` binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            osascript: program.into(),
        }
    }

    /// The AppleScript source handed to `osascript -e`.
    pub fn applescript(request: &LinkRequest) -> Result<String> {
        // BSD ln: -F replaces an existing directory and implies -f.
        let script = link_script(request, "-F -s")?;
        Ok(format!(
            "do shell script {} with administrator privileges",
            applescript_string(&script)
        ))
    }

    fn command(&self, request: &LinkRequest) -> Result<Command> {
        let mut command = Command::new(&self.osascript);
        command.arg("-e").arg(Self::applescript(request)?);
        Ok(command)
    }
}

#[async_trait]
impl PrivilegedLinkCreator for OsascriptLinkCreator {
    fn name(&self) -> &'static str {
        "osascript"
    }

    async fn create_link(&self, request: &LinkRequest) -> Result<()> {
        let output = run_to_completion(self.command(request)?, self.name()).await?;

        if output.status.success() {
            info!("Linked {} -> {}", request.link.display(), request.target.display());
            return Ok(());
        }

        if is_user_canceled(&String::from_utf8_lossy(&output.stderr)) {
            warn!("Administrator prompt cancelled for {}", request.link.display());
            return Err(InstallError::PermissionDenied {
                link: request.link.clone(),
            });
        }

        Err(command_failed(self.name(), &output))
    }
}

/// Encode `value` as an AppleScript string literal.
fn applescript_string(value: &str) -> String {
    let escaped = value.replace('\\', r"\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// `osascript` reports a cancelled auth dialog as `User canceled. (-128)`.
fn is_user_canceled(stderr: &str) -> bool {
    stderr.contains(&format!("({})", LinkConfig::APPLESCRIPT_USER_CANCELED))
        || stderr.contains("User canceled")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applescript_string_escapes() {
        assert_eq!(applescript_string("plain"), "\"plain\"");
        assert_eq!(applescript_string(r#"a "b" \c"#), r#""a \"b\" \\c""#);
    }

    #[test]
    fn test_applescript_command() {
        let request = LinkRequest::new(
            "/Applications/App.app/Contents/MacOS/app",
            "/usr/local/bin/meridian",
        );
        let script = OsascriptLinkCreator::applescript(&request).unwrap();
        assert_eq!(
            script,
            "do shell script \"mkdir -p '/usr/local/bin' && ln -F -s \
             '/Applications/App.app/Contents/MacOS/app' '/usr/local/bin/meridian'\" \
             with administrator privileges"
        );
    }

    #[test]
    fn test_command_args() {
        let creator = OsascriptLinkCreator::new();
        let request = LinkRequest::new("/opt/app", "/usr/local/bin/meridian");
        let command = creator.command(&request).unwrap();
        let std_cmd = command.as_std();
        assert_eq!(std_cmd.get_program(), LinkConfig::OSASCRIPT_PATH);
        let args: Vec<_> = std_cmd.get_args().collect();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], "-e");
    }

    #[test]
    fn test_user_canceled_detection() {
        assert!(is_user_canceled(
            "0:120: execution error: User canceled. (-128)"
        ));
        assert!(!is_user_canceled(
            "ln: /usr/local/bin/meridian: Read-only file system"
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_command_failure() {
        let creator = OsascriptLinkCreator::with_program("/nonexistent/osascript");
        let request = LinkRequest::new("/opt/app", "/usr/local/bin/meridian");
        let err = creator.create_link(&request).await.unwrap_err();
        assert!(matches!(
            err,
            InstallError::CommandFailed { exit_code: None, .. }
        ));
    }
}
