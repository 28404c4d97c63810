//! Centralized configuration for the launcher link installer.
//!
//! The host application decides whether it runs from a packaged bundle or a
//! development checkout and passes that in as a [`RuntimeLayout`]; nothing in
//! this crate inspects ambient runtime state to find the executable.

use crate::error::{InstallError, Result};
use crate::platform;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Fixed names, paths and exit codes.
pub struct LinkConfig;

impl LinkConfig {
    pub const APP_NAME: &'static str = "meridian";
    pub const SYSTEM_BIN_DIR: &'static str = "/usr/local/bin";
    pub const USER_BIN_DIR: &'static str = ".local/bin";

    // Elevation helpers
    pub const OSASCRIPT_PATH: &'static str = "/usr/bin/osascript";
    pub const PKEXEC_PATH: &'static str = "pkexec";
    pub const SHELL_PATH: &'static str = "/bin/sh";

    /// AppleScript error number raised when the user cancels the auth dialog.
    pub const APPLESCRIPT_USER_CANCELED: i32 = -128;
    /// pkexec exit code when the auth dialog was dismissed.
    pub const PKEXEC_DISMISSED: i32 = 126;
    /// pkexec exit code when the user is not authorized.
    pub const PKEXEC_NOT_AUTHORIZED: i32 = 127;
    /// polkit messages that accompany a refused pkexec prompt.
    pub const PKEXEC_REFUSAL_MESSAGES: &'static [&'static str] =
        &["Not authorized", "Request dismissed"];

    pub const TEMP_LINK_SUFFIX: &'static str = ".link-tmp";
}

/// Where the running application lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RuntimeLayout {
    /// Finalized bundle; the executable sits in the platform resources directory.
    Packaged { resources_dir: PathBuf },
    /// Development checkout; the executable sits next to the working directory.
    Development { working_dir: PathBuf },
}

impl RuntimeLayout {
    /// Absolute path of the application executable named `name`.
    pub fn executable_path(&self, name: &str) -> Result<PathBuf> {
        let path = match self {
            RuntimeLayout::Packaged { resources_dir } => resources_dir.join(name),
            RuntimeLayout::Development { working_dir } => working_dir.join("..").join(name),
        };
        absolutize(&path)
    }

    pub fn is_packaged(&self) -> bool {
        matches!(self, RuntimeLayout::Packaged { .. })
    }
}

/// Which bin directory receives the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkScope {
    /// `/usr/local/bin`, requires elevation.
    #[default]
    System,
    /// `~/.local/bin`, writable by the current user.
    User,
}

impl LinkScope {
    pub fn bin_dir(&self) -> Result<PathBuf> {
        match self {
            LinkScope::System => Ok(platform::system_bin_dir()),
            LinkScope::User => platform::user_bin_dir(),
        }
    }

    pub fn requires_elevation(&self) -> bool {
        matches!(self, LinkScope::System)
    }
}

/// What to do with a non-symlink entry already at the link path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingEntryPolicy {
    /// Force-overwrite whatever is there.
    #[default]
    Replace,
    /// Fail with [`InstallError::Occupied`] unless the entry is a symlink.
    Refuse,
}

/// Resolved installer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInstallerConfig")]
pub struct InstallerConfig {
    /// Name of the command (last component of the link path).
    pub name: String,
    /// Absolute path of the application executable.
    pub executable_path: PathBuf,
    /// Absolute path of the public symlink.
    pub link_path: PathBuf,
    /// Handling of foreign entries at `link_path`.
    pub existing_entry: ExistingEntryPolicy,
}

/// Unvalidated form of [`InstallerConfig`] as read by serde.
#[derive(Deserialize)]
struct RawInstallerConfig {
    name: String,
    executable_path: PathBuf,
    link_path: PathBuf,
    #[serde(default)]
    existing_entry: ExistingEntryPolicy,
}

impl TryFrom<RawInstallerConfig> for InstallerConfig {
    type Error = InstallError;

    fn try_from(raw: RawInstallerConfig) -> Result<Self> {
        let config = InstallerConfig::new(raw.name, raw.executable_path, raw.link_path)?;
        Ok(config.with_existing_entry(raw.existing_entry))
    }
}

impl InstallerConfig {
    /// Start building a configuration for the given runtime layout.
    pub fn builder(layout: RuntimeLayout) -> InstallerConfigBuilder {
        InstallerConfigBuilder::new(layout)
    }

    /// Create a configuration from explicit paths.
    pub fn new(
        name: impl Into<String>,
        executable_path: impl Into<PathBuf>,
        link_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let config = Self {
            name: name.into(),
            executable_path: executable_path.into(),
            link_path: link_path.into(),
            existing_entry: ExistingEntryPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_existing_entry(mut self, policy: ExistingEntryPolicy) -> Self {
        self.existing_entry = policy;
        self
    }

    /// Directory that must exist before the link can be created.
    pub fn link_dir(&self) -> Option<&Path> {
        self.link_path.parent()
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if !self.executable_path.is_absolute() {
            return Err(InstallError::Config {
                message: format!(
                    "Executable path must be absolute: {}",
                    self.executable_path.display()
                ),
            });
        }
        if !self.link_path.is_absolute() {
            return Err(InstallError::Config {
                message: format!("Link path must be absolute: {}", self.link_path.display()),
            });
        }
        if self.link_path.parent().is_none() {
            return Err(InstallError::Config {
                message: "Link path has no parent directory".to_string(),
            });
        }
        if self.link_path.file_name() != Some(OsStr::new(&self.name)) {
            return Err(InstallError::Config {
                message: format!(
                    "Link path {} does not end in {:?}",
                    self.link_path.display(),
                    self.name
                ),
            });
        }
        Ok(())
    }
}

/// Builder for [`InstallerConfig`].
pub struct InstallerConfigBuilder {
    layout: RuntimeLayout,
    name: String,
    scope: LinkScope,
    link_dir: Option<PathBuf>,
    existing_entry: ExistingEntryPolicy,
}

impl InstallerConfigBuilder {
    /// Create a builder with default name `meridian` and system scope.
    pub fn new(layout: RuntimeLayout) -> Self {
        Self {
            layout,
            name: LinkConfig::APP_NAME.to_string(),
            scope: LinkScope::default(),
            link_dir: None,
            existing_entry: ExistingEntryPolicy::default(),
        }
    }

    /// Command name, used for both the executable and the link.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Pick the bin directory by scope.
    ///
    /// Ignored when an explicit directory is set with [`Self::link_dir`].
    pub fn scope(mut self, scope: LinkScope) -> Self {
        self.scope = scope;
        self
    }

    /// Place the link in an explicit directory.
    pub fn link_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.link_dir = Some(dir.into());
        self
    }

    pub fn existing_entry(mut self, policy: ExistingEntryPolicy) -> Self {
        self.existing_entry = policy;
        self
    }

    /// Resolve paths and validate.
    pub fn build(self) -> Result<InstallerConfig> {
        validate_name(&self.name)?;
        let executable_path = self.layout.executable_path(&self.name)?;
        let link_dir = match self.link_dir {
            Some(dir) => absolutize(&dir)?,
            None => self.scope.bin_dir()?,
        };

        let config = InstallerConfig {
            link_path: link_dir.join(&self.name),
            name: self.name,
            executable_path,
            existing_entry: self.existing_entry,
        };
        config.validate()?;
        Ok(config)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(InstallError::Config {
            message: format!("Invalid command name: {:?}", name),
        }),
    }
}

/// Make `path` absolute against the process working directory and drop
/// `.`/`..` components without touching the filesystem.
fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|e| InstallError::Config {
            message: format!("Could not determine working directory: {}", e),
        })?;
        cwd.join(path)
    };
    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root leaves the root in place.
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
