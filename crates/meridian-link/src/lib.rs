//! Meridian Link - installs the `meridian` command-line launcher.
//!
//! The desktop application ships its CLI executable inside the bundle. This
//! crate checks whether the public link (`/usr/local/bin/meridian` by
//! default) already points at that executable and, if not, creates it through
//! the platform's elevation prompt.
//!
//! # Example
//!
//! ```rust,ignore
//! use meridian_link::{InstallerConfig, LauncherLinkInstaller, RuntimeLayout};
//!
//! #[tokio::main]
//! async fn main() -> meridian_link::Result<()> {
//!     let config = InstallerConfig::builder(RuntimeLayout::Packaged {
//!         resources_dir: "/Applications/Meridian.app/Contents/Resources".into(),
//!     })
//!     .build()?;
//!     let installer = LauncherLinkInstaller::for_current_platform(config);
//!
//!     if !installer.is_installed() {
//!         installer.install().await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod creator;
pub mod error;
pub mod installer;
pub mod platform;

// Re-export commonly used types
pub use config::{
    ExistingEntryPolicy, InstallerConfig, InstallerConfigBuilder, LinkConfig, LinkScope,
    RuntimeLayout,
};
pub use creator::{
    DirectLinkCreator, LinkRequest, OsascriptLinkCreator, PkexecLinkCreator,
    PrivilegedLinkCreator,
};
pub use error::{InstallError, Result};
pub use installer::{LauncherLinkInstaller, LinkStatus};
