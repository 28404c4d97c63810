//! Meridian Link RPC - JSON-RPC sidecar for the desktop app.
//!
//! The desktop app's settings and onboarding screens call this server to
//! check and install the `meridian` command-line link.

mod handlers;
mod server;
mod wrapper;

use anyhow::Result;
use clap::Parser;
use meridian_link::{
    platform, ExistingEntryPolicy, InstallerConfig, LauncherLinkInstaller, LinkConfig, LinkScope,
    RuntimeLayout,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "meridian-link-rpc")]
#[command(about = "JSON-RPC server for the Meridian launcher link")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Command name used for both the bundled executable and the link
    #[arg(long, default_value = LinkConfig::APP_NAME)]
    name: String,

    /// Resources directory of the packaged app (selects the packaged layout)
    #[arg(long, conflicts_with = "working_dir")]
    resources_path: Option<PathBuf>,

    /// Working directory of a development checkout (defaults to the current directory)
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Directory that receives the link (overrides --user-scope)
    #[arg(long)]
    link_dir: Option<PathBuf>,

    /// Link into ~/.local/bin instead of /usr/local/bin
    #[arg(long)]
    user_scope: bool,

    /// Create the link with the current user's permissions
    #[arg(long)]
    no_elevation: bool,

    /// Fail instead of replacing a regular file at the link path
    #[arg(long)]
    refuse_foreign: bool,
}

impl Args {
    fn layout(&self) -> Result<RuntimeLayout> {
        Ok(match (&self.resources_path, &self.working_dir) {
            (Some(resources_dir), _) => RuntimeLayout::Packaged {
                resources_dir: resources_dir.clone(),
            },
            (None, Some(working_dir)) => RuntimeLayout::Development {
                working_dir: working_dir.clone(),
            },
            (None, None) => RuntimeLayout::Development {
                working_dir: std::env::current_dir()?,
            },
        })
    }

    fn installer(&self) -> Result<LauncherLinkInstaller> {
        let scope = if self.user_scope {
            LinkScope::User
        } else {
            LinkScope::System
        };
        let policy = if self.refuse_foreign {
            ExistingEntryPolicy::Refuse
        } else {
            ExistingEntryPolicy::Replace
        };

        let mut builder = InstallerConfig::builder(self.layout()?)
            .name(&self.name)
            .scope(scope)
            .existing_entry(policy);
        if let Some(dir) = &self.link_dir {
            builder = builder.link_dir(dir);
        }
        let config = builder.build()?;

        let creator = if self.no_elevation || !scope.requires_elevation() {
            platform::unprivileged_link_creator()
        } else {
            platform::default_link_creator()
        };
        Ok(LauncherLinkInstaller::new(config, creator))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Meridian Link RPC Server on {}", platform::current_platform());

    let installer = args.installer()?;
    info!(
        "Link {} -> {} via {}",
        installer.link_path().display(),
        installer.executable_path().display(),
        installer.creator_name()
    );

    let addr = server::start_server(installer, &args.host, args.port).await?;

    // Print port for the host app to read (intentional stdout for IPC)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
