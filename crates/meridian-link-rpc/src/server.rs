//! HTTP server implementation using Axum.

use crate::handlers::{handle_health, handle_rpc};
use axum::{
    routing::{get, post},
    Router,
};
use meridian_link::LauncherLinkInstaller;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Launcher link installer
    pub installer: LauncherLinkInstaller,
}

/// Build the router for the given state.
pub fn router(state: Arc<AppState>) -> Router {
    // The host's renderer process calls from a file:// or dev-server origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/rpc", post(handle_rpc))
        .layer(cors)
        .with_state(state)
}

/// Start the JSON-RPC HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    installer: LauncherLinkInstaller,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let state = Arc::new(AppState { installer });
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_link::{DirectLinkCreator, InstallerConfig};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_server_starts() {
        let temp_dir = TempDir::new().unwrap();
        let config = InstallerConfig::new(
            "meridian",
            "/opt/meridian/meridian",
            temp_dir.path().join("meridian"),
        )
        .unwrap();
        let installer = LauncherLinkInstaller::new(config, Arc::new(DirectLinkCreator::new()));

        let addr = start_server(installer, "127.0.0.1", 0).await.unwrap();
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_invalid_host_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = InstallerConfig::new(
            "meridian",
            "/opt/meridian/meridian",
            temp_dir.path().join("meridian"),
        )
        .unwrap();
        let installer = LauncherLinkInstaller::new(config, Arc::new(DirectLinkCreator::new()));

        assert!(start_server(installer, "not a host", 0).await.is_err());
    }
}
