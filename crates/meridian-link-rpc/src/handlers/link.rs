//! Launcher link handlers.

use super::{get_bool_param, RpcError};
use crate::server::AppState;
use serde_json::{json, Value};
use tracing::info;

pub fn get_link_status(state: &AppState, _params: &Value) -> Value {
    let installer = &state.installer;
    json!({
        "name": installer.config().name,
        "executable_path": installer.executable_path(),
        "link_path": installer.link_path(),
        "creator": installer.creator_name(),
        "status": installer.status(),
    })
}

pub fn is_link_installed(state: &AppState, _params: &Value) -> Value {
    json!(state.installer.is_installed())
}

/// Install the link.
///
/// Skips the elevation prompt when the link is already correct unless
/// `force_install` is set.
pub async fn install_link(state: &AppState, params: &Value) -> Result<Value, RpcError> {
    let force = get_bool_param(params, "force_install", "forceInstall").unwrap_or(false);
    let installer = &state.installer;

    if !force && installer.is_installed() {
        info!("{} already installed, skipping", installer.link_path().display());
        return Ok(json!({ "changed": false, "status": installer.status() }));
    }

    installer.install().await?;
    Ok(json!({ "changed": true, "status": installer.status() }))
}
