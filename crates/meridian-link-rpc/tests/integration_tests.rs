//! Integration tests for the meridian-link-rpc JSON-RPC server.
//!
//! These tests spawn the real binary, drive it over HTTP, and install the
//! link into a temporary directory without elevation.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncBufReadExt;

/// Create the packaged bundle under `root` and return its resources directory.
fn bundle(root: &Path) -> PathBuf {
    let resources = root.join("App.app/Contents/MacOS");
    std::fs::create_dir_all(&resources).unwrap();
    std::fs::write(resources.join("app"), "#!/bin/sh\n").unwrap();
    resources
}

/// Make an RPC call and return the full JSON-RPC payload.
async fn rpc_call_raw(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/rpc", port))
        .json(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    response.json::<Value>().await.map_err(|e| e.to_string())
}

/// Make an RPC call to the server.
async fn rpc_call(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let json = rpc_call_raw(port, method, params).await?;
    if let Some(error) = json.get("error") {
        return Err(error.to_string());
    }
    Ok(json.get("result").cloned().unwrap_or(Value::Null))
}

/// Check health endpoint.
async fn check_health(port: u16) -> bool {
    let client = reqwest::Client::new();
    if let Ok(response) = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        if let Ok(json) = response.json::<Value>().await {
            return json.get("status").and_then(|v| v.as_str()) == Some("ok");
        }
    }
    false
}

/// Wait for server to be ready.
async fn wait_for_server(port: u16, timeout_secs: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(timeout_secs) {
        if check_health(port).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

struct RpcServerHandle {
    child: tokio::process::Child,
    port: u16,
    stdout_drain: Option<tokio::task::JoinHandle<()>>,
}

impl RpcServerHandle {
    async fn stop(mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for RpcServerHandle {
    fn drop(&mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.start_kill();
    }
}

/// Start the RPC binary linking into `link_dir` and wait until `/health` is ready.
async fn start_rpc_server(
    resources: &Path,
    link_dir: &Path,
    extra_args: &[&str],
) -> Result<RpcServerHandle, String> {
    let binary = PathBuf::from(env!("CARGO_BIN_EXE_meridian-link-rpc"));

    let mut child = tokio::process::Command::new(&binary)
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg("0")
        .arg("--name")
        .arg("app")
        .arg("--resources-path")
        .arg(resources)
        .arg("--link-dir")
        .arg(link_dir)
        .arg("--no-elevation")
        .args(extra_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("failed to spawn meridian-link-rpc: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture stdout".to_string())?;
    let mut lines = tokio::io::BufReader::new(stdout).lines();

    let mut discovered_port: Option<u16> = None;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(value) = line.strip_prefix("RPC_PORT=") {
                    let parsed = value
                        .trim()
                        .parse::<u16>()
                        .map_err(|e| format!("invalid RPC_PORT value '{value}': {e}"))?;
                    discovered_port = Some(parsed);
                    break;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(format!("failed to read stdout: {err}")),
            Err(_) => continue,
        }
    }

    let port = discovered_port.ok_or_else(|| "RPC_PORT line not emitted".to_string())?;
    if !wait_for_server(port, 15).await {
        return Err(format!("meridian-link-rpc failed health check on port {port}"));
    }

    let stdout_drain =
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

    Ok(RpcServerHandle {
        child,
        port,
        stdout_drain: Some(stdout_drain),
    })
}

#[cfg(unix)]
#[tokio::test]
async fn test_install_flow_over_rpc() {
    let temp = TempDir::new().unwrap();
    let resources = bundle(temp.path());
    let executable = resources.join("app");
    let link_dir = temp.path().join("bin");
    let server = start_rpc_server(&resources, &link_dir, &[]).await.unwrap();
    let port = server.port;

    let installed = rpc_call(port, "is_link_installed", json!({})).await.unwrap();
    assert_eq!(installed, json!(false));

    let status = rpc_call(port, "get_link_status", json!({})).await.unwrap();
    assert_eq!(status["success"], true);
    assert_eq!(status["executable_path"], executable.to_str().unwrap());
    assert_eq!(status["status"]["state"], "missing");

    let result = rpc_call(port, "install_link", json!({})).await.unwrap();
    assert_eq!(result["success"], true);
    assert_eq!(result["changed"], true);
    assert_eq!(result["status"]["state"], "installed");

    assert_eq!(std::fs::read_link(link_dir.join("app")).unwrap(), executable);
    let installed = rpc_call(port, "is_link_installed", json!({})).await.unwrap();
    assert_eq!(installed, json!(true));

    server.stop().await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_retargets_stale_link() {
    let temp = TempDir::new().unwrap();
    let resources = bundle(temp.path());
    let executable = resources.join("app");
    let link_dir = temp.path().join("bin");
    std::fs::create_dir_all(&link_dir).unwrap();
    std::os::unix::fs::symlink("/old/path", link_dir.join("app")).unwrap();

    let server = start_rpc_server(&resources, &link_dir, &[]).await.unwrap();
    let status = rpc_call(server.port, "get_link_status", json!({})).await.unwrap();
    assert_eq!(status["status"]["state"], "linked_elsewhere");
    assert_eq!(status["status"]["target"], "/old/path");

    rpc_call(server.port, "install_link", json!({})).await.unwrap();
    assert_eq!(std::fs::read_link(link_dir.join("app")).unwrap(), executable);

    server.stop().await;
}

#[tokio::test]
async fn test_refuse_foreign_reports_occupied() {
    let temp = TempDir::new().unwrap();
    let resources = bundle(temp.path());
    let link_dir = temp.path().join("bin");
    std::fs::create_dir_all(&link_dir).unwrap();
    std::fs::write(link_dir.join("app"), "someone else's tool").unwrap();

    let server = start_rpc_server(&resources, &link_dir, &["--refuse-foreign"])
        .await
        .unwrap();

    let raw = rpc_call_raw(server.port, "install_link", json!({})).await.unwrap();
    let error = raw.get("error").expect("install should fail");
    assert_eq!(error["code"], -32005);
    assert_eq!(error["data"]["kind"], "occupied");
    assert_eq!(
        std::fs::read_to_string(link_dir.join("app")).unwrap(),
        "someone else's tool"
    );

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let temp = TempDir::new().unwrap();
    let server = start_rpc_server(&bundle(temp.path()), temp.path(), &[])
        .await
        .unwrap();

    let raw = rpc_call_raw(server.port, "not_a_method", json!({})).await.unwrap();
    assert_eq!(raw["error"]["code"], -32601);
    assert_eq!(raw["id"], 1);

    server.stop().await;
}

#[tokio::test]
async fn test_blocked_link_dir_reports_command_failed() {
    let temp = TempDir::new().unwrap();
    let resources = bundle(temp.path());
    let link_dir = temp.path().join("bin");
    std::fs::write(&link_dir, "a file where the bin directory should be").unwrap();

    let server = start_rpc_server(&resources, &link_dir, &[]).await.unwrap();

    let raw = rpc_call_raw(server.port, "install_link", json!({})).await.unwrap();
    assert_eq!(raw["error"]["code"], -32003);
    assert_eq!(raw["error"]["data"]["kind"], "command_failed");

    server.stop().await;
}
