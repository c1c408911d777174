use std::{
    io,
    process::{Output, Stdio},
    sync::Mutex,
    time::Duration,
};

use tokio::process::Command;
use tracing::{info, warn};

use crate::config;

#[derive(Debug)]
pub enum AdbFailure {
    NotFound,
    Timeout,
    Io(String),
    Exit {
        status: i32,
        stdout: String,
        stderr: String,
    },
}

/// Current device endpoint. One value process-wide by design; operations
/// take the handle by reference so tests can construct isolated ones.
pub struct DeviceHandle {
    addr: Mutex<String>,
}

impl DeviceHandle {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: Mutex::new(addr.into()),
        }
    }

    pub fn addr(&self) -> String {
        self.addr.lock().unwrap().clone()
    }

    pub fn set_addr(&self, addr: impl Into<String>) {
        *self.addr.lock().unwrap() = addr.into();
    }
}

impl Default for DeviceHandle {
    fn default() -> Self {
        Self::new(config::default_device_addr())
    }
}

pub async fn adb_output(args: &[&str], timeout: Duration) -> Result<Output, AdbFailure> {
    let mut cmd = Command::new(config::adb_path());
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AdbFailure::NotFound
            } else {
                AdbFailure::Io(e.to_string())
            }
        })?,
        Err(_) => return Err(AdbFailure::Timeout),
    };

    if output.status.success() {
        Ok(output)
    } else {
        Err(AdbFailure::Exit {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

pub fn format_adb_output(stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim();
    let stderr = stderr.trim();
    let mut out = String::new();

    if !stdout.is_empty() {
        out.push_str("stdout:\n");
        out.push_str(stdout);
        out.push('\n');
    }
    if !stderr.is_empty() {
        out.push_str("stderr:\n");
        out.push_str(stderr);
        out.push('\n');
    }

    out
}

pub fn adb_failure_message(err: &AdbFailure) -> String {
    match err {
        AdbFailure::NotFound => "adb not found (set TGSM_ADB_PATH or ADB_PATH)".into(),
        AdbFailure::Timeout => "adb command timed out".into(),
        AdbFailure::Io(msg) => msg.clone(),
        AdbFailure::Exit {
            status,
            stdout,
            stderr,
        } => {
            let detail = format_adb_output(stdout, stderr);
            if detail.trim().is_empty() {
                format!("adb command failed with exit {status}")
            } else {
                format!("adb command failed with exit {status}: {}", detail.trim())
            }
        }
    }
}

/// Plain adb command against the handle's current device. Mirrors the
/// boolean-plus-text contract every caller parses defensively.
pub async fn adb(handle: &DeviceHandle, args: &[&str]) -> (bool, String) {
    let addr = handle.addr();
    let mut full: Vec<&str> = vec!["-s", addr.as_str()];
    full.extend_from_slice(args);
    match adb_output(&full, config::ADB_COMMAND_TIMEOUT).await {
        Ok(output) => (
            true,
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ),
        Err(err) => (false, adb_failure_message(&err)),
    }
}

pub async fn adb_shell(handle: &DeviceHandle, cmd: &str) -> (bool, String) {
    adb(handle, &["shell", cmd]).await
}

fn connect_reported_success(output: &Output) -> bool {
    // adb connect exits 0 even when it cannot reach the endpoint.
    String::from_utf8_lossy(&output.stdout).contains("connected")
}

async fn try_connect(addr: &str) -> bool {
    match adb_output(&["connect", addr], config::ADB_COMMAND_TIMEOUT).await {
        Ok(output) => connect_reported_success(&output),
        Err(err) => {
            warn!("adb connect {addr}: {}", adb_failure_message(&err));
            false
        }
    }
}

/// Connect to the handle's preferred address, retrying once against the
/// fixed fallback. On fallback success the handle is repointed. No further
/// retries.
pub async fn connect(handle: &DeviceHandle) -> bool {
    let preferred = handle.addr();
    if try_connect(&preferred).await {
        info!("adb connected to {preferred}");
        return true;
    }

    warn!("adb connect to {preferred} failed, trying {}", config::FALLBACK_DEVICE_ADDR);
    if try_connect(config::FALLBACK_DEVICE_ADDR).await {
        handle.set_addr(config::FALLBACK_DEVICE_ADDR);
        info!("adb connected to {}", config::FALLBACK_DEVICE_ADDR);
        return true;
    }

    warn!("adb connection failed on both addresses");
    false
}

/// Liveness check required before any shell session or transfer.
pub async fn device_is_live(handle: &DeviceHandle) -> bool {
    let (ok, output) = adb(handle, &["get-state"]).await;
    ok && output.contains("device")
}
