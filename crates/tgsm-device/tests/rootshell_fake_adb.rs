use std::{fs, os::unix::fs::PermissionsExt, sync::Mutex};

use tgsm_device::{rootshell, DeviceHandle};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn install_fake_adb(dir: &std::path::Path, body: &str) {
    let path = dir.join("adb");
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    std::env::set_var("TGSM_ADB_PATH", &path);
}

#[tokio::test]
async fn batch_collects_output_and_succeeds() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    install_fake_adb(
        dir.path(),
        r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    su) echo "device:/ #" ;;
    exit) exit 0 ;;
    *) echo "ran: $line"; echo "" ;;
  esac
done
"#,
    );

    let handle = DeviceHandle::new("localhost:5555");
    let (ok, output) = rootshell::run_root_batch(&handle, &["ls /data", "id"]).await;

    assert!(ok);
    assert!(output.contains("ran: ls /data"));
    assert!(output.contains("ran: id"));
}

#[tokio::test]
async fn silent_shell_still_completes_and_is_reaped() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    // Swallows everything: escalation is unconfirmed, every command hits
    // the quiescence timeout, exit is ignored and the child must be killed.
    install_fake_adb(
        dir.path(),
        r#"#!/bin/sh
while IFS= read -r line; do :; done
sleep 60
"#,
    );

    let handle = DeviceHandle::new("localhost:5555");
    let (ok, output) = rootshell::run_root_batch(&handle, &["whoami"]).await;

    assert!(ok);
    assert!(output.is_empty());
}

#[tokio::test]
async fn missing_adb_binary_reports_failure() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("TGSM_ADB_PATH", "/nonexistent/tgsm-test-adb");

    let handle = DeviceHandle::new("localhost:5555");
    let (ok, output) = rootshell::run_root_batch(&handle, &["id"]).await;

    assert!(!ok);
    assert!(output.is_empty());
}
