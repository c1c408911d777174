use std::{fs, os::unix::fs::PermissionsExt, path::Path, sync::Mutex};

use tgsm_device::DeviceHandle;
use tgsm_session::{ops, EnvironmentError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn install_fake_tool(dir: &Path, name: &str, env_var: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    std::env::set_var(env_var, &path);
}

#[tokio::test]
async fn unreachable_device_surfaces_as_device_unreachable() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    // No container runtime, so the chain assumes an external environment
    // and moves on to the device link, where both connect attempts fail.
    std::env::set_var("TGSM_DOCKER_PATH", "/nonexistent/tgsm-test-docker");
    install_fake_tool(
        dir.path(),
        "adb",
        "TGSM_ADB_PATH",
        r#"#!/bin/sh
if [ "$1" = "connect" ]; then
  echo "cannot connect to $2: Connection refused"
fi
exit 0
"#,
    );

    let handle = DeviceHandle::new("10.99.0.7:5555");
    let result = ops::startup(&handle).await;
    assert!(matches!(result, Err(EnvironmentError::DeviceUnreachable)));
}

#[tokio::test]
async fn container_launch_failure_surfaces_as_bootstrap_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    // Runtime answers --version but every other invocation fails, so the
    // chain stops before ever touching adb.
    install_fake_tool(
        dir.path(),
        "docker",
        "TGSM_DOCKER_PATH",
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo "Docker version 24.0"; exit 0; fi
echo "no such image" >&2
exit 1
"#,
    );

    let handle = DeviceHandle::new("10.99.0.7:5555");
    let result = ops::startup(&handle).await;
    match result {
        Err(EnvironmentError::Bootstrap(detail)) => {
            assert!(detail.contains("failed to launch android container"));
        }
        other => panic!("expected bootstrap error, got {other:?}"),
    }
}
