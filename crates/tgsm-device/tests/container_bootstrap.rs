use std::{fs, os::unix::fs::PermissionsExt, path::Path, sync::Mutex};

use tgsm_device::container::{self, BootstrapError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn install_fake_docker(dir: &Path, body: &str) {
    let path = dir.join("docker");
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    std::env::set_var("TGSM_DOCKER_PATH", &path);
}

#[tokio::test]
async fn missing_runtime_assumes_external_environment() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("TGSM_DOCKER_PATH", "/nonexistent/tgsm-test-docker");

    let status = container::ensure_running().await.unwrap();

    assert!(status.running);
    assert_eq!(status.name.as_deref(), Some("android"));
    assert!(status.id.is_none());
    assert!(status.action.is_none());
}

#[tokio::test]
async fn existing_container_is_returned_unchanged() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    install_fake_docker(
        dir.path(),
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo "Docker version 24.0"; exit 0; fi
if [ "$1" = "ps" ]; then
  if [ "$2" = "--filter" ]; then echo "abc123"; else echo "redroid12"; fi
  exit 0
fi
exit 1
"#,
    );

    let status = container::ensure_running().await.unwrap();

    assert!(status.running);
    assert_eq!(status.name.as_deref(), Some("redroid12"));
    assert_eq!(status.id.as_deref(), Some("abc123"));
    assert!(status.action.is_none());
}

#[tokio::test]
async fn launch_failure_with_runtime_available_is_fatal() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    // Runtime present, no container running, and the launch itself fails.
    install_fake_docker(
        dir.path(),
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo "Docker version 24.0"; exit 0; fi
echo "no such image" >&2
exit 1
"#,
    );

    let result = container::ensure_running().await;
    assert!(matches!(result, Err(BootstrapError::LaunchFailed(_))));
}
