use std::path::Path;

use tracing::{info, warn};

use crate::{adb, config, rootshell, DeviceHandle};

pub fn staged_path(remote: &str) -> String {
    let name = remote.rsplit('/').next().unwrap_or(remote);
    format!("{}/{}", config::STAGING_DIR, name)
}

/// Copy a privilege-protected device file to the host. The file cannot be
/// pulled directly, so it is staged through a world-readable directory:
/// root-copy into staging with relaxed permissions, plain pull, then a
/// best-effort root delete of the staged copy even when the pull failed.
pub async fn pull_file(handle: &DeviceHandle, remote: &str, local: &Path) -> bool {
    info!("retrieving {remote}");

    let mkdir = format!("mkdir -p {}", config::STAGING_DIR);
    let chmod_dir = format!("chmod 777 {}", config::STAGING_DIR);
    rootshell::run_root_batch(handle, &[mkdir.as_str(), chmod_dir.as_str()]).await;

    let staged = staged_path(remote);
    let copy = format!("cp {remote} {staged}");
    let chmod = format!("chmod 644 {staged}");
    let (ok, _) = rootshell::run_root_batch(handle, &[copy.as_str(), chmod.as_str()]).await;
    if !ok {
        warn!("failed to stage {remote}");
        return false;
    }

    tokio::time::sleep(std::time::Duration::from_secs(1)).await;

    let addr = handle.addr();
    let local_str = local.display().to_string();
    let pull_args = [
        "-s",
        addr.as_str(),
        "pull",
        staged.as_str(),
        local_str.as_str(),
    ];
    let pull_result = adb::adb_output(&pull_args, config::ADB_PULL_TIMEOUT).await;

    // Staged copy is world-readable key material; always try to remove it.
    let cleanup = format!("rm {staged}");
    rootshell::run_root_batch(handle, &[cleanup.as_str()]).await;

    match pull_result {
        Ok(_) if local.exists() => {
            let size = std::fs::metadata(local).map(|m| m.len()).unwrap_or(0);
            info!("retrieved {remote} -> {} ({size} bytes)", local.display());
            true
        }
        Ok(_) => {
            warn!("pull reported success but {} is missing", local.display());
            false
        }
        Err(err) => {
            warn!("pull of {staged} failed: {}", adb::adb_failure_message(&err));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_path_uses_file_name_only() {
        assert_eq!(
            staged_path("/data/data/org.telegram.messenger.web/files/tgnet.dat"),
            "/sdcard/telegram_session/tgnet.dat"
        );
        assert_eq!(staged_path("plain.xml"), "/sdcard/telegram_session/plain.xml");
    }
}
