use std::path::Path;

use tracing::{info, warn};

use crate::{adb, config, container, DeviceHandle};

pub async fn app_installed(handle: &DeviceHandle) -> bool {
    let cmd = format!("pm list packages | grep {}", config::APP_PACKAGE);
    let (_, output) = adb::adb_shell(handle, &cmd).await;
    output.contains(config::APP_PACKAGE)
}

async fn download_apk() -> bool {
    if Path::new(config::APP_APK_CACHE).exists() {
        return true;
    }
    info!("downloading telegram apk");
    let cmd = format!("wget {} -O {}", config::APP_APK_URL, config::APP_APK_CACHE);
    match container::run_shell_command(&cmd).await {
        Ok((true, _, _, _)) => true,
        Ok((false, code, _, stderr)) => {
            warn!("apk download failed (exit {code}): {}", stderr.trim());
            false
        }
        Err(err) => {
            warn!("apk download failed: {err}");
            false
        }
    }
}

async fn adb_install(handle: &DeviceHandle, replace: bool) -> (bool, String) {
    let addr = handle.addr();
    let mut args: Vec<&str> = vec!["-s", addr.as_str(), "install"];
    if replace {
        args.push("-r");
    }
    args.push(config::APP_APK_CACHE);
    match adb::adb_output(&args, config::ADB_INSTALL_TIMEOUT).await {
        Ok(output) => (
            true,
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ),
        Err(err) => (false, adb::adb_failure_message(&err)),
    }
}

pub async fn ensure_app_installed(handle: &DeviceHandle) -> bool {
    if app_installed(handle).await {
        info!("telegram already installed");
        return true;
    }

    if !download_apk().await {
        return false;
    }

    let (ok, detail) = adb_install(handle, false).await;
    if ok {
        info!("telegram installed");
        return true;
    }
    warn!("install failed, retrying with -r: {detail}");

    let (ok, detail) = adb_install(handle, true).await;
    if ok {
        info!("telegram reinstalled");
    } else {
        warn!("reinstall failed: {detail}");
    }
    ok
}

pub async fn clear_app(handle: &DeviceHandle) {
    info!("clearing telegram app state");
    let cmd = format!("pm clear {}", config::APP_PACKAGE);
    adb::adb_shell(handle, &cmd).await;
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
}

pub async fn launch_app(handle: &DeviceHandle) {
    info!("launching telegram");
    let cmd = format!("am start -n {}", config::APP_LAUNCH_ACTIVITY);
    adb::adb_shell(handle, &cmd).await;
}
