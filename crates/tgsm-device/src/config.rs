use std::{path::PathBuf, time::Duration};

use tgsm_util::env_trimmed;

pub const DEFAULT_DEVICE_ADDR: &str = "localhost:5555";
pub const FALLBACK_DEVICE_ADDR: &str = "localhost:5555";

pub const CONTAINER_IMAGE: &str = "redroid/redroid:12.0.0_64only-latest";
pub const CONTAINER_NAME: &str = "redroid12";
pub const CONTAINER_PORT_MAPPING: &str = "5555:5555";
pub const CONTAINER_WARMUP: Duration = Duration::from_secs(30);

pub const APP_PACKAGE: &str = "org.telegram.messenger.web";
pub const APP_LAUNCH_ACTIVITY: &str = "org.telegram.messenger.web/org.telegram.ui.LaunchActivity";
pub const APP_APK_URL: &str = "https://telegram.org/dl/android/apk";
pub const APP_APK_CACHE: &str = "/tmp/telegram.apk";

pub const REMOTE_TGNET_PATH: &str = "/data/data/org.telegram.messenger.web/files/tgnet.dat";
pub const REMOTE_CACHE_DB_PATH: &str = "/data/data/org.telegram.messenger.web/files/cache4.db";
// "userconfing" is the actual on-device filename, misspelling and all.
pub const REMOTE_USERCONFIG_PATH: &str =
    "/data/data/org.telegram.messenger.web/shared_prefs/userconfing.xml";

pub const STAGING_DIR: &str = "/sdcard/telegram_session";

pub const ADB_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
pub const ADB_PULL_TIMEOUT: Duration = Duration::from_secs(30);
pub const ADB_INSTALL_TIMEOUT: Duration = Duration::from_secs(120);

pub const SHELL_PROMPT_POLL: Duration = Duration::from_secs(1);
pub const SHELL_COMMAND_SETTLE: Duration = Duration::from_secs(2);
pub const SHELL_QUIESCENCE_READ: Duration = Duration::from_secs(2);
pub const SHELL_EXIT_WAIT: Duration = Duration::from_secs(5);

pub fn default_device_addr() -> String {
    env_trimmed("TGSM_DEVICE_ADDR").unwrap_or_else(|| DEFAULT_DEVICE_ADDR.to_string())
}

pub fn adb_path() -> PathBuf {
    if let Some(path) = env_trimmed("TGSM_ADB_PATH") {
        return PathBuf::from(path);
    }
    if let Some(path) = env_trimmed("ADB_PATH") {
        return PathBuf::from(path);
    }
    PathBuf::from("adb")
}

pub fn docker_path() -> String {
    env_trimmed("TGSM_DOCKER_PATH").unwrap_or_else(|| "docker".to_string())
}

pub fn container_data_mount() -> String {
    let data_dir = tgsm_util::expand_user("~/data");
    format!("{}:/data", data_dir.display())
}
