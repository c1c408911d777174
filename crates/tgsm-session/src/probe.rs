use tgsm_device::{config, rootshell, DeviceHandle};
use tracing::info;

/// First run of digits found anywhere in the output, if any.
pub fn parse_row_count(output: &str) -> Option<u64> {
    let start = output.find(|c: char| c.is_ascii_digit())?;
    let digits: String = output[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Whether the on-device app holds an active session: counts rows in the
/// identity table of the app's local database. Any shell failure, empty
/// output, or parse failure yields false.
pub async fn is_authorized(handle: &DeviceHandle) -> bool {
    let query = format!(
        "sqlite3 {} \"SELECT COUNT(*) FROM users;\"",
        config::REMOTE_CACHE_DB_PATH
    );
    let (ok, output) = rootshell::run_root_batch(handle, &[query.as_str()]).await;
    if !ok || output.is_empty() {
        info!("authorization probe: no output from device");
        return false;
    }

    match parse_row_count(&output) {
        Some(count) if count > 0 => {
            info!("device is authorized ({count} identity rows)");
            true
        }
        _ => {
            info!("device is not authorized");
            false
        }
    }
}
