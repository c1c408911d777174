use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;

pub const DEFAULT_SESSIONS_DIR: &str = "./sessions";

pub fn env_trimmed(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

pub fn sessions_dir() -> PathBuf {
    let dir = env_trimmed("TGSM_SESSIONS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSIONS_DIR));
    if let Err(err) = fs::create_dir_all(&dir) {
        tracing::warn!("Failed to create {}: {}", dir.display(), err);
    }
    dir
}

pub fn expand_user(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            let rest = path.strip_prefix("~/").unwrap_or("");
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn now_iso8601() -> String {
    chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
}

pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn write_json_atomic_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let value = Sample {
            name: "a".into(),
            count: 3,
        };
        write_json_atomic(&path, &value).unwrap();
        let data = fs::read_to_string(&path).unwrap();
        assert!(data.contains("\"count\": 3"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn write_json_atomic_replaces_existing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let first = Sample {
            name: "a".into(),
            count: 1,
        };
        let second = Sample {
            name: "b".into(),
            count: 2,
        };
        write_json_atomic(&path, &first).unwrap();
        write_json_atomic(&path, &second).unwrap();
        let data = fs::read_to_string(&path).unwrap();
        assert!(data.contains("\"name\": \"b\""));
    }

    #[test]
    fn now_iso8601_has_offset() {
        let stamp = now_iso8601();
        assert!(stamp.contains('T'));
        assert!(stamp.len() >= 19);
    }

    #[test]
    fn expand_user_passthrough_for_plain_paths() {
        assert_eq!(expand_user("/tmp/x"), PathBuf::from("/tmp/x"));
    }
}
