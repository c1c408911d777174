use std::{fs, io, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("auth_key is not a valid non-empty hex string")]
    InvalidAuthKey,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Durable record of an extracted identity's authentication metadata. One
/// JSON artifact per phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub phone: String,
    pub user_id: i64,
    pub username: Option<String>,
    pub dc_id: Option<i32>,
    pub auth_key: Option<String>,
    pub extracted_at: String,
}

impl CredentialRecord {
    /// auth_key, when present, must be a valid hex encoding of a non-empty
    /// byte string.
    pub fn auth_key_bytes(&self) -> Option<Vec<u8>> {
        let key = self.auth_key.as_deref()?;
        match hex::decode(key) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            _ => None,
        }
    }

    fn auth_key_is_valid(&self) -> bool {
        match self.auth_key.as_deref() {
            None => true,
            Some(_) => self.auth_key_bytes().is_some(),
        }
    }
}

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn open_default() -> Self {
        Self::new(tgsm_util::sessions_dir())
    }

    pub fn record_path(&self, phone: &str) -> PathBuf {
        self.dir.join(format!("{phone}.json"))
    }

    pub fn session_path(&self, phone: &str) -> PathBuf {
        self.dir.join(format!("{phone}.session"))
    }

    pub fn tgnet_path(&self, phone: &str) -> PathBuf {
        self.dir.join(format!("tgnet_{phone}.dat"))
    }

    pub fn userconfig_path(&self, phone: &str) -> PathBuf {
        self.dir.join(format!("userconfing_{phone}.xml"))
    }

    pub fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        if !record.auth_key_is_valid() {
            return Err(StoreError::InvalidAuthKey);
        }
        tgsm_util::write_json_atomic(&self.record_path(&record.phone), record)?;
        Ok(())
    }

    pub fn load(&self, phone: &str) -> Option<CredentialRecord> {
        let path = self.record_path(phone);
        let data = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<CredentialRecord>(&data) {
            Ok(record) if record.auth_key_is_valid() => Some(record),
            Ok(_) => {
                warn!("{}: auth_key fails hex invariant, ignoring record", path.display());
                None
            }
            Err(err) => {
                warn!("Failed to parse {}: {}", path.display(), err);
                None
            }
        }
    }

    /// All readable records; unreadable entries are skipped with a warning.
    pub fn list(&self) -> Vec<CredentialRecord> {
        let mut records = Vec::new();
        for name in self.artifact_names() {
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            if let Some(record) = self.load(stem) {
                records.push(record);
            }
        }
        records
    }

    pub fn record_stems(&self) -> Vec<String> {
        self.stems_with_suffix(".json")
    }

    pub fn session_file_stems(&self) -> Vec<String> {
        self.stems_with_suffix(".session")
    }

    /// Remove every tracked artifact: JSON records, native session files,
    /// and leftover transient raw files. Returns the number actually
    /// removed.
    pub fn purge_all(&self) -> usize {
        let mut deleted = 0;
        for name in self.artifact_names() {
            if !is_tracked_artifact(&name) {
                continue;
            }
            let path = self.dir.join(&name);
            match fs::remove_file(&path) {
                Ok(()) => {
                    deleted += 1;
                    tracing::info!("deleted {}", path.display());
                }
                Err(err) => warn!("Failed to delete {}: {}", path.display(), err),
            }
        }
        deleted
    }

    fn artifact_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {}", self.dir.display(), err);
                }
                return names;
            }
        };
        for entry in entries.flatten() {
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();
        names
    }

    fn stems_with_suffix(&self, suffix: &str) -> Vec<String> {
        self.artifact_names()
            .into_iter()
            .filter_map(|name| name.strip_suffix(suffix).map(str::to_string))
            .collect()
    }
}

fn is_tracked_artifact(name: &str) -> bool {
    name.ends_with(".json")
        || name.ends_with(".session")
        || (name.starts_with("tgnet_") && name.ends_with(".dat"))
        || (name.starts_with("userconfing_") && name.ends_with(".xml"))
}
