use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use crate::{
    capability::{ClientError, Identity, MessagingClient},
    error::ReauthError,
    store::{CredentialRecord, SessionStore},
};

const SERVER_BASE_OCTETS: &str = "149.154.167";
pub const SERVER_PORT: u16 = 443;

/// Data-center address synthesis on the fixed production network.
pub fn server_address(dc_id: i32) -> String {
    format!("{SERVER_BASE_OCTETS}.{}", 50 + (dc_id - 1) * 41)
}

/// Rebuild a native session file purely from a persisted credential
/// record, without touching the device. Requires a dc id and a valid
/// non-empty auth key.
pub fn reconstruct(record: &CredentialRecord, session_out: &Path) -> Result<(), ReauthError> {
    let Some(dc_id) = record.dc_id else {
        return Err(ReauthError::BadAuthKey);
    };
    let Some(auth_key) = record.auth_key_bytes() else {
        return Err(ReauthError::BadAuthKey);
    };

    let address = server_address(dc_id);
    let conn = Connection::open(session_out)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (dc_id INTEGER, server_address TEXT, port INTEGER, auth_key BLOB, takeout_id INTEGER);
         CREATE TABLE IF NOT EXISTS entities (id INTEGER, hash INTEGER, username TEXT, phone TEXT, name TEXT);
         DELETE FROM sessions;",
    )?;
    conn.execute(
        "INSERT INTO sessions (dc_id, server_address, port, auth_key, takeout_id) VALUES (?1, ?2, ?3, ?4, NULL)",
        rusqlite::params![dc_id, address, SERVER_PORT, auth_key],
    )?;
    if record.user_id > 0 {
        conn.execute(
            "INSERT INTO entities (id, hash, username, phone) VALUES (?1, 0, ?2, ?3)",
            rusqlite::params![record.user_id, record.username, record.phone],
        )?;
    }

    info!(
        "session file rebuilt for {} (dc={dc_id}, {address}:{SERVER_PORT})",
        record.phone
    );
    Ok(())
}

/// Reauthorization flow: rebuild the native session from the stored record
/// if it is absent, then run a live connect and identity check.
pub async fn reauthorize(
    store: &SessionStore,
    client: &dyn MessagingClient,
    phone: &str,
    api_id: i32,
    api_hash: &str,
) -> Result<Identity, ReauthError> {
    let session_path = store.session_path(phone);

    if !session_path.exists() {
        let record = store
            .load(phone)
            .ok_or_else(|| ReauthError::MissingRecord(phone.to_string()))?;
        reconstruct(&record, &session_path)?;
    }

    match client.check(&session_path, api_id, api_hash).await {
        Ok(identity) => {
            info!(
                "reauthorized {phone} as user_id={} (@{})",
                identity.user_id,
                identity.username.as_deref().unwrap_or("")
            );
            Ok(identity)
        }
        Err(ClientError::Unavailable(detail)) => Err(ReauthError::ClientUnavailable(detail)),
        Err(ClientError::NotAuthorized) => Err(ReauthError::NotAuthorized),
        Err(ClientError::Rejected(detail)) => Err(ReauthError::ClientRejected(detail)),
    }
}
