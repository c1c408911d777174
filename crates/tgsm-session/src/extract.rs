use std::{fs, path::Path};

use rusqlite::{Connection, OptionalExtension};
use tgsm_device::{config, pull, DeviceHandle};
use tracing::{info, warn};

use crate::{
    capability::{ConvertError, SessionConverter},
    error::ExtractError,
    probe,
    store::{CredentialRecord, SessionStore},
};

pub(crate) struct ContainerData {
    pub dc_id: Option<i32>,
    pub auth_key: Option<Vec<u8>>,
    pub user: Option<(i64, Option<String>)>,
}

/// Read the portable session container: primary dc and raw auth key from
/// the first sessions row, plus the first linked identity with a positive
/// id. Missing rows leave fields empty rather than failing the pipeline.
pub(crate) fn read_session_container(path: &Path) -> Result<ContainerData, rusqlite::Error> {
    let conn = Connection::open(path)?;

    let session_row = conn
        .query_row("SELECT dc_id, auth_key FROM sessions", [], |row| {
            Ok((row.get::<_, i32>(0)?, row.get::<_, Option<Vec<u8>>>(1)?))
        })
        .optional();
    let (dc_id, auth_key) = match session_row {
        Ok(Some((dc_id, auth_key))) => (Some(dc_id), auth_key.filter(|k| !k.is_empty())),
        Ok(None) => (None, None),
        Err(err) => {
            warn!("sessions table unreadable: {err}");
            (None, None)
        }
    };

    let user_row = conn
        .query_row(
            "SELECT id, username FROM entities WHERE id > 0 LIMIT 1",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?)),
        )
        .optional();
    let user = match user_row {
        Ok(user) => user,
        Err(err) => {
            warn!("entities table unreadable: {err}");
            None
        }
    };

    Ok(ContainerData {
        dc_id,
        auth_key,
        user,
    })
}

async fn run_pipeline(
    handle: &DeviceHandle,
    store: &SessionStore,
    converter: &dyn SessionConverter,
    phone: &str,
    tgnet: &Path,
    userconfig: &Path,
) -> Result<CredentialRecord, ExtractError> {
    if !pull::pull_file(handle, config::REMOTE_TGNET_PATH, tgnet).await {
        return Err(ExtractError::RetrieveFailed("tgnet.dat".into()));
    }
    if !pull::pull_file(handle, config::REMOTE_USERCONFIG_PATH, userconfig).await {
        return Err(ExtractError::RetrieveFailed("userconfing.xml".into()));
    }

    let session_path = store.session_path(phone);
    converter
        .convert(tgnet, userconfig, &session_path)
        .await
        .map_err(|err| match err {
            ConvertError::Unavailable(detail) => ExtractError::ConverterUnavailable(detail),
            ConvertError::Failed(detail) => ExtractError::ConvertFailed(detail),
        })?;
    info!("portable session written to {}", session_path.display());

    let data = read_session_container(&session_path)?;
    let (user_id, username) = data.user.unwrap_or((0, None));

    let record = CredentialRecord {
        phone: phone.to_string(),
        user_id,
        username,
        dc_id: data.dc_id,
        auth_key: data.auth_key.map(hex::encode),
        extracted_at: tgsm_util::now_iso8601(),
    };
    store.save(&record)?;
    info!(
        "credential record saved for {phone} (dc={:?}, user_id={user_id})",
        record.dc_id
    );
    Ok(record)
}

/// Full extraction pipeline: authorization precondition, staged retrieval
/// of the two protected files, external conversion, container read, record
/// persistence. Nothing is persisted before the final step.
pub async fn extract(
    handle: &DeviceHandle,
    store: &SessionStore,
    converter: &dyn SessionConverter,
    phone: &str,
) -> Result<CredentialRecord, ExtractError> {
    if !probe::is_authorized(handle).await {
        return Err(ExtractError::Unauthenticated);
    }

    let tgnet = store.tgnet_path(phone);
    let userconfig = store.userconfig_path(phone);

    let result = run_pipeline(handle, store, converter, phone, &tgnet, &userconfig).await;

    // The raw retrieved files hold key material; remove them on success
    // and failure alike.
    let _ = fs::remove_file(&tgnet);
    let _ = fs::remove_file(&userconfig);

    result
}
