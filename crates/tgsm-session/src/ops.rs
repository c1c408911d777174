use serde::Serialize;
use tgsm_device::{adb, app, container, DeviceHandle};
use tracing::info;

use crate::{
    capability::{Identity, MessagingClient, SessionConverter},
    error::{EnvironmentError, ExtractError, ReauthError},
    extract, probe, reconstruct,
    store::{CredentialRecord, SessionStore},
};

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub android_connected: bool,
    pub telegram_installed: bool,
    pub telegram_authorized_on_android: bool,
    pub sessions_count: usize,
    pub sessions: Vec<String>,
    pub session_files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthStartReport {
    pub status: &'static str,
    pub phone: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub phone: String,
    pub user_id: i64,
    pub username: Option<String>,
    pub dc_id: Option<i32>,
    pub extracted_at: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeReport {
    pub deleted_count: usize,
}

/// One-time startup chain: container, device link, app install. Callers
/// log the error and degrade rather than terminating; per-request
/// operations then fail with their own typed errors.
pub async fn startup(handle: &DeviceHandle) -> Result<(), EnvironmentError> {
    let container = container::ensure_running()
        .await
        .map_err(|err| EnvironmentError::Bootstrap(err.to_string()))?;
    if !container.running {
        return Err(EnvironmentError::Bootstrap(
            "android container is not running".into(),
        ));
    }

    if !adb::connect(handle).await {
        return Err(EnvironmentError::DeviceUnreachable);
    }

    tokio::time::sleep(std::time::Duration::from_secs(5)).await;

    if !app::ensure_app_installed(handle).await {
        return Err(EnvironmentError::Bootstrap("telegram install failed".into()));
    }
    Ok(())
}

pub async fn status(
    handle: &DeviceHandle,
    store: &SessionStore,
) -> Result<StatusReport, EnvironmentError> {
    if !adb::device_is_live(handle).await {
        return Err(EnvironmentError::DeviceUnreachable);
    }

    let sessions = store.record_stems();
    Ok(StatusReport {
        android_connected: true,
        telegram_installed: app::app_installed(handle).await,
        telegram_authorized_on_android: probe::is_authorized(handle).await,
        sessions_count: sessions.len(),
        sessions,
        session_files: store.session_file_stems(),
    })
}

/// Clear the on-device app state and launch the app; the login code is
/// then entered manually on the device screen.
pub async fn auth_start(handle: &DeviceHandle, phone: &str) -> AuthStartReport {
    info!("starting manual authorization for {phone}");
    app::clear_app(handle).await;
    app::launch_app(handle).await;
    AuthStartReport {
        status: "waiting_for_code",
        phone: phone.to_string(),
        message: "Telegram launched. Enter the phone number and code on the device screen",
    }
}

pub async fn extract_and_save(
    handle: &DeviceHandle,
    store: &SessionStore,
    converter: &dyn SessionConverter,
    phone: &str,
) -> Result<CredentialRecord, ExtractError> {
    info!("extraction requested for {phone}");
    extract::extract(handle, store, converter, phone).await
}

pub async fn reauthorize(
    store: &SessionStore,
    client: &dyn MessagingClient,
    phone: &str,
    api_id: i32,
    api_hash: &str,
) -> Result<Identity, ReauthError> {
    info!("reauthorization requested for {phone}");
    reconstruct::reauthorize(store, client, phone, api_id, api_hash).await
}

pub fn sessions_list(store: &SessionStore) -> Vec<SessionSummary> {
    store
        .list()
        .into_iter()
        .map(|record| SessionSummary {
            phone: record.phone,
            user_id: record.user_id,
            username: record.username,
            dc_id: record.dc_id,
            extracted_at: record.extracted_at,
        })
        .collect()
}

pub fn sessions_purge(store: &SessionStore) -> PurgeReport {
    let deleted_count = store.purge_all();
    info!("purged {deleted_count} session artifacts");
    PurgeReport { deleted_count }
}
