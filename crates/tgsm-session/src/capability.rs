use std::{path::Path, process::Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::warn;

use tgsm_util::env_trimmed;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("converter unavailable: {0}")]
    Unavailable(String),
    #[error("converter failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client unavailable: {0}")]
    Unavailable(String),
    #[error("session is not authorized")]
    NotAuthorized,
    #[error("{0}")]
    Rejected(String),
}

/// Converts the two native device files into a portable session container
/// in the messaging-client library's on-disk format.
#[async_trait]
pub trait SessionConverter: Send + Sync {
    async fn convert(
        &self,
        tgnet: &Path,
        userconfig: &Path,
        session_out: &Path,
    ) -> Result<(), ConvertError>;
}

/// Connects with a portable session, checks authorization, and fetches the
/// session's own identity. One fresh connection per call, torn down before
/// returning.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn check(
        &self,
        session: &Path,
        api_id: i32,
        api_hash: &str,
    ) -> Result<Identity, ClientError>;
}

/// Shells out to an operator-configured converter command. Availability is
/// checked at first use, not at startup.
pub struct ExternalConverter {
    cmd: Option<String>,
}

impl ExternalConverter {
    pub fn from_env() -> Self {
        Self {
            cmd: env_trimmed("TGSM_CONVERTER_CMD"),
        }
    }
}

#[async_trait]
impl SessionConverter for ExternalConverter {
    async fn convert(
        &self,
        tgnet: &Path,
        userconfig: &Path,
        session_out: &Path,
    ) -> Result<(), ConvertError> {
        let cmd = self
            .cmd
            .as_deref()
            .ok_or_else(|| ConvertError::Unavailable("TGSM_CONVERTER_CMD is not set".into()))?;

        let output = Command::new(cmd)
            .arg(tgnet)
            .arg(userconfig)
            .arg(session_out)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::Unavailable(format!("{cmd} not found"))
                } else {
                    ConvertError::Failed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ConvertError::Failed(format!(
                "exit {}: {stderr}",
                output.status.code().unwrap_or(-1)
            )));
        }
        if !session_out.exists() {
            return Err(ConvertError::Failed(
                "converter reported success but wrote no session file".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ClientReply {
    authorized: bool,
    #[serde(default)]
    user_id: i64,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

/// Shells out to an operator-configured client command that connects with
/// the given session and prints a JSON authorization report.
pub struct ExternalClient {
    cmd: Option<String>,
}

impl ExternalClient {
    pub fn from_env() -> Self {
        Self {
            cmd: env_trimmed("TGSM_CLIENT_CMD"),
        }
    }
}

#[async_trait]
impl MessagingClient for ExternalClient {
    async fn check(
        &self,
        session: &Path,
        api_id: i32,
        api_hash: &str,
    ) -> Result<Identity, ClientError> {
        let cmd = self
            .cmd
            .as_deref()
            .ok_or_else(|| ClientError::Unavailable("TGSM_CLIENT_CMD is not set".into()))?;

        let output = Command::new(cmd)
            .arg("--session")
            .arg(session)
            .arg("--api-id")
            .arg(api_id.to_string())
            .arg("--api-hash")
            .arg(api_hash)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ClientError::Unavailable(format!("{cmd} not found"))
                } else {
                    ClientError::Rejected(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("client command failed: {stderr}");
            return Err(ClientError::Rejected(stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let reply: ClientReply = serde_json::from_str(stdout.trim())
            .map_err(|e| ClientError::Rejected(format!("unparsable client output: {e}")))?;

        if !reply.authorized {
            return Err(ClientError::NotAuthorized);
        }
        Ok(Identity {
            user_id: reply.user_id,
            username: reply.username,
            phone: reply.phone,
        })
    }
}
