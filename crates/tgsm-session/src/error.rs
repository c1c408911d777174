use thiserror::Error;

/// Startup-chain failures. Fatal to the chain; the service degrades and
/// individual operations then fail with their own typed errors.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("android device is not reachable")]
    DeviceUnreachable,
    #[error("container bootstrap failed: {0}")]
    Bootstrap(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("telegram is not authorized on the device")]
    Unauthenticated,
    #[error("session converter unavailable: {0}")]
    ConverterUnavailable(String),
    #[error("converter failed: {0}")]
    ConvertFailed(String),
    #[error("failed to retrieve {0} from device")]
    RetrieveFailed(String),
    #[error("failed to open session container: {0}")]
    StorageRead(#[from] rusqlite::Error),
    #[error("failed to persist credential record: {0}")]
    Store(#[from] crate::store::StoreError),
}

#[derive(Debug, Error)]
pub enum ReauthError {
    #[error("no saved session for {0}")]
    MissingRecord(String),
    #[error("credential record has no usable auth key")]
    BadAuthKey,
    #[error("failed to write session file: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("messaging client unavailable: {0}")]
    ClientUnavailable(String),
    #[error("session is not authorized")]
    NotAuthorized,
    #[error("authorization check failed: {0}")]
    ClientRejected(String),
}
