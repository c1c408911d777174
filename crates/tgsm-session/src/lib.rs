pub mod capability;
pub mod error;
pub mod extract;
pub mod ops;
pub mod probe;
pub mod reconstruct;
pub mod store;

pub use capability::{ExternalClient, ExternalConverter, Identity, MessagingClient, SessionConverter};
pub use error::{EnvironmentError, ExtractError, ReauthError};
pub use store::{CredentialRecord, SessionStore};
