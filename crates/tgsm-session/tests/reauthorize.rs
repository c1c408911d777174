use std::path::Path;

use async_trait::async_trait;
use tgsm_session::{
    capability::ClientError, ops, CredentialRecord, Identity, MessagingClient, ReauthError,
    SessionStore,
};

struct MockClient {
    reply: Result<Identity, &'static str>,
}

#[async_trait]
impl MessagingClient for MockClient {
    async fn check(
        &self,
        session: &Path,
        _api_id: i32,
        _api_hash: &str,
    ) -> Result<Identity, ClientError> {
        assert!(session.exists(), "client must receive an existing session file");
        match &self.reply {
            Ok(identity) => Ok(identity.clone()),
            Err("not_authorized") => Err(ClientError::NotAuthorized),
            Err(detail) => Err(ClientError::Rejected(detail.to_string())),
        }
    }
}

fn saved_record(store: &SessionStore, phone: &str, auth_key: Option<&str>) {
    store
        .save(&CredentialRecord {
            phone: phone.into(),
            user_id: 777000,
            username: Some("telegram".into()),
            dc_id: Some(2),
            auth_key: auth_key.map(str::to_string),
            extracted_at: "2026-01-01T00:00:00+00:00".into(),
        })
        .unwrap();
}

#[tokio::test]
async fn reconstructs_from_record_when_session_file_is_absent() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = SessionStore::new(dir.path());
    saved_record(&store, "+71", Some(&"cd".repeat(32)));

    let client = MockClient {
        reply: Ok(Identity {
            user_id: 777000,
            username: Some("telegram".into()),
            phone: Some("+71".into()),
        }),
    };

    let identity = ops::reauthorize(&store, &client, "+71", 12345, "hash")
        .await
        .unwrap();

    assert_eq!(identity.user_id, 777000);
    assert!(store.session_path("+71").exists());
}

#[tokio::test]
async fn missing_record_is_a_precondition_failure() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = SessionStore::new(dir.path());

    let client = MockClient {
        reply: Err("unreachable"),
    };
    let result = ops::reauthorize(&store, &client, "+72", 12345, "hash").await;
    assert!(matches!(result, Err(ReauthError::MissingRecord(_))));
}

#[tokio::test]
async fn record_without_auth_key_is_rejected_before_any_client_call() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = SessionStore::new(dir.path());
    saved_record(&store, "+73", None);

    let client = MockClient {
        reply: Err("must not be called"),
    };
    let result = ops::reauthorize(&store, &client, "+73", 12345, "hash").await;
    assert!(matches!(result, Err(ReauthError::BadAuthKey)));
    assert!(!store.session_path("+73").exists());
}

#[tokio::test]
async fn unauthorized_session_surfaces_as_typed_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = SessionStore::new(dir.path());
    saved_record(&store, "+74", Some(&"ef".repeat(32)));

    let client = MockClient {
        reply: Err("not_authorized"),
    };
    let result = ops::reauthorize(&store, &client, "+74", 12345, "hash").await;
    assert!(matches!(result, Err(ReauthError::NotAuthorized)));
}
