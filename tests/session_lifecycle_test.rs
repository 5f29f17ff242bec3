//! Integration tests for login, logout and session persistence.
//!
//! The session file is written to a temp directory, so a second client
//! built from the same directory sees what the first one stored.

mod common;

use common::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sessionkit::adapters::FileSessionStorage;
use sessionkit::traits::{SessionStorage, ACCESS_KEY, REFRESH_KEY, USER_KEY};
use sessionkit::{ApiClient, ApiError, AuthError, SessionEvent};

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_json(json!({"username": "ada", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": FRESH_ACCESS,
            "refresh": REFRESH,
            "user": {
                "id": 42,
                "username": "ada",
                "email": "ada@example.com",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "bio": "ignored field",
                "date_joined": "2024-01-01T00:00:00Z"
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_persists_session_across_restarts() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_login(&server).await;

    let client = client_for(&server, FileSessionStorage::in_dir(temp_dir.path())).await;
    let mut events = client.subscribe();

    let identity = client.login("ada", "secret").await.unwrap().unwrap();
    assert_eq!(identity.display_name(), "Ada Lovelace");
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::LoggedIn {
            username: Some("ada".to_string())
        }
    );

    // A new client over the same directory starts signed in
    let restarted = client_for(&server, FileSessionStorage::in_dir(temp_dir.path())).await;
    assert!(restarted.is_authenticated());
    assert_eq!(restarted.credentials().refresh_token.as_deref(), Some(REFRESH));
    assert_eq!(restarted.identity().map(|user| user.id), Some(42));
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials."})))
        .mount(&server)
        .await;

    let client = client_for(&server, MockStorageConfig::new().build()).await;

    let err = client.login("ada", "wrong").await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Auth(AuthError::InvalidCredentials {
            status: 401,
            message: "Invalid credentials.".to_string(),
        })
    );
    assert_eq!(err.user_message(), "Sign in failed. Check your username and password.");
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_then_authenticated_request() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_protected(&server, "GET", "/api/me/", FRESH_ACCESS).await;

    let client = client_for(&server, MockStorageConfig::new().build()).await;
    client.login("ada", "secret").await.unwrap();

    let response = client.get("/me/").await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(client.coordinator().refresh_count(), 0);
}

#[tokio::test]
async fn test_logout_revokes_and_clears_session_file() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSessionStorage::in_dir(temp_dir.path());
    storage.store(ACCESS_KEY, FRESH_ACCESS).await.unwrap();
    storage.store(REFRESH_KEY, REFRESH).await.unwrap();
    storage.store(USER_KEY, r#"{"id": 42, "username": "ada"}"#).await.unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGOUT_PATH))
        .and(header("Authorization", format!("Bearer {}", FRESH_ACCESS).as_str()))
        .and(body_json(json!({ "refresh": REFRESH })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Logged out."})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, storage).await;
    assert_eq!(client.identity().map(|user| user.username), Some("ada".to_string()));
    let mut events = client.subscribe();

    client.logout().await;

    assert!(!client.is_authenticated());
    assert!(client.identity().is_none());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);

    let reread = FileSessionStorage::in_dir(temp_dir.path());
    assert_eq!(reread.load(ACCESS_KEY).await.unwrap(), None);
    assert_eq!(reread.load(REFRESH_KEY).await.unwrap(), None);
    assert_eq!(reread.load(USER_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_logout_clears_even_if_server_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGOUT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid refresh token"})))
        .expect(1)
        .mount(&server)
        .await;

    let storage = signed_in_storage();
    let client = client_for(&server, storage.clone()).await;

    client.logout().await;

    assert!(client.credentials().is_empty());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_logout_with_expired_access_token_refreshes_then_revokes() {
    let server = MockServer::start().await;
    mount_protected(&server, "POST", LOGOUT_PATH, FRESH_ACCESS).await;
    mount_refresh(&server, REFRESH, json!({ "access": FRESH_ACCESS }), 1).await;

    let storage = signed_in_storage();
    let client = client_for(&server, storage.clone()).await;

    client.logout().await;

    assert_eq!(
        authorizations_on(&server, LOGOUT_PATH).await,
        vec![
            Some(format!("Bearer {}", EXPIRED_ACCESS)),
            Some(format!("Bearer {}", FRESH_ACCESS)),
        ]
    );
    assert!(!client.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_login_survives_storage_write_failure() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let storage = MockStorageConfig::new().with_write_failure().build();
    let client = client_for(&server, storage.clone()).await;

    client.login("ada", "secret").await.unwrap();

    // In-memory session is usable even though nothing was persisted
    assert!(client.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_from_config_uses_storage_dir() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_login(&server).await;

    let config = config_for(&server).with_storage_dir(temp_dir.path());
    let client = ApiClient::from_config(config).await.unwrap();
    client.login("ada", "secret").await.unwrap();

    assert!(temp_dir.path().join("session.json").exists());
}
