//! Common test utilities for integration tests.
//!
//! Wires an [`ApiClient`] to a wiremock server with the real reqwest
//! transport, plus fixtures for the backend's token endpoints.
//!
//! # Example
//!
//! ```ignore
//! let server = MockServer::start().await;
//! mount_refresh(&server, "r1", json!({"access": "a2"}), 1).await;
//! let client = client_for(&server, signed_in_storage()).await;
//! ```
#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use sessionkit::adapters::mock::InMemoryStorage;
use sessionkit::adapters::ReqwestHttpClient;
use sessionkit::traits::{SessionStorage, ACCESS_KEY, REFRESH_KEY};
use sessionkit::{ApiClient, ClientConfig};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EXPIRED_ACCESS: &str = "expired-access-token";
pub const FRESH_ACCESS: &str = "fresh-access-token";
pub const REFRESH: &str = "test-refresh-token";

pub const REFRESH_PATH: &str = "/api/auth/token/refresh/";
pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const LOGOUT_PATH: &str = "/api/auth/logout/";

/// Client config pointing at the mock server's `/api` root.
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_base_url(format!("{}/api", server.uri()))
        .with_request_timeout(Duration::from_secs(5))
        .with_refresh_timeout(Duration::from_secs(5))
}

/// Storage holding an expired access token and a valid refresh token.
pub fn signed_in_storage() -> InMemoryStorage {
    InMemoryStorage::with_entries([(ACCESS_KEY, EXPIRED_ACCESS), (REFRESH_KEY, REFRESH)])
}

/// Client with the reqwest transport against `server`.
pub async fn client_for(server: &MockServer, storage: impl SessionStorage + 'static) -> ApiClient {
    client_with_config(config_for(server), storage).await
}

pub async fn client_with_config(
    config: ClientConfig,
    storage: impl SessionStorage + 'static,
) -> ApiClient {
    let http = ReqwestHttpClient::with_timeout(config.request_timeout).unwrap();
    ApiClient::new(config, Arc::new(http), Arc::new(storage))
        .await
        .unwrap()
}

/// Body the backend sends with a rejected access token.
pub fn token_not_valid() -> Value {
    json!({
        "detail": "Given token not valid for any token type",
        "code": "token_not_valid"
    })
}

/// Mount a resource that only accepts `Bearer <token>` and answers 401 otherwise.
pub async fn mount_protected(server: &MockServer, http_method: &str, resource: &str, token: &str) {
    Mock::given(method(http_method))
        .and(path(resource))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"path": resource})))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method(http_method))
        .and(path(resource))
        .respond_with(ResponseTemplate::new(401).set_body_json(token_not_valid()))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Mount the refresh endpoint for `refresh_token`, expecting `calls` hits.
pub async fn mount_refresh(server: &MockServer, refresh_token: &str, response: Value, calls: u64) {
    mount_refresh_with(server, refresh_token, ResponseTemplate::new(200).set_body_json(response), calls).await;
}

pub async fn mount_refresh_with(
    server: &MockServer,
    refresh_token: &str,
    template: ResponseTemplate,
    calls: u64,
) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({ "refresh": refresh_token })))
        .respond_with(template)
        .expect(calls)
        .mount(server)
        .await;
}

/// Authorization headers of every request the server saw on `resource`.
pub async fn authorizations_on(server: &MockServer, resource: &str) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == resource)
        .map(|request| {
            request
                .headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}
