//! Token endpoints of the backend.
//!
//! Refresh and login go through the plain [`RequestDispatcher`] and never
//! through the refresh coordinator, so a rejected refresh cannot trigger
//! another refresh. Logout needs a valid access token, so only its request
//! is built here and the client sends it like any other call.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dispatch::RequestDispatcher;
use crate::error::{ApiError, ApiResult, AuthError};
use crate::models::{ApiRequest, Identity};
use crate::traits::Response;

/// Response of `POST <refresh_path>`.
///
/// `refresh` is only present when the server rotates refresh tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Response of `POST <login_path>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<Identity>,
}

/// Client for the login, logout and refresh endpoints.
#[derive(Clone)]
pub struct TokenApi {
    dispatcher: RequestDispatcher,
}

impl TokenApi {
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// POST <refresh_path> with `{"refresh": ...}`
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshResponse> {
        let path = self.dispatcher.config().refresh_path.clone();
        let request = ApiRequest::post(path, json!({ "refresh": refresh_token }));
        let response = self.dispatcher.send(&request).await?;
        decode(&response)
    }

    /// Sign in with a username (or email) and password.
    ///
    /// A 400/401/403 answer becomes [`AuthError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let path = self.dispatcher.config().login_path.clone();
        let request = ApiRequest::post(
            path,
            json!({ "username": username, "password": password }),
        );

        match self.dispatcher.send(&request).await {
            Ok(response) => decode(&response),
            Err(ApiError::Http { status, body }) if matches!(status, 400 | 401 | 403) => {
                Err(AuthError::InvalidCredentials {
                    status,
                    message: detail(&body),
                }
                .into())
            }
            Err(e) => Err(e),
        }
    }

    /// Request that revokes `refresh_token` server-side.
    ///
    /// POST <logout_path> with `{"refresh": ...}`. No credential is attached.
    pub fn logout_request(&self, refresh_token: &str) -> ApiRequest {
        let path = self.dispatcher.config().logout_path.clone();
        ApiRequest::post(path, json!({ "refresh": refresh_token }))
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: &Response) -> ApiResult<T> {
    response
        .json()
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// The `detail` message of an error body, or the body itself.
fn detail(body: &Value) -> String {
    match body.get("detail").and_then(Value::as_str) {
        Some(detail) => detail.to_string(),
        None => match body {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        },
    }
}
