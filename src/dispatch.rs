//! Request dispatcher: one outbound request, no authentication logic.

use serde_json::Value;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, NetworkError};
use crate::models::ApiRequest;
use crate::traits::{HttpClient, Response};

/// Sends [`ApiRequest`]s through an [`HttpClient`].
///
/// Non-2xx responses become [`ApiError::Http`] with the parsed body so
/// callers can branch on the status code.
#[derive(Clone)]
pub struct RequestDispatcher {
    http: Arc<dyn HttpClient>,
    config: Arc<ClientConfig>,
}

impl RequestDispatcher {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<ClientConfig>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Perform a single request exactly as given.
    pub async fn send(&self, request: &ApiRequest) -> ApiResult<Response> {
        let url = self.config.url_for(&request.path);
        let body = request
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| NetworkError::InvalidRequest {
                message: format!("Failed to serialise request body: {}", e),
            })?;

        let mut headers = request.headers.clone();
        if body.is_some()
            && !headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("content-type"))
        {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }

        tracing::trace!(request_id = %request.id, method = %request.method, %url, "dispatching request");

        let response = self
            .http
            .send(request.method, &url, body.as_deref(), &headers)
            .await?;

        if response.is_success() {
            Ok(response)
        } else {
            tracing::debug!(
                request_id = %request.id,
                status = response.status,
                %url,
                "request failed with HTTP status"
            );
            Err(ApiError::Http {
                status: response.status,
                body: parse_error_body(&response),
            })
        }
    }
}

/// Parse an error body as JSON, keeping non-JSON text as a JSON string.
fn parse_error_body(response: &Response) -> Value {
    if response.body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&response.body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&response.body).into_owned()))
}
