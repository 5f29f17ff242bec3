//! Unified error type returned to call-sites.
//!
//! Terminal failures keep the shape the dispatcher produced, whether or
//! not a refresh happened in between. A second 401 after a successful
//! refresh surfaces as the plain `Http { status: 401, .. }` value.

use serde_json::Value;
use thiserror::Error;

use super::auth::AuthError;
use super::category::ErrorCategory;
use super::network::NetworkError;

/// HTTP status signalling an authentication failure.
pub const UNAUTHORIZED: u16 = 401;

/// Failures of the persistent key-value store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("Failed to read session storage: {0}")]
    ReadFailed(String),

    #[error("Failed to write session storage: {0}")]
    WriteFailed(String),

    #[error("Could not determine a session storage location")]
    NoHomeDirectory,
}

/// Error type for every request that goes through the client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No response was received.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: Value },

    /// Session-level failure (expired session, rejected login).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Credentials could not be persisted or loaded.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// True for the response status that triggers a token refresh.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http { status, .. } if *status == UNAUTHORIZED)
    }

    /// True when the refresh failed and credentials were cleared.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::Auth(AuthError::SessionExpired { .. }))
    }

    /// HTTP status if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Bucket used to pick a reaction.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Network(_) => ErrorCategory::Network,
            ApiError::Http { status, .. } => ErrorCategory::from_status(*status),
            ApiError::Auth(err) if err.requires_reauth() => ErrorCategory::Auth,
            ApiError::Auth(_) => ErrorCategory::Client,
            ApiError::Storage(_) => ErrorCategory::Storage,
            ApiError::Decode(_) => ErrorCategory::Server,
            ApiError::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(err) => err.user_message(),
            ApiError::Auth(err) => err.user_message(),
            ApiError::Http { status, body } => match detail(body) {
                Some(detail) => detail.to_string(),
                None => format!("The server returned an error (HTTP {}).", status),
            },
            ApiError::Storage(_) => "Could not save your session locally.".to_string(),
            ApiError::Decode(_) => "Received an unexpected response from the server.".to_string(),
            ApiError::Config(message) => format!("Configuration problem: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Network(err) => err.error_code(),
            ApiError::Auth(err) => err.error_code(),
            ApiError::Http { .. } => "E_HTTP",
            ApiError::Storage(_) => "E_STORAGE",
            ApiError::Decode(_) => "E_DECODE",
            ApiError::Config(_) => "E_CONFIG",
        }
    }
}

/// Extract the `detail` message DRF-style backends put in error bodies.
fn detail(body: &Value) -> Option<&str> {
    body.get("detail").and_then(Value::as_str)
}

/// Result alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;
