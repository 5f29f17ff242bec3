//! sessionkit - an authenticated API client with single-flight token refresh
//!
//! Requests go out with the current access token. When the backend answers
//! 401, concurrent requests share one refresh call and are replayed once
//! with the new token; if the refresh fails the session is cleared and
//! every waiting request fails with a session-expired error.

pub mod adapters;
pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

pub use auth::{CredentialPair, CredentialStore, RefreshCoordinator, RefreshPhase, SessionEvent};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use dispatch::RequestDispatcher;
pub use error::{ApiError, ApiResult, AuthError, NetworkError, StorageError};
pub use models::{ApiRequest, Identity, Method};
pub use traits::Response;
