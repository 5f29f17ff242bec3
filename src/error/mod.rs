//! Error handling for the session client.
//!
//! | Type           | Raised by                          |
//! |----------------|------------------------------------|
//! | `NetworkError` | transport, no response received    |
//! | `ApiError::Http` | dispatcher, non-2xx response     |
//! | `AuthError`    | refresh coordinator, login         |
//! | `StorageError` | session persistence                |
//!
//! Everything reaching a call-site is an [`ApiError`].

mod api_error;
mod auth;
mod category;
mod network;

pub use api_error::{ApiError, ApiResult, StorageError, UNAUTHORIZED};
pub use auth::AuthError;
pub use category::ErrorCategory;
pub use network::{classify_reqwest_error, NetworkError};
