//! Session-level failures.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// Refresh failed and the stored credentials were wiped, or the session
    /// ended while the refresh was in flight.
    ///
    /// Only the refresh coordinator produces this. Every request parked on
    /// the failed refresh receives the same `reason`.
    #[error("session expired: {reason}")]
    SessionExpired { reason: String },

    /// The login endpoint answered 400, 401 or 403.
    #[error("login refused with HTTP {status}: {message}")]
    InvalidCredentials { status: u16, message: String },
}

impl AuthError {
    pub fn session_expired(reason: impl Into<String>) -> Self {
        AuthError::SessionExpired {
            reason: reason.into(),
        }
    }

    /// Only a fresh login clears this error.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, AuthError::SessionExpired { .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            AuthError::SessionExpired { .. } => {
                "Your session ended. Sign in again to continue.".to_string()
            }
            AuthError::InvalidCredentials { status, .. } => match *status {
                403 => "This account is inactive.".to_string(),
                _ => "Sign in failed. Check your username and password.".to_string(),
            },
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::SessionExpired { .. } => "E_AUTH_EXPIRED",
            AuthError::InvalidCredentials { .. } => "E_AUTH_LOGIN",
        }
    }
}
