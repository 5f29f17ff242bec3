//! Coarse error buckets.
//!
//! Call-sites that only need to decide between "retry later", "send the
//! user to the sign-in screen" and "show the message" match on these
//! instead of the concrete variants.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Nothing came back from the server.
    Network,

    /// The session expired; only signing in again helps.
    Auth,

    /// 5xx, or a 2xx body that did not decode.
    Server,

    /// Any 4xx, including a 401 that survived the refresh and replay.
    Client,

    /// The local session file.
    Storage,

    Configuration,
}

impl ErrorCategory {
    /// Bucket for a non-2xx HTTP status.
    ///
    /// A 401 is never `Auth` here: the client only surfaces one after a
    /// successful refresh, so it means the resource is off limits.
    pub fn from_status(status: u16) -> Self {
        match status {
            500.. => ErrorCategory::Server,
            _ => ErrorCategory::Client,
        }
    }

    /// Transient categories where resending later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// The user has to sign in before anything else will work.
    pub fn needs_sign_in(&self) -> bool {
        *self == ErrorCategory::Auth
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::Storage => "storage",
            ErrorCategory::Configuration => "config",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
