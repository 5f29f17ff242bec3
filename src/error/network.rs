//! Transport-level error types.
//!
//! A `NetworkError` means no usable HTTP response came back. The refresh
//! coordinator only sees one when it happens during the refresh call.

use std::fmt;

/// Failure of an outbound request before a response was received.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// The TCP connection could not be established.
    ConnectionFailed { url: String, message: String },

    /// The host name did not resolve.
    UnknownHost { host: String },

    /// No response within the transport timeout.
    Timeout { url: String, after_secs: u64 },

    /// TLS handshake or certificate failure.
    Tls { message: String },

    /// The request could not be built (bad URL, unserialisable body).
    InvalidRequest { message: String },

    /// The response body could not be read.
    InvalidResponse { message: String },

    /// The request was dropped before completing.
    Cancelled,

    Other { message: String },
}

impl NetworkError {
    /// Whether sending the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NetworkError::ConnectionFailed { .. }
                | NetworkError::UnknownHost { .. }
                | NetworkError::Timeout { .. }
        )
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } | NetworkError::UnknownHost { .. } => {
                "Can't reach the server. Check your connection and try again.".to_string()
            }
            NetworkError::Timeout { after_secs, .. } => {
                format!("The server did not answer within {} seconds.", after_secs)
            }
            NetworkError::Tls { .. } => "Secure connection to the server failed.".to_string(),
            NetworkError::InvalidRequest { .. } => "The request could not be sent.".to_string(),
            NetworkError::InvalidResponse { .. } => {
                "The server sent a response that could not be read.".to_string()
            }
            NetworkError::Cancelled => "The request was cancelled.".to_string(),
            NetworkError::Other { .. } => "A network error occurred.".to_string(),
        }
    }

    /// Stable code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONNECT",
            NetworkError::UnknownHost { .. } => "E_NET_HOST",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::Tls { .. } => "E_NET_TLS",
            NetworkError::InvalidRequest { .. } => "E_NET_REQUEST",
            NetworkError::InvalidResponse { .. } => "E_NET_RESPONSE",
            NetworkError::Cancelled => "E_NET_CANCELLED",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "could not connect to {}: {}", url, message)
            }
            NetworkError::UnknownHost { host } => write!(f, "unknown host {}", host),
            NetworkError::Timeout { url, after_secs } => {
                write!(f, "request to {} timed out after {}s", url, after_secs)
            }
            NetworkError::Tls { message } => write!(f, "TLS failure: {}", message),
            NetworkError::InvalidRequest { message } => {
                write!(f, "request could not be built: {}", message)
            }
            NetworkError::InvalidResponse { message } => {
                write!(f, "response could not be read: {}", message)
            }
            NetworkError::Cancelled => f.write_str("request cancelled"),
            NetworkError::Other { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Map a reqwest failure onto [`NetworkError`].
///
/// reqwest does not report the configured limit on timeouts, so the caller
/// passes it in as `timeout_secs`.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str, timeout_secs: u64) -> NetworkError {
    let message = error_chain(err);

    if err.is_timeout() {
        return NetworkError::Timeout {
            url: url.to_string(),
            after_secs: timeout_secs,
        };
    }
    if err.is_builder() {
        return NetworkError::InvalidRequest { message };
    }
    if err.is_body() || err.is_decode() {
        return NetworkError::InvalidResponse { message };
    }

    let lowered = message.to_lowercase();
    if lowered.contains("certificate") || lowered.contains("tls") {
        NetworkError::Tls { message }
    } else if lowered.contains("dns") || lowered.contains("failed to lookup address") {
        NetworkError::UnknownHost {
            host: host_of(url).to_string(),
        }
    } else if err.is_connect() {
        NetworkError::ConnectionFailed {
            url: url.to_string(),
            message,
        }
    } else {
        NetworkError::Other { message }
    }
}

/// The error and its sources joined with `: `.
///
/// reqwest's top-level message is generic; the cause is in the chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Host portion of an absolute URL, or the input if it has none.
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', ':', '?']).next().unwrap_or(rest)
}
