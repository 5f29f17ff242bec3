//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ApiError;

/// Base URL used when `SESSIONKIT_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "SESSIONKIT_API_URL";

/// Environment variable overriding the refresh timeout, in seconds.
pub const REFRESH_TIMEOUT_ENV: &str = "SESSIONKIT_REFRESH_TIMEOUT_SECS";

/// Configuration for [`crate::ApiClient`].
///
/// # Example
///
/// ```ignore
/// use sessionkit::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_base_url("https://social.example.com/api")
///     .with_refresh_timeout(std::time::Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every request path is appended to
    pub base_url: String,
    /// Token refresh endpoint, relative to the base URL
    pub refresh_path: String,
    /// Login endpoint, relative to the base URL
    pub login_path: String,
    /// Logout endpoint, relative to the base URL
    pub logout_path: String,
    /// Timeout applied by the transport to every outbound call
    pub request_timeout: Duration,
    /// Upper bound for one refresh call; exceeding it fails the refresh
    pub refresh_timeout: Duration,
    /// Directory for the session file (default: `~/.sessionkit`)
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            refresh_path: "/auth/token/refresh/".to_string(),
            login_path: "/auth/login/".to_string(),
            logout_path: "/auth/logout/".to_string(),
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(30),
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL. A trailing slash is dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Build a config from `SESSIONKIT_API_URL` and
    /// `SESSIONKIT_REFRESH_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ApiError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config = config.with_base_url(url.trim());
            }
        }

        if let Ok(raw) = std::env::var(REFRESH_TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::Config(format!("{} must be a whole number of seconds, got '{}'", REFRESH_TIMEOUT_ENV, raw))
            })?;
            config = config.with_refresh_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the client cannot work with.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.refresh_timeout.is_zero() {
            return Err(ApiError::Config("refresh timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Absolute URL for a path below the base URL.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}
