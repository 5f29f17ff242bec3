//! Mock configurations for tests that do not need a real server.
//!
//! This module re-exports the mock implementations from
//! `sessionkit::adapters::mock` and provides builders around them.

pub use sessionkit::adapters::mock::{InMemoryStorage, MockHttpClient, MockResponse};
pub use sessionkit::traits::{Headers, HttpClient, Response};

use std::time::Duration;

use sessionkit::traits::{ACCESS_KEY, REFRESH_KEY};
use sessionkit::NetworkError;

/// Configuration for setting up mock HTTP responses.
pub struct MockHttpConfig {
    client: MockHttpClient,
}

impl MockHttpConfig {
    /// Creates a new mock HTTP configuration.
    pub fn new() -> Self {
        Self {
            client: MockHttpClient::new(),
        }
    }

    /// Configures a JSON response.
    pub fn with_json_response(self, url: &str, status: u16, json: &str) -> Self {
        self.client.set_response(
            url,
            MockResponse::Success(Response::new(status, json.to_string())),
        );
        self
    }

    /// Configures a transport failure.
    pub fn with_network_error(self, url: &str, error: NetworkError) -> Self {
        self.client.set_response(url, MockResponse::Error(error));
        self
    }

    /// Delays every response for a URL.
    pub fn with_latency(self, url: &str, latency: Duration) -> Self {
        self.client.set_latency(url, latency);
        self
    }

    /// Builds the mock HTTP client.
    pub fn build(self) -> MockHttpClient {
        self.client
    }
}

impl Default for MockHttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for in-memory session storage.
pub struct MockStorageConfig {
    storage: InMemoryStorage,
}

impl MockStorageConfig {
    pub fn new() -> Self {
        Self {
            storage: InMemoryStorage::new(),
        }
    }

    /// Seeds an access/refresh pair.
    pub fn with_tokens(self, access: &str, refresh: &str) -> Self {
        Self {
            storage: InMemoryStorage::with_entries([(ACCESS_KEY, access), (REFRESH_KEY, refresh)]),
        }
    }

    /// Makes every write fail.
    pub fn with_write_failure(self) -> Self {
        self.storage.set_write_should_fail(true);
        self
    }

    pub fn build(self) -> InMemoryStorage {
        self.storage
    }
}

impl Default for MockStorageConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_http_config() {
        let client = MockHttpConfig::new()
            .with_json_response("http://api.test/x", 200, "{}")
            .build();
        let response = client.get("http://api.test/x", &Headers::new()).await.unwrap();
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_mock_storage_config() {
        let storage = MockStorageConfig::new().with_tokens("a", "r").build();
        assert_eq!(storage.entry(ACCESS_KEY), Some("a".to_string()));
    }
}
