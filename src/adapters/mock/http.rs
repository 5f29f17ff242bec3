//! Scripted transport for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::NetworkError;
use crate::models::{Headers, Method};
use crate::traits::{HttpClient, Response};

/// One request as the transport saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
}

impl RecordedRequest {
    /// Value of the `Authorization` header, if any.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.as_str())
    }
}

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Any status, including 401.
    Success(Response),
    Error(NetworkError),
}

type Responder = Arc<dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync>;

#[derive(Default)]
struct Script {
    fixed: HashMap<String, MockResponse>,
    computed: HashMap<String, Responder>,
    latency: HashMap<String, Duration>,
    fallback: Option<MockResponse>,
    log: Vec<RecordedRequest>,
}

impl Script {
    /// Responder, exact URL, longest prefix, then fallback.
    fn answer(&self, request: &RecordedRequest) -> Option<MockResponse> {
        if let Some(responder) = self.computed.get(&request.url) {
            return Some(responder(request));
        }
        if let Some(response) = self.fixed.get(&request.url) {
            return Some(response.clone());
        }
        self.fixed
            .iter()
            .filter(|(prefix, _)| request.url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, response)| response.clone())
            .or_else(|| self.fallback.clone())
    }
}

/// Scripted [`HttpClient`] for unit and integration tests.
///
/// Clones share the script and the request log, so a test can keep one
/// handle while the client under test owns another.
///
/// # Example
///
/// ```ignore
/// use sessionkit::adapters::mock::{MockHttpClient, MockResponse};
/// use sessionkit::traits::{HttpClient, Headers, Response};
///
/// let http = MockHttpClient::new();
/// http.set_response("http://api.test/api/posts/", MockResponse::Success(Response::new(200, "[]")));
///
/// http.get("http://api.test/api/posts/", &Headers::new()).await?;
/// assert_eq!(http.request_count("http://api.test/api/posts/"), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockHttpClient {
    script: Arc<Mutex<Script>>,
}

impl fmt::Debug for MockHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let script = self.script();
        f.debug_struct("MockHttpClient")
            .field("urls", &(script.fixed.len() + script.computed.len()))
            .field("recorded", &script.log.len())
            .finish()
    }
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fixed answer for `url`, also used for any longer URL it prefixes.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.script().fixed.insert(url.to_string(), response);
    }

    /// Answer requests to exactly `url` by inspecting them.
    ///
    /// Runs with the script locked, so it must not call back into the mock.
    pub fn set_responder<F>(&self, url: &str, responder: F)
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        self.script().computed.insert(url.to_string(), Arc::new(responder));
    }

    /// Sleep before answering requests to exactly `url`.
    pub fn set_latency(&self, url: &str, latency: Duration) {
        self.script().latency.insert(url.to_string(), latency);
    }

    /// Answer for URLs nothing else matches.
    pub fn set_default_response(&self, response: MockResponse) {
        self.script().fallback = Some(response);
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script().log.clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.script()
            .log
            .iter()
            .filter(|request| request.url == url)
            .cloned()
            .collect()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.script().log.iter().filter(|request| request.url == url).count()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        headers: &Headers,
    ) -> Result<Response, NetworkError> {
        let request = RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body: body.map(str::to_string),
        };

        // The lock is not held across the sleep
        let latency = {
            let mut script = self.script();
            script.log.push(request.clone());
            script.latency.get(url).copied()
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match self.script().answer(&request) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(NetworkError::Other {
                message: format!("unscripted request: {} {}", method, url),
            }),
        }
    }
}
