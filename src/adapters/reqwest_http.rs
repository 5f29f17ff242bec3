//! Production transport over reqwest.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{classify_reqwest_error, NetworkError};
use crate::models::{Headers, Method};
use crate::traits::{HttpClient, Response};

/// Default outbound call timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`HttpClient`] backed by a shared `reqwest::Client`.
///
/// Non-2xx statuses come back as `Ok(Response)`; the dispatcher decides
/// what they mean.
///
/// # Example
///
/// ```ignore
/// use sessionkit::adapters::ReqwestHttpClient;
/// use sessionkit::traits::{Headers, HttpClient};
///
/// let client = ReqwestHttpClient::new()?;
/// let response = client.get("http://127.0.0.1:8000/api/health/", &Headers::new()).await?;
/// assert!(response.is_success());
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self, NetworkError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::Other {
                message: format!("reqwest client setup failed: {}", e),
            })?;
        Ok(Self { client, timeout })
    }

    /// Wrap a preconfigured reqwest::Client.
    ///
    /// `timeout` is only used to report the limit in timeout errors.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Header map as owned strings. Values that are not visible ASCII are skipped.
fn header_strings(headers: &reqwest::header::HeaderMap) -> Headers {
    let mut out = Headers::with_capacity(headers.len());
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            out.insert(name.as_str().to_string(), value.to_string());
        }
    }
    out
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        headers: &Headers,
    ) -> Result<Response, NetworkError> {
        let classify = |e: reqwest::Error| classify_reqwest_error(&e, url, self.timeout.as_secs());

        let mut builder = self.client.request(reqwest_method(method), url);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body.to_owned());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let response_headers = header_strings(response.headers());
        let body = response.bytes().await.map_err(classify)?;

        Ok(Response::with_headers(status, response_headers, body))
    }
}
