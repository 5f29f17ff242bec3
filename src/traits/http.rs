//! Transport seam under the request dispatcher.
//!
//! The dispatcher only ever talks to `dyn HttpClient`, so tests swap in
//! the scripted mock and production uses reqwest.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

use crate::error::NetworkError;
use crate::models::{Headers, Method};

/// Status, headers and raw body of an answered request.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Lowercased header names.
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_headers(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Response whose body is `value` serialised, tagged as JSON.
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::with_headers(status, headers, value.to_string())
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Decode the body into `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Transport used by the request dispatcher.
///
/// Implementations return every HTTP status as a [`Response`]; only
/// failures where no response was received are errors. Authentication is
/// not this layer's concern.
///
/// # Example
///
/// ```ignore
/// use sessionkit::traits::{HttpClient, Headers};
///
/// async fn ping<C: HttpClient>(client: &C) -> bool {
///     match client.get("http://127.0.0.1:8000/api/health/", &Headers::new()).await {
///         Ok(response) => response.is_success(),
///         Err(_) => false,
///     }
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send one request to an absolute `url`. `body` is already serialised.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        headers: &Headers,
    ) -> Result<Response, NetworkError>;

    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, NetworkError> {
        self.send(Method::Get, url, None, headers).await
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, NetworkError> {
        self.send(Method::Post, url, Some(body), headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let ok: Vec<u16> = [199, 200, 204, 299, 300, 401, 503]
            .into_iter()
            .filter(|status| Response::new(*status, Bytes::new()).is_success())
            .collect();
        assert_eq!(ok, vec![200, 204, 299]);
    }

    #[test]
    fn test_response_json() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Post {
            id: i64,
            content: String,
        }

        let response = Response::new(200, r#"{"id":1,"content":"hello"}"#);
        let post: Post = response.json().unwrap();
        assert_eq!(
            post,
            Post {
                id: 1,
                content: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_response_json_body_sets_content_type() {
        let response = Response::json_body(201, &serde_json::json!({"id": 9}));
        assert_eq!(
            response.headers.get("content-type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(response.text().unwrap(), r#"{"id":9}"#);
    }
}
