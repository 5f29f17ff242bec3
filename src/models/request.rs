use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// How many times a request may be replayed after an authentication failure.
pub const MAX_AUTH_RETRIES: u8 = 1;

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound API request, relative to the configured base URL.
///
/// The value is never mutated by the dispatch path: attaching credentials
/// and marking a replay both return a new request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Identity used in logs and in the refresh queue
    pub id: Uuid,
    pub method: Method,
    /// Path below the base URL, e.g. `/posts/`
    pub path: String,
    pub headers: Headers,
    /// JSON body, serialised by the dispatcher
    pub body: Option<Value>,
    /// Number of replays already performed after a 401
    pub retry_count: u8,
}

impl ApiRequest {
    /// Create a request without body or extra headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            headers: Headers::new(),
            body: None,
            retry_count: 0,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a single header, replacing any previous value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Merge caller-supplied headers.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Whether a 401 on this request may still trigger a refresh and replay.
    pub fn can_retry(&self) -> bool {
        self.retry_count < MAX_AUTH_RETRIES
    }

    /// The same request, marked as replayed once more.
    pub fn retried(&self) -> Self {
        Self {
            retry_count: self.retry_count.saturating_add(1),
            ..self.clone()
        }
    }
}
