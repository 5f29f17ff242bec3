//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses and latency
//! - [`InMemoryStorage`] - In-memory session storage

pub mod http;
pub mod storage;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use storage::InMemoryStorage;
