//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP transport using reqwest
//! - [`FileSessionStorage`] - JSON file session storage
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::InMemoryStorage`] - In-memory session storage

pub mod file_storage;
pub mod mock;
pub mod reqwest_http;

pub use file_storage::FileSessionStorage;
pub use mock::{InMemoryStorage, MockHttpClient};
pub use reqwest_http::ReqwestHttpClient;
