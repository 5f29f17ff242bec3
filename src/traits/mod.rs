//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - Transport used by the request dispatcher
//! - [`SessionStorage`] - Persistent key-value store for the session

pub mod http;
pub mod storage;

pub use crate::models::Headers;
pub use http::{HttpClient, Response};
pub use storage::{SessionStorage, ACCESS_KEY, REFRESH_KEY, USER_KEY};
