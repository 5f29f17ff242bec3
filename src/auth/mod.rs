//! Authentication module for sessionkit.
//!
//! This module provides authentication functionality including:
//! - Credential storage and persistence
//! - Bearer header injection for outgoing requests
//! - Token endpoints (login, logout, refresh)
//! - Single-flight refresh coordination

pub mod api;
pub mod credentials;
pub mod events;
pub mod interceptor;
pub mod refresh;

pub use api::{LoginResponse, RefreshResponse, TokenApi};
pub use credentials::{CredentialPair, CredentialStore};
pub use events::SessionEvent;
pub use interceptor::{attach_bearer, authorize};
pub use refresh::{RefreshCoordinator, RefreshPhase};
