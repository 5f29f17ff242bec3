//! Attaches the bearer credential to outgoing requests.
//!
//! Both functions are pure: they take a request by value and return the
//! request to send, without touching the credential store.

use crate::auth::credentials::CredentialPair;
use crate::models::ApiRequest;

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

/// Authorize `request` with the access token from `credentials`.
///
/// Without an access token the request goes out unauthenticated.
pub fn authorize(request: ApiRequest, credentials: &CredentialPair) -> ApiRequest {
    attach_bearer(request, credentials.access_token.as_deref())
}

/// Set `Authorization: Bearer <token>`, replacing any existing value.
///
/// With `None` the request is returned without an authorization header.
pub fn attach_bearer(mut request: ApiRequest, token: Option<&str>) -> ApiRequest {
    request
        .headers
        .retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
    if let Some(token) = token {
        request
            .headers
            .insert(AUTHORIZATION.to_string(), format!("Bearer {}", token));
    }
    request
}
