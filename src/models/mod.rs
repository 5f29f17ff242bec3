pub mod identity;
pub mod request;

pub use identity::Identity;
pub use request::{ApiRequest, Headers, Method, MAX_AUTH_RETRIES};
