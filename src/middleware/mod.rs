//! Middleware components for HTTP request processing.
//!
//! Cross-cutting concerns layered onto the router: sliding-window rate
//! limiting and security response headers. Bearer authentication is not
//! middleware here; it lives in the [`crate::auth::CurrentUser`]
//! extractor so handlers opt in per route.

pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::{client_ip, EndpointRateLimiter};
