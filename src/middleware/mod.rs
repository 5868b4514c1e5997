//! HTTP middleware components.
//!
//! Middleware run before route handlers. They can:
//! - Authenticate requests
//! - Decorate responses (CORS)
//! - Short-circuit requests (reject unauthorized)

/// API key and operator token authentication
pub mod auth;
/// Storefront CORS headers
pub mod cors;
