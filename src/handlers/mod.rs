//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, headers, query string)
//! 2. Delegates to a service or the repository
//! 3. Returns HTTP response (JSON, status code)

/// Merchant analytics and search log listing
pub mod analytics;
pub mod health;
/// Shop provisioning and settings
pub mod shops;
/// Storefront query translation
pub mod translate;
pub mod validate_key;
