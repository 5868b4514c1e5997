//! Data models representing database entities and wire types.

/// API key issuing and hashing
pub mod api_key;
/// Per-shop search log entries
pub mod search_log;
/// Merchant tenant model
pub mod shop;
/// Translator output shared with the storefront
pub mod structured_query;
