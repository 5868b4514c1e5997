//! Business logic services.
//!
//! Services contain core logic separated from HTTP handlers: translation,
//! URL mapping, shop lifecycle and analytics.

pub mod analytics;
pub mod search_url;
pub mod shop_service;
pub mod translation_service;
pub mod translator;
