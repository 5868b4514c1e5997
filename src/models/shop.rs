//! Shop data models and API request/response types.
//!
//! This module defines:
//! - `Shop`: Database entity representing a merchant tenant
//! - `SubscriptionStatus`: billing state mirrored from Shopify
//! - Request and response bodies for the merchant and operator endpoints

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a shop record from the database.
///
/// # Database Table
///
/// Maps to the `shops` table. Each shop:
/// - Is identified by its `*.myshopify.com` URL
/// - Authenticates storefront calls with one API key (stored hashed)
/// - Declares the filter and sort vocabulary the translator may use
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Shop {
    pub id: Uuid,

    /// Stable shop identifier, e.g. `acme.myshopify.com`
    pub shop_url: String,

    /// SHA-256 hex of the shop's API key (unique)
    pub api_key_hash: String,

    /// Leading characters of the API key for display
    pub api_key_prefix: String,

    /// Free-text filter vocabulary supplied by the merchant
    pub filters: Option<String>,

    /// Free-text sort vocabulary supplied by the merchant
    pub sorts: Option<String>,

    /// Translation calls made so far
    pub current_usage: i64,

    /// Calls included in the subscription plan
    pub usage_limit: i64,

    /// See [`SubscriptionStatus`]
    pub subscription_status: String,

    pub subscription_charge_id: Option<i64>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Shop {
    /// Parsed subscription status; unknown values read as pending.
    pub fn status(&self) -> SubscriptionStatus {
        self.subscription_status
            .parse()
            .unwrap_or(SubscriptionStatus::Pending)
    }

    pub fn usage(&self) -> UsageSnapshot {
        UsageSnapshot::new(self.current_usage, self.usage_limit)
    }
}

/// Subscription state of a shop.
///
/// Installation leaves a shop `pending` until the merchant approves the
/// charge; the remaining states mirror Shopify's app subscription statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Declined,
    Cancelled,
    Frozen,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Declined => "declined",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Frozen => "frozen",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SubscriptionStatus::Pending),
            "active" => Ok(SubscriptionStatus::Active),
            "declined" => Ok(SubscriptionStatus::Declined),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            "frozen" => Ok(SubscriptionStatus::Frozen),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(format!("unknown subscription status: {other}")),
        }
    }
}

/// Usage Ledger view of a shop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub current_usage: i64,
    pub usage_limit: i64,
    /// `current_usage / usage_limit * 100`, 0 when the limit is 0
    pub usage_percentage: f64,
    pub limit_exceeded: bool,
}

impl UsageSnapshot {
    pub fn new(current_usage: i64, usage_limit: i64) -> Self {
        let usage_percentage = if usage_limit > 0 {
            current_usage as f64 / usage_limit as f64 * 100.0
        } else {
            0.0
        };

        Self {
            current_usage,
            usage_limit,
            usage_percentage,
            limit_exceeded: current_usage > usage_limit,
        }
    }
}

/// Values needed to insert a shop at installation time.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub shop_url: String,
    pub api_key_hash: String,
    pub api_key_prefix: String,
    pub usage_limit: i64,
}

/// Request body for `POST /internal/shops`.
///
/// ```json
/// { "shop_url": "acme.myshopify.com" }
/// ```
#[derive(Debug, Deserialize)]
pub struct InstallShopRequest {
    pub shop_url: String,
}

/// Request body for `PUT /api/v1/shop/settings`.
///
/// Blank strings clear the stored vocabulary.
///
/// ```json
/// {
///   "filters": "categoria, cor, tamanho",
///   "sorts": "mais_vendidos, preço_crescente"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub filters: Option<String>,

    #[serde(default)]
    pub sorts: Option<String>,
}

/// Merchant-facing view of a shop. Never includes the key hash.
///
/// ```json
/// {
///   "shop_url": "acme.myshopify.com",
///   "api_key_prefix": "vtr_4f1c9a2b",
///   "subscription_status": "active",
///   "usage": { "current_usage": 12, "usage_limit": 1000, "usage_percentage": 1.2, "limit_exceeded": false },
///   "filters": "categoria, cor",
///   "sorts": null,
///   "updated_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ShopResponse {
    pub id: Uuid,
    pub shop_url: String,
    pub api_key_prefix: String,
    pub subscription_status: SubscriptionStatus,
    pub usage: UsageSnapshot,
    pub filters: Option<String>,
    pub sorts: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Shop> for ShopResponse {
    fn from(shop: Shop) -> Self {
        Self {
            id: shop.id,
            subscription_status: shop.status(),
            usage: shop.usage(),
            shop_url: shop.shop_url,
            api_key_prefix: shop.api_key_prefix,
            filters: shop.filters,
            sorts: shop.sorts,
            updated_at: shop.updated_at,
        }
    }
}

/// Response for installation and key rotation.
///
/// `api_key` is only present when a new key was issued.
#[derive(Debug, Serialize)]
pub struct IssuedKeyResponse {
    pub shop: ShopResponse,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}
