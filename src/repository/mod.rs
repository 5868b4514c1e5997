//! Storage access for shops and search logs.
//!
//! Handlers and services only see the [`Repository`] trait; production
//! wires in [`PgRepository`], tests use an in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::search_log::{NewSearchLog, SearchLog};
use crate::models::shop::{NewShop, Shop, SubscriptionStatus};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), AppError>;

    // ========== Shops ==========

    async fn find_shop_by_key_hash(&self, key_hash: &str) -> Result<Option<Shop>, AppError>;

    async fn find_shop_by_url(&self, shop_url: &str) -> Result<Option<Shop>, AppError>;

    async fn api_key_exists(&self, key_hash: &str) -> Result<bool, AppError>;

    async fn create_shop(&self, shop: NewShop) -> Result<Shop, AppError>;

    async fn set_subscription_status(
        &self,
        shop_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Shop, AppError>;

    async fn update_settings(
        &self,
        shop_id: Uuid,
        filters: Option<String>,
        sorts: Option<String>,
    ) -> Result<Shop, AppError>;

    async fn replace_api_key(
        &self,
        shop_id: Uuid,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<Shop, AppError>;

    /// Atomically add one to the usage counter and return the new value.
    async fn increment_usage(&self, shop_id: Uuid) -> Result<i64, AppError>;

    // ========== Search logs ==========

    async fn insert_search_log(&self, log: NewSearchLog) -> Result<SearchLog, AppError>;

    /// Logs created at or after `since`, oldest first.
    async fn search_logs_since(
        &self,
        shop_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<SearchLog>, AppError>;

    /// Most recent logs, newest first.
    async fn recent_search_logs(&self, shop_id: Uuid, limit: i64)
    -> Result<Vec<SearchLog>, AppError>;
}
