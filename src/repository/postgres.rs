//! PostgreSQL implementation of [`Repository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Repository;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::search_log::{NewSearchLog, SearchLog};
use crate::models::shop::{NewShop, Shop, SubscriptionStatus};

const SHOP_COLUMNS: &str = "id, shop_url, api_key_hash, api_key_prefix, filters, sorts, \
     current_usage, usage_limit, subscription_status, subscription_charge_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgRepository {
    pool: DbPool,
}

impl PgRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_shop_by_key_hash(&self, key_hash: &str) -> Result<Option<Shop>, AppError> {
        let shop = sqlx::query_as::<_, Shop>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE api_key_hash = $1"
        ))
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    async fn find_shop_by_url(&self, shop_url: &str) -> Result<Option<Shop>, AppError> {
        let shop = sqlx::query_as::<_, Shop>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE shop_url = $1"
        ))
        .bind(shop_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    async fn api_key_exists(&self, key_hash: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM shops WHERE api_key_hash = $1)")
                .bind(key_hash)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn create_shop(&self, shop: NewShop) -> Result<Shop, AppError> {
        let shop = sqlx::query_as::<_, Shop>(&format!(
            r#"
            INSERT INTO shops (shop_url, api_key_hash, api_key_prefix, usage_limit, subscription_status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING {SHOP_COLUMNS}
            "#
        ))
        .bind(shop.shop_url)
        .bind(shop.api_key_hash)
        .bind(shop.api_key_prefix)
        .bind(shop.usage_limit)
        .fetch_one(&self.pool)
        .await?;

        Ok(shop)
    }

    async fn set_subscription_status(
        &self,
        shop_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Shop, AppError> {
        sqlx::query_as::<_, Shop>(&format!(
            r#"
            UPDATE shops
            SET subscription_status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {SHOP_COLUMNS}
            "#
        ))
        .bind(status.as_str())
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ShopNotFound)
    }

    async fn update_settings(
        &self,
        shop_id: Uuid,
        filters: Option<String>,
        sorts: Option<String>,
    ) -> Result<Shop, AppError> {
        sqlx::query_as::<_, Shop>(&format!(
            r#"
            UPDATE shops
            SET filters = $1, sorts = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {SHOP_COLUMNS}
            "#
        ))
        .bind(filters)
        .bind(sorts)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ShopNotFound)
    }

    async fn replace_api_key(
        &self,
        shop_id: Uuid,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<Shop, AppError> {
        sqlx::query_as::<_, Shop>(&format!(
            r#"
            UPDATE shops
            SET api_key_hash = $1, api_key_prefix = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {SHOP_COLUMNS}
            "#
        ))
        .bind(key_hash)
        .bind(key_prefix)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ShopNotFound)
    }

    async fn increment_usage(&self, shop_id: Uuid) -> Result<i64, AppError> {
        // Single statement: concurrent calls for one shop cannot lose updates
        sqlx::query_scalar(
            r#"
            UPDATE shops
            SET current_usage = current_usage + 1
            WHERE id = $1
            RETURNING current_usage
            "#,
        )
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ShopNotFound)
    }

    async fn insert_search_log(&self, log: NewSearchLog) -> Result<SearchLog, AppError> {
        let log = sqlx::query_as::<_, SearchLog>(
            r#"
            INSERT INTO search_logs (shop_id, original_query, returned_json)
            VALUES ($1, $2, $3)
            RETURNING id, shop_id, original_query, returned_json, created_at
            "#,
        )
        .bind(log.shop_id)
        .bind(log.original_query)
        .bind(log.returned_json)
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }

    async fn search_logs_since(
        &self,
        shop_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<SearchLog>, AppError> {
        let logs = sqlx::query_as::<_, SearchLog>(
            r#"
            SELECT id, shop_id, original_query, returned_json, created_at
            FROM search_logs
            WHERE shop_id = $1 AND created_at >= $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(shop_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn recent_search_logs(
        &self,
        shop_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SearchLog>, AppError> {
        let logs = sqlx::query_as::<_, SearchLog>(
            r#"
            SELECT id, shop_id, original_query, returned_json, created_at
            FROM search_logs
            WHERE shop_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(shop_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
