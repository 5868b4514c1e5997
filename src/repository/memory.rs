//! In-memory [`Repository`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Repository;
use crate::error::AppError;
use crate::models::search_log::{NewSearchLog, SearchLog};
use crate::models::shop::{NewShop, Shop, SubscriptionStatus};

#[derive(Default)]
pub struct MemoryRepository {
    shops: Mutex<Vec<Shop>>,
    logs: Mutex<Vec<SearchLog>>,
    /// When set, usage increments and log writes fail like a lost connection.
    fail_writes: Mutex<bool>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub fn shop(&self, shop_id: Uuid) -> Option<Shop> {
        self.shops
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == shop_id)
            .cloned()
    }

    pub fn logs(&self) -> Vec<SearchLog> {
        self.logs.lock().unwrap().clone()
    }

    /// Insert a log with an explicit timestamp.
    pub fn push_log(&self, shop_id: Uuid, query: &str, json: &str, created_at: DateTime<Utc>) {
        self.logs.lock().unwrap().push(SearchLog {
            id: Uuid::new_v4(),
            shop_id,
            original_query: query.to_string(),
            returned_json: json.to_string(),
            created_at,
        });
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    fn update_shop<F>(&self, shop_id: Uuid, apply: F) -> Result<Shop, AppError>
    where
        F: FnOnce(&mut Shop),
    {
        let mut shops = self.shops.lock().unwrap();
        let shop = shops
            .iter_mut()
            .find(|s| s.id == shop_id)
            .ok_or(AppError::ShopNotFound)?;
        apply(shop);
        shop.updated_at = Utc::now();
        Ok(shop.clone())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_shop_by_key_hash(&self, key_hash: &str) -> Result<Option<Shop>, AppError> {
        Ok(self
            .shops
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.api_key_hash == key_hash)
            .cloned())
    }

    async fn find_shop_by_url(&self, shop_url: &str) -> Result<Option<Shop>, AppError> {
        Ok(self
            .shops
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.shop_url == shop_url)
            .cloned())
    }

    async fn api_key_exists(&self, key_hash: &str) -> Result<bool, AppError> {
        Ok(self.find_shop_by_key_hash(key_hash).await?.is_some())
    }

    async fn create_shop(&self, shop: NewShop) -> Result<Shop, AppError> {
        let now = Utc::now();
        let shop = Shop {
            id: Uuid::new_v4(),
            shop_url: shop.shop_url,
            api_key_hash: shop.api_key_hash,
            api_key_prefix: shop.api_key_prefix,
            filters: None,
            sorts: None,
            current_usage: 0,
            usage_limit: shop.usage_limit,
            subscription_status: SubscriptionStatus::Pending.as_str().to_string(),
            subscription_charge_id: None,
            created_at: now,
            updated_at: now,
        };
        self.shops.lock().unwrap().push(shop.clone());
        Ok(shop)
    }

    async fn set_subscription_status(
        &self,
        shop_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Shop, AppError> {
        self.update_shop(shop_id, |shop| {
            shop.subscription_status = status.as_str().to_string();
        })
    }

    async fn update_settings(
        &self,
        shop_id: Uuid,
        filters: Option<String>,
        sorts: Option<String>,
    ) -> Result<Shop, AppError> {
        self.update_shop(shop_id, |shop| {
            shop.filters = filters;
            shop.sorts = sorts;
        })
    }

    async fn replace_api_key(
        &self,
        shop_id: Uuid,
        key_hash: &str,
        key_prefix: &str,
    ) -> Result<Shop, AppError> {
        self.update_shop(shop_id, |shop| {
            shop.api_key_hash = key_hash.to_string();
            shop.api_key_prefix = key_prefix.to_string();
        })
    }

    async fn increment_usage(&self, shop_id: Uuid) -> Result<i64, AppError> {
        self.check_writable()?;
        let mut shops = self.shops.lock().unwrap();
        let shop = shops
            .iter_mut()
            .find(|s| s.id == shop_id)
            .ok_or(AppError::ShopNotFound)?;
        shop.current_usage += 1;
        Ok(shop.current_usage)
    }

    async fn insert_search_log(&self, log: NewSearchLog) -> Result<SearchLog, AppError> {
        self.check_writable()?;
        let log = SearchLog {
            id: Uuid::new_v4(),
            shop_id: log.shop_id,
            original_query: log.original_query,
            returned_json: log.returned_json,
            created_at: Utc::now(),
        };
        self.logs.lock().unwrap().push(log.clone());
        Ok(log)
    }

    async fn search_logs_since(
        &self,
        shop_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<SearchLog>, AppError> {
        let mut logs: Vec<SearchLog> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.shop_id == shop_id && log.created_at >= since)
            .cloned()
            .collect();
        logs.sort_by_key(|log| log.created_at);
        Ok(logs)
    }

    async fn recent_search_logs(
        &self,
        shop_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SearchLog>, AppError> {
        let mut logs: Vec<SearchLog> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.shop_id == shop_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        logs.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(logs)
    }
}
