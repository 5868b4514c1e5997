//! Translation request flow for an authenticated shop.
//!
//! # Process
//!
//! 1. Increment the shop's usage counter
//! 2. Translate the query with the shop's vocabulary
//! 3. Strip undeclared keys, then enforce filter precedence
//! 4. Append the search log entry
//!
//! Steps 1 and 4 are best effort: a storage failure is logged and the
//! shopper still gets the structured query.

use crate::models::search_log::NewSearchLog;
use crate::models::shop::Shop;
use crate::models::structured_query::{FilterVocabulary, StructuredQuery};
use crate::repository::Repository;
use crate::services::translator::Translator;

pub async fn translate_for_shop(
    repo: &dyn Repository,
    translator: &Translator,
    shop: &Shop,
    query: &str,
) -> StructuredQuery {
    match repo.increment_usage(shop.id).await {
        Ok(usage) if usage > shop.usage_limit => {
            // Not enforced: the search still goes through
            tracing::warn!(shop_id = %shop.id, usage, limit = shop.usage_limit, "usage limit exceeded");
        }
        Ok(usage) => tracing::debug!(shop_id = %shop.id, usage, "usage incremented"),
        Err(e) => tracing::error!(shop_id = %shop.id, error = %e, "failed to increment usage"),
    }

    let mut structured = translator
        .translate(query, shop.filters.as_deref(), shop.sorts.as_deref())
        .await;

    let removed = structured.retain_vocabulary(&FilterVocabulary::parse(shop.filters.as_deref()));
    if !removed.is_empty() {
        tracing::debug!(shop_id = %shop.id, keys = ?removed, "stripped undeclared filter keys");
    }
    structured.enforce_precedence();

    record_search(repo, shop, query, &structured).await;

    structured
}

async fn record_search(repo: &dyn Repository, shop: &Shop, query: &str, structured: &StructuredQuery) {
    let returned_json = match serde_json::to_string_pretty(structured) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(shop_id = %shop.id, error = %e, "failed to serialize search log");
            return;
        }
    };

    let log = NewSearchLog {
        shop_id: shop.id,
        original_query: query.to_string(),
        returned_json,
    };

    match repo.insert_search_log(log).await {
        Ok(saved) => tracing::debug!(shop_id = %shop.id, log_id = %saved.id, "search log saved"),
        Err(e) => tracing::error!(shop_id = %shop.id, error = %e, "failed to save search log"),
    }
}
