//! Search log models.
//!
//! One row per translation call, written after the translator returns
//! (including fallback results) and never updated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a search log record from the database.
///
/// # Database Table
///
/// Maps to the `search_logs` table, many rows per shop.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchLog {
    pub id: Uuid,
    pub shop_id: Uuid,

    /// Query exactly as the shopper typed it
    pub original_query: String,

    /// Pretty-printed structured query returned to the storefront
    pub returned_json: String,

    pub created_at: DateTime<Utc>,
}

/// Values for a new log row.
#[derive(Debug, Clone)]
pub struct NewSearchLog {
    pub shop_id: Uuid,
    pub original_query: String,
    pub returned_json: String,
}

/// Query string for `GET /api/v1/search-logs`.
#[derive(Debug, Deserialize)]
pub struct SearchLogsParams {
    pub limit: Option<i64>,
}

impl SearchLogsParams {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

/// Response body for one log entry.
///
/// `returned_json` is re-parsed so clients get an object rather than a
/// string; rows that do not parse are passed through as a JSON string.
#[derive(Debug, Serialize)]
pub struct SearchLogResponse {
    pub id: Uuid,
    pub original_query: String,
    pub returned_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<SearchLog> for SearchLogResponse {
    fn from(log: SearchLog) -> Self {
        let returned_json = serde_json::from_str(&log.returned_json)
            .unwrap_or(serde_json::Value::String(log.returned_json));

        Self {
            id: log.id,
            original_query: log.original_query,
            returned_json,
            created_at: log.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(SearchLogsParams { limit: None }.limit(), 50);
        assert_eq!(SearchLogsParams { limit: Some(0) }.limit(), 1);
        assert_eq!(SearchLogsParams { limit: Some(10_000) }.limit(), 200);
    }

    #[test]
    fn test_response_parses_stored_json() {
        let log = SearchLog {
            id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            original_query: "camisa".to_string(),
            returned_json: "{\n  \"atributos\": [\"camisa\"]\n}".to_string(),
            created_at: Utc::now(),
        };

        let response = SearchLogResponse::from(log);
        assert_eq!(response.returned_json["atributos"][0], "camisa");
    }
}
