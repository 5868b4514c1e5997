//! Storefront translation endpoint.
//!
//! `POST /api/translate` is the only route shoppers' browsers call. It is
//! CORS-open, authenticated by `X-API-Key`, and always answers a valid key
//! with a structured query, degraded or not.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppError,
    middleware::auth::StorefrontShop,
    models::structured_query::StructuredQuery,
    services::translation_service,
};

/// Request body for `POST /api/translate`.
///
/// ```json
/// { "query": "tênis de corrida azul tamanho 42" }
/// ```
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub query: String,
}

/// Translate a shopper's query.
///
/// # Response
///
/// - **Success (200 OK)**: the structured query (fallback included)
/// - **Error (400)**: empty query
/// - **Error (403)**: API key missing or unknown, nothing recorded
///
/// ```json
/// {
///   "categoria": "tênis",
///   "cor": "azul",
///   "tamanho": "42",
///   "atributos": ["de corrida"]
/// }
/// ```
pub async fn translate(
    State(state): State<AppState>,
    StorefrontShop(shop): StorefrontShop,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<StructuredQuery>, AppError> {
    let Json(request) = payload?;

    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidRequest("query must not be empty".to_string()));
    }

    tracing::info!(shop_id = %shop.id, shop_url = %shop.shop_url, "translating storefront query");

    let structured =
        translation_service::translate_for_shop(state.repo.as_ref(), &state.translator, &shop, query)
            .await;

    Ok(Json(structured))
}

/// CORS preflight and plain GET probes.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Any method other than POST, GET or OPTIONS.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
