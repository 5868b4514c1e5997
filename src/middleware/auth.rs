//! Request authentication.
//!
//! Three credentials are accepted, one per audience:
//!
//! - **Storefront**: `X-API-Key: <shop key>` on the translation endpoint,
//!   resolved by the [`StorefrontShop`] extractor. Rejected with 403.
//! - **Merchant**: `Authorization: Bearer <shop key>` on `/api/v1/*`,
//!   resolved by [`merchant_auth_middleware`] into an [`AuthContext`].
//!   Rejected with 401.
//! - **Operator**: `Authorization: Bearer <INSTALL_TOKEN>` on
//!   `/internal/*`, checked by [`install_token_middleware`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{AppState, error::AppError, models::api_key::hash_api_key, models::shop::Shop};

/// Header the storefront interceptor sends its key in.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication context attached to merchant requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Used to scope every query to the authenticated shop
    pub shop_id: Uuid,

    pub shop_url: String,
}

/// Shop resolved from the `X-API-Key` header.
///
/// Runs before the body is read, so an unknown key is rejected before any
/// side effect or body parsing.
#[derive(Debug, Clone)]
pub struct StorefrontShop(pub Shop);

impl FromRequestParts<AppState> for StorefrontShop {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let api_key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|h| h.to_str().ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                tracing::debug!("translation rejected: api key not provided");
                AppError::InvalidApiKey
            })?;

        let shop = state
            .repo
            .find_shop_by_key_hash(&hash_api_key(api_key))
            .await?
            .ok_or_else(|| {
                tracing::debug!("translation rejected: unknown api key");
                AppError::InvalidApiKey
            })?;

        Ok(StorefrontShop(shop))
    }
}

/// Merchant API key authentication middleware.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <key>` header from request
/// 2. Hash the key using SHA-256
/// 3. Look up the shop owning that hash
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized
pub async fn merchant_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let shop = state
        .repo
        .find_shop_by_key_hash(&hash_api_key(api_key))
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthContext {
        shop_id: shop.id,
        shop_url: shop.shop_url,
    });

    Ok(next.run(request).await)
}

/// Operator token check for provisioning routes.
///
/// Only mounted when `INSTALL_TOKEN` is configured.
pub async fn install_token_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state
        .config
        .install_token
        .as_deref()
        .ok_or(AppError::Unauthorized)?;

    let provided = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    if !constant_time_compare(provided, expected) {
        tracing::warn!("install token rejected");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Extract `<token>` from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
