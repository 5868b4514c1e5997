//! Shop provisioning and merchant settings handlers.
//!
//! - POST /internal/shops - Install (operator token)
//! - GET /api/v1/shop - Shop overview
//! - PUT /api/v1/shop/settings - Save filter and sort vocabulary
//! - POST /api/v1/shop/api-key - Rotate the API key

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::shop::{InstallShopRequest, IssuedKeyResponse, ShopResponse, UpdateSettingsRequest},
    services::shop_service,
};

/// Create a shop, or reset an existing one to `pending`.
///
/// # Response
///
/// - **201 Created**: new shop, body includes the plaintext `api_key`
/// - **200 OK**: shop already existed, no key in the body
/// - **400**: invalid `shop_url`
/// - **401**: bad operator token
pub async fn install_shop(
    State(state): State<AppState>,
    payload: Result<Json<InstallShopRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    let (created, response) = shop_service::install_shop(
        state.repo.as_ref(),
        &request.shop_url,
        state.config.default_usage_limit,
    )
    .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(response)))
}

/// Overview for the merchant dashboard: key prefix, usage and settings.
pub async fn get_shop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ShopResponse>, AppError> {
    let shop = state
        .repo
        .find_shop_by_url(&auth.shop_url)
        .await?
        .ok_or(AppError::ShopNotFound)?;

    Ok(Json(shop.into()))
}

/// Save the vocabulary the translator is given for this shop.
///
/// ```json
/// { "filters": "categoria, cor, tamanho", "sorts": "mais_vendidos" }
/// ```
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> Result<Json<ShopResponse>, AppError> {
    let Json(request) = payload?;

    let shop = shop_service::update_settings(state.repo.as_ref(), auth.shop_id, request).await?;
    tracing::info!(shop_id = %auth.shop_id, "shop settings saved");

    Ok(Json(shop))
}

/// Issue a new API key. The response is the only place it is shown.
pub async fn rotate_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<IssuedKeyResponse>, AppError> {
    let response = shop_service::rotate_api_key(state.repo.as_ref(), auth.shop_id).await?;

    Ok(Json(response))
}
