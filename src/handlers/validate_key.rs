//! API key validation for the theme extension settings screen.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::AppError, models::api_key::hash_api_key};

/// ```json
/// { "apiKey": "vtr_4f1c..." }
/// ```
#[derive(Debug, Deserialize)]
pub struct ValidateKeyRequest {
    #[serde(default, rename = "apiKey", alias = "api_key")]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateKeyResponse {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
}

/// Check whether a key belongs to some shop.
///
/// # Response
///
/// - **Success (200 OK)**: `{"isValid": true|false}`
/// - **Error (400)**: `apiKey` missing or blank
/// - **Error (500)**: database error
pub async fn validate_key(
    State(state): State<AppState>,
    payload: Result<Json<ValidateKeyRequest>, JsonRejection>,
) -> Result<Json<ValidateKeyResponse>, AppError> {
    let Json(request) = payload?;

    let api_key = request
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("API Key is missing".to_string()))?;

    let is_valid = state.repo.api_key_exists(&hash_api_key(api_key)).await?;

    Ok(Json(ValidateKeyResponse { is_valid }))
}
