//! Merchant analytics handlers.
//!
//! - GET /api/v1/analytics - 30-day report
//! - GET /api/v1/search-logs - Latest translated searches

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{
    AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::search_log::{SearchLogResponse, SearchLogsParams},
    services::analytics::{self, AnalyticsReport},
};

/// Daily search counts plus top queries, filters and sorts.
pub async fn get_analytics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let report = analytics::load_report(state.repo.as_ref(), auth.shop_id).await?;

    Ok(Json(report))
}

/// Newest first; `?limit=` defaults to 50, capped at 200.
pub async fn list_search_logs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<SearchLogsParams>,
) -> Result<Json<Vec<SearchLogResponse>>, AppError> {
    let logs = state
        .repo
        .recent_search_logs(auth.shop_id, params.limit())
        .await?;

    Ok(Json(logs.into_iter().map(Into::into).collect()))
}
