//! Vertere Search - AI storefront search for Shopify merchants.
//!
//! Shoppers type free text into the storefront search box; the storefront
//! interceptor sends it here, an LLM turns it into Shopify filters, and the
//! shopper lands on a filtered `/search` page. Merchants get usage and
//! analytics over the same data.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, behind the [`repository::Repository`] trait
//! - **Translation**: OpenAI-compatible chat completion API via reqwest
//! - **Authentication**: per-shop API key, stored as a SHA-256 hash
//! - **Storefront**: [`interceptor`] turns form submissions into search URLs

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod interceptor;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use config::Config;
use repository::Repository;
use services::translator::Translator;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub translator: Arc<Translator>,
    pub config: Arc<Config>,
}

/// Build the HTTP router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Called from storefront pages on any domain
    let storefront_routes = Router::new()
        .route(
            "/api/translate",
            post(handlers::translate::translate)
                .get(handlers::translate::preflight)
                .options(handlers::translate::preflight)
                .fallback(handlers::translate::method_not_allowed),
        )
        .layer(axum_middleware::map_response(
            middleware::cors::add_cors_headers,
        ));

    // Merchant dashboard API, authenticated with the shop's own key
    let merchant_routes = Router::new()
        .route("/api/v1/shop", get(handlers::shops::get_shop))
        .route(
            "/api/v1/shop/settings",
            put(handlers::shops::update_settings),
        )
        .route(
            "/api/v1/shop/api-key",
            post(handlers::shops::rotate_api_key),
        )
        .route("/api/v1/analytics", get(handlers::analytics::get_analytics))
        .route(
            "/api/v1/search-logs",
            get(handlers::analytics::list_search_logs),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::merchant_auth_middleware,
        ));

    let mut app = Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/validate-key",
            post(handlers::validate_key::validate_key)
                .fallback(handlers::translate::method_not_allowed),
        )
        .merge(storefront_routes)
        .merge(merchant_routes);

    if state.config.install_token.is_some() {
        let operator_routes = Router::new()
            .route("/internal/shops", post(handlers::shops::install_shop))
            .route_layer(axum_middleware::from_fn_with_state(
                state.clone(),
                middleware::auth::install_token_middleware,
            ));
        app = app.merge(operator_routes);
    } else {
        tracing::info!("INSTALL_TOKEN not set, shop provisioning route disabled");
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
