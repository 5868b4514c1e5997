//! CORS headers for storefront-facing routes.
//!
//! The translation endpoint is called from arbitrary storefront domains, so
//! every response on it (including 403 and 405) carries permissive headers.

use axum::{
    http::{HeaderValue, header},
    response::Response,
};

pub const ALLOWED_METHODS: &str = "POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, X-API-Key";

/// `map_response` layer function adding the CORS headers.
pub async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}
