//! Route modules for Advent Server

pub mod download;
pub mod health;
pub mod models;

use axum::{
    body::Body,
    http::{header, StatusCode},
    middleware,
    response::Response,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_basic_auth;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_bytes = state.config().server.max_upload_bytes;

    Router::new()
        .merge(health::router())
        .nest("/api/download", download::router())
        .nest("/api/models", models::router(max_upload_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Inline day PDF, cached for a year
pub(crate) fn pdf_response(data: Vec<u8>, filename: &str) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", filename),
        )
        .header(header::CACHE_CONTROL, "public, max-age=31536000")
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}
