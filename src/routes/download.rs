//! Public token downloads
//!
//! `GET /api/download/:token` is the URL printed in every QR code. It is the
//! only file route reachable without credentials.

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};

use super::pdf_response;
use crate::error::{AppError, Result};
use crate::pdf::day_file_name;
use crate::state::AppState;
use crate::tokens::is_valid_token;

/// Create the download router
pub fn router() -> Router<AppState> {
    Router::new().route("/:token", get(download))
}

async fn download(State(state): State<AppState>, Path(token): Path<String>) -> Result<Response> {
    if !is_valid_token(&token) {
        return Err(AppError::BadRequest("Invalid token format".to_string()));
    }

    let download = state.models().download(&token).await?;
    tracing::debug!(model = %download.model, day = download.day, "Serving token download");

    pdf_response(download.data, &day_file_name(download.day))
}
