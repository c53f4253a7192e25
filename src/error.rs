//! Error types for the Advent server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::InvalidModelName;
use crate::pdf::PdfError;
use crate::schedule::ScheduleError;
use crate::tokens::TokenError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid model name: {0}")]
    InvalidModelName(#[from] InvalidModelName),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Token error: {0}")]
    Tokens(#[from] TokenError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::InvalidModelName(_) | AppError::Schedule(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Pdf(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            AppError::Pdf(_) | AppError::Tokens(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_type, message) = match &self {
            AppError::NotFound(msg) => ("not_found", msg.clone()),
            AppError::BadRequest(msg) => ("bad_request", msg.clone()),
            AppError::Conflict(msg) => ("conflict", msg.clone()),
            AppError::InvalidModelName(e) => ("bad_request", e.to_string()),
            AppError::Schedule(e) => ("bad_request", e.to_string()),
            AppError::Pdf(e) if e.is_input_error() => ("bad_request", e.to_string()),
            AppError::Pdf(e) => {
                tracing::error!("PDF error: {}", e);
                ("pdf_error", e.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("internal_error", "An internal error occurred".to_string())
            }
            AppError::Tokens(e) => {
                tracing::error!("Token store error: {}", e);
                ("storage_error", "Failed to persist tokens".to_string())
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                ("io_error", "IO error".to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
