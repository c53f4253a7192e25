//! Model management routes
//!
//! Endpoints:
//! - GET    /api/models                               - List models
//! - POST   /api/models/upload                        - Upload PDF + CSV
//! - GET    /api/models/:model                        - Day files and URLs
//! - GET    /api/models/:model/:day                   - Legacy per-day fetch
//! - DELETE /api/models/:model/delete                 - Remove a model
//! - GET    /api/models/:model/qr-codes.get           - Stored QR sheet
//! - POST   /api/models/:model/regenerate-qr-codes    - Rebuild QR sheet
//! - GET    /api/models/:model/pdf-backup             - Merged archive

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use super::pdf_response;
use crate::error::{AppError, Result};
use crate::models::{ModelDetail, ModelName, ModelSummary, UploadFile, UploadRequest};
use crate::pdf::day_file_name;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub model_name: String,
    pub days: usize,
    pub tokens: usize,
    /// Days whose split failed after validation
    pub skipped_days: Vec<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

// ============================================================================
// Router
// ============================================================================

/// Create the models router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_models))
        .route(
            "/upload",
            post(upload_model).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/:model", get(get_model))
        .route("/:model/delete", delete(delete_model))
        .route("/:model/qr-codes.get", get(get_qr_codes))
        .route("/:model/regenerate-qr-codes", post(regenerate_qr_codes))
        .route("/:model/pdf-backup", get(pdf_backup))
        .route("/:model/:day", get(get_day))
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<ModelSummary>>> {
    Ok(Json(state.models().list_models().await?))
}

async fn get_model(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Result<Json<ModelDetail>> {
    let name = ModelName::parse(&model)?;
    Ok(Json(state.models().get_model(&name).await?))
}

/// GET /api/models/:model/:day
///
/// Accepts `3` as well as `3.pdf`.
async fn get_day(
    State(state): State<AppState>,
    Path((model, day)): Path<(String, String)>,
) -> Result<Response> {
    let name = ModelName::parse(&model)?;
    let day = parse_day_segment(&day)?;

    let data = state.models().day_pdf(&name, day).await?;
    pdf_response(data, &day_file_name(day))
}

async fn delete_model(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Result<Json<ActionResponse>> {
    let name = ModelName::parse(&model)?;
    state.models().delete_model(&name).await?;

    Ok(Json(ActionResponse {
        success: true,
        message: format!("Model '{}' deleted successfully", name),
        model_name: None,
    }))
}

async fn get_qr_codes(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Result<Response> {
    let name = ModelName::parse(&model)?;
    let data = state.models().qr_sheet(&name).await?;
    attachment_response(data, &format!("{}-qr-codes.pdf", name))
}

async fn regenerate_qr_codes(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Result<Json<ActionResponse>> {
    let name = ModelName::parse(&model)?;
    state.models().regenerate_qr_codes(&name).await?;

    Ok(Json(ActionResponse {
        success: true,
        message: format!("QR codes regenerated for model '{}'", name),
        model_name: Some(name.to_string()),
    }))
}

async fn pdf_backup(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Result<Response> {
    let name = ModelName::parse(&model)?;
    let data = state.models().backup(&name).await?;
    attachment_response(data, &format!("calendar-{}-backup.pdf", name))
}

/// POST /api/models/upload
///
/// Multipart fields: `modelName` (text), `pdf` and `csv` (files).
async fn upload_model(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(|s| s.to_string());

        tracing::debug!("Received field: name='{}', filename={:?}", name, file_name);

        match name.as_str() {
            "modelName" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read model name: {}", e))
                })?;
                request.model_name = Some(text);
            }
            "pdf" | "csv" => {
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;
                let file = UploadFile::new(file_name.unwrap_or_default(), data.to_vec());
                if name == "pdf" {
                    request.pdf = Some(file);
                } else {
                    request.csv = Some(file);
                }
            }
            _ => tracing::debug!("Ignoring unexpected field '{}'", name),
        }
    }

    let outcome = state.models().upload(request).await?;
    if !outcome.skipped_days.is_empty() {
        tracing::warn!(
            model = %outcome.model_name,
            skipped = ?outcome.skipped_days,
            "Upload completed with skipped days"
        );
    }

    Ok(Json(UploadResponse {
        success: true,
        message: format!(
            "Model '{}' uploaded successfully with {} days",
            outcome.model_name, outcome.days
        ),
        model_name: outcome.model_name,
        days: outcome.days,
        tokens: outcome.tokens,
        skipped_days: outcome.skipped_days,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Day number from a `N` or `N.pdf` path segment
fn parse_day_segment(segment: &str) -> Result<u32> {
    let digits = segment.strip_suffix(".pdf").unwrap_or(segment);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest("Invalid day number".to_string()));
    }
    digits
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid day number".to_string()))
}

fn attachment_response(data: Vec<u8>, filename: &str) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_segment() {
        assert_eq!(parse_day_segment("3").unwrap(), 3);
        assert_eq!(parse_day_segment("24.pdf").unwrap(), 24);
        assert!(parse_day_segment("abc").is_err());
        assert!(parse_day_segment("3.txt").is_err());
        assert!(parse_day_segment(".pdf").is_err());
        assert!(parse_day_segment("-1").is_err());
    }
}
