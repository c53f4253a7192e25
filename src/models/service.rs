//! Model lifecycle
//!
//! Upload runs validate → materialize → split → tokenize → QR-generate.
//! The model directory is staged for the whole pipeline and only committed
//! once the QR sheet is on disk; any error before that removes it.

use std::path::{Path, PathBuf};

use super::name::ModelName;
use super::staging::StagedModelDir;
use super::types::{
    DayDownload, DayEntry, ModelDetail, ModelSummary, UploadFile, UploadOutcome, UploadRequest,
    QR_SHEET, SOURCE_CSV, SOURCE_PDF,
};
use crate::error::{AppError, Result};
use crate::pdf::{self, day_file_name, parse_day_file_name, PdfError};
use crate::schedule::{parse_schedule, DayRange};
use crate::tokens::{TokenStore, TokensFile};

/// Filesystem-backed model management
#[derive(Debug, Clone)]
pub struct ModelService {
    root: PathBuf,
    tokens: TokenStore,
    base_url: String,
}

/// Upload input that passed validation
struct ValidatedUpload {
    name: ModelName,
    pdf: UploadFile,
    csv: UploadFile,
    ranges: Vec<DayRange>,
}

impl ModelService {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            tokens: TokenStore::new(root.clone()),
            root,
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_dir(&self, name: &ModelName) -> PathBuf {
        self.root.join(name.as_str())
    }

    async fn require_model(&self, name: &ModelName) -> Result<PathBuf> {
        let dir = self.model_dir(name);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            _ => Err(AppError::NotFound(format!("Model '{}' not found", name))),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Models that contain at least one day PDF, sorted by name
    pub async fn list_models(&self) -> Result<Vec<ModelSummary>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut models = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let days = match model_day_count(&path).await {
                Ok(Some(days)) => days,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Skipping unreadable model: {}", e);
                    continue;
                }
            };
            if days > 0 {
                models.push(ModelSummary {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    days,
                });
            }
        }

        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }

    /// Day files of a model with their download URLs
    ///
    /// Days with a token get the token URL; others fall back to the direct
    /// per-day URL.
    pub async fn get_model(&self, name: &ModelName) -> Result<ModelDetail> {
        let dir = self.require_model(name).await?;
        let tokens = self.tokens.read_tokens(name.as_str()).await;

        let days: Vec<DayEntry> = day_numbers(&dir)
            .await?
            .into_iter()
            .map(|day| {
                let url = tokens
                    .as_ref()
                    .and_then(|file| file.token_for_day(day))
                    .map(|token| format!("/api/download/{}", token))
                    .unwrap_or_else(|| legacy_day_url(name, day));
                DayEntry {
                    day,
                    filename: day_file_name(day),
                    url,
                }
            })
            .collect();

        Ok(ModelDetail {
            model: name.to_string(),
            total_days: days.len(),
            days,
        })
    }

    /// Bytes of one day's PDF
    pub async fn day_pdf(&self, name: &ModelName, day: u32) -> Result<Vec<u8>> {
        let path = self.model_dir(name).join(day_file_name(day));
        tokio::fs::read(&path).await.map_err(|_| {
            AppError::NotFound(format!("PDF not found for day {} in model {}", day, name))
        })
    }

    /// Resolve a download token to its day PDF
    pub async fn download(&self, token: &str) -> Result<DayDownload> {
        let location = self
            .tokens
            .lookup_token(token)
            .await
            .ok_or_else(|| AppError::NotFound("PDF not found for the provided token".to_string()))?;

        let path = self
            .root
            .join(&location.model)
            .join(day_file_name(location.day));
        let data = tokio::fs::read(&path).await.map_err(|e| {
            tracing::warn!(
                model = %location.model,
                day = location.day,
                "Token resolved but day file is unreadable: {}",
                e
            );
            AppError::NotFound("PDF not found".to_string())
        })?;

        Ok(DayDownload {
            model: location.model,
            day: location.day,
            data,
        })
    }

    /// The stored QR sheet
    pub async fn qr_sheet(&self, name: &ModelName) -> Result<Vec<u8>> {
        let path = self.model_dir(name).join(QR_SHEET);
        tokio::fs::read(&path).await.map_err(|_| {
            AppError::NotFound(format!("QR codes for model '{}' not found", name))
        })
    }

    /// All day PDFs merged with separator pages
    pub async fn backup(&self, name: &ModelName) -> Result<Vec<u8>> {
        let dir = self.require_model(name).await?;
        let days = day_numbers(&dir).await?;
        if days.is_empty() {
            return Err(AppError::NotFound(format!(
                "No PDF files found for model '{}'",
                name
            )));
        }

        let mut parts = Vec::with_capacity(days.len());
        for day in days {
            parts.push((day, tokio::fs::read(dir.join(day_file_name(day))).await?));
        }

        run_blocking(move || pdf::build_backup(&parts)).await
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Remove a model and everything in it
    pub async fn delete_model(&self, name: &ModelName) -> Result<()> {
        let dir = self.require_model(name).await.map_err(|_| {
            AppError::NotFound(format!(
                "Model '{}' not found or could not be deleted",
                name
            ))
        })?;

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!(model = %name, "Model deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                format!("Model '{}' not found or could not be deleted", name),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Rebuild the QR sheet from the model's existing tokens
    ///
    /// Tokens are reused as-is, so printed codes stay valid; only the base
    /// URL and layout are refreshed.
    pub async fn regenerate_qr_codes(&self, name: &ModelName) -> Result<usize> {
        let dir = self.require_model(name).await?;
        let tokens = self.tokens.read_tokens(name.as_str()).await.ok_or_else(|| {
            AppError::BadRequest(format!(
                "No tokens found for model '{}'. Cannot regenerate QR codes.",
                name
            ))
        })?;

        let days = tokens.days().len();
        self.write_qr_sheet(name, &dir, tokens).await?;

        tracing::info!(model = %name, days, "QR codes regenerated");
        Ok(days)
    }

    /// Create a model from an uploaded calendar PDF and day schedule
    ///
    /// Everything after validation runs in a spawned task. Dropping the
    /// returned future (a client disconnect) leaves that task running to
    /// completion, so a model is either fully created or rolled back.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome> {
        let upload = validate_upload(request)?;

        tracing::info!(
            model = %upload.name,
            pdf = %upload.pdf.file_name,
            csv = %upload.csv.file_name,
            days = upload.ranges.len(),
            "Uploading model"
        );

        let service = self.clone();
        tokio::spawn(async move { service.create_model(upload).await })
            .await
            .map_err(|e| AppError::Internal(format!("Upload task failed: {}", e)))?
    }

    /// Stage the model directory, populate it, then commit or roll back
    async fn create_model(&self, upload: ValidatedUpload) -> Result<UploadOutcome> {
        let name = upload.name.clone();
        let staged = StagedModelDir::create(&self.root, &name).await?;

        match self.populate_model(staged.path(), upload).await {
            Ok(outcome) => {
                staged.commit();
                tracing::info!(model = %name, days = outcome.days, "Model created");
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(model = %name, "Upload failed, rolling back: {}", e);
                staged.rollback().await;
                Err(e)
            }
        }
    }

    /// Materialize → split → tokenize → QR-generate inside `dir`
    async fn populate_model(&self, dir: &Path, upload: ValidatedUpload) -> Result<UploadOutcome> {
        let ValidatedUpload {
            name,
            pdf: source_pdf,
            csv: source_csv,
            ranges,
        } = upload;

        tokio::fs::write(dir.join(SOURCE_PDF), &source_pdf.data).await?;
        tokio::fs::write(dir.join(SOURCE_CSV), &source_csv.data).await?;

        let split_dir = dir.to_path_buf();
        let report =
            run_blocking(move || pdf::split_days(&source_pdf.data, &ranges, &split_dir)).await?;
        if report.created.is_empty() {
            let reasons: Vec<String> = report
                .failures
                .iter()
                .map(|f| format!("day {}: {}", f.day, f.reason))
                .collect();
            return Err(AppError::Internal(format!(
                "No day PDFs could be created ({})",
                reasons.join("; ")
            )));
        }

        // Tokens follow the files that actually exist, not the requested days
        let days = day_numbers(dir).await?;
        let tokens = TokensFile::issue_for_days(days.iter().copied());
        self.tokens.write_tokens(name.as_str(), &tokens).await?;
        let token_count = tokens.len();

        self.write_qr_sheet(&name, dir, tokens).await?;

        Ok(UploadOutcome {
            model_name: name.to_string(),
            days: days.len(),
            tokens: token_count,
            skipped_days: report.failures.iter().map(|f| f.day).collect(),
        })
    }

    async fn write_qr_sheet(&self, name: &ModelName, dir: &Path, tokens: TokensFile) -> Result<()> {
        let model = name.to_string();
        let base_url = self.base_url.clone();
        let sheet =
            run_blocking(move || pdf::generate_qr_sheet(&model, &base_url, Some(&tokens))).await?;

        tokio::fs::write(dir.join(QR_SHEET), sheet).await?;
        Ok(())
    }
}

fn validate_upload(request: UploadRequest) -> Result<ValidatedUpload> {
    let name = ModelName::parse(request.model_name.as_deref().unwrap_or(""))?;

    let pdf = request
        .pdf
        .ok_or_else(|| AppError::BadRequest("PDF file is required".to_string()))?;
    if !pdf.is_pdf() {
        return Err(AppError::BadRequest(
            "PDF file must have .pdf extension".to_string(),
        ));
    }

    let csv = request
        .csv
        .ok_or_else(|| AppError::BadRequest("CSV file is required".to_string()))?;
    if !csv.is_csv() {
        return Err(AppError::BadRequest(
            "CSV file must have .csv extension".to_string(),
        ));
    }

    let ranges = parse_schedule(&csv.data)?;
    if ranges.is_empty() {
        return Err(AppError::BadRequest(
            "CSV contains no valid day rows".to_string(),
        ));
    }

    Ok(ValidatedUpload {
        name,
        pdf,
        csv,
        ranges,
    })
}

/// Direct per-day URL used when a day has no token
fn legacy_day_url(name: &ModelName, day: u32) -> String {
    format!(
        "/api/models/{}/{}.pdf",
        urlencoding::encode(name.as_str()),
        day
    )
}

/// Number of day files in `path`, `None` when it is not a directory
async fn model_day_count(path: &Path) -> Result<Option<usize>> {
    if !tokio::fs::metadata(path).await?.is_dir() {
        return Ok(None);
    }
    Ok(Some(day_numbers(path).await?.len()))
}

/// Day numbers of the `day-<N>.pdf` files in `dir`, ascending
pub async fn day_numbers(dir: &Path) -> Result<Vec<u32>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut days = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if let Some(day) = entry.file_name().to_str().and_then(parse_day_file_name) {
            days.push(day);
        }
    }

    days.sort_unstable();
    Ok(days)
}

/// Run PDF work off the async runtime
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, PdfError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("PDF task failed: {}", e)))?
        .map_err(AppError::from)
}
