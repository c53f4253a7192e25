//! Model types

use serde::Serialize;

/// Source PDF kept next to the split output
pub const SOURCE_PDF: &str = "source.pdf";

/// Source CSV kept next to the split output
pub const SOURCE_CSV: &str = "source.csv";

/// Generated QR sheet
pub const QR_SHEET: &str = "qr-codes.pdf";

/// Entry in the model listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub days: usize,
}

/// A day file and where it can be downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayEntry {
    pub day: u32,
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetail {
    pub model: String,
    pub days: Vec<DayEntry>,
    pub total_days: usize,
}

/// An uploaded file part
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    fn has_extension(&self, ext: &str) -> bool {
        self.file_name.to_ascii_lowercase().ends_with(ext)
    }

    pub fn is_pdf(&self) -> bool {
        self.has_extension(".pdf")
    }

    pub fn is_csv(&self) -> bool {
        self.has_extension(".csv")
    }
}

/// Everything the upload form may carry; validation happens in the service
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub model_name: Option<String>,
    pub pdf: Option<UploadFile>,
    pub csv: Option<UploadFile>,
}

/// Result of a completed upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub model_name: String,
    /// Day PDFs produced
    pub days: usize,
    /// Tokens issued
    pub tokens: usize,
    /// Days whose split failed and were skipped
    pub skipped_days: Vec<u32>,
}

/// A resolved download
#[derive(Debug, Clone)]
pub struct DayDownload {
    pub model: String,
    pub day: u32,
    pub data: Vec<u8>,
}
