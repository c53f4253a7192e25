//! QR code sheet generation
//!
//! One QR code per day, six to an A4 page (2 columns × 3 rows), each with a
//! `<Initial>-<day>` label underneath. The encoded payload is
//! `<Initial>-<day>:<base_url>/api/download/<token>`.

use image::{GrayImage, Luma};
use qrcode::QrCode;

use super::builder::{DocumentBuilder, PageCanvas, A4_HEIGHT, A4_WIDTH};
use super::PdfError;
use crate::tokens::TokensFile;

/// Days rendered when no token mapping is supplied
pub const DEFAULT_DAYS: std::ops::RangeInclusive<u32> = 1..=24;

/// Minimum raster size of a QR code, in pixels
pub const QR_PIXELS: u32 = 200;

/// Drawn size of a QR code, in points
pub const QR_SIZE: f32 = 180.0;

const COLUMNS: usize = 2;
const ROWS: usize = 3;
const PER_PAGE: usize = COLUMNS * ROWS;
const MARGIN: f32 = 40.0;
const LABEL_SIZE: f32 = 11.0;

/// A single code to draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrEntry {
    pub day: u32,
    pub label: String,
    pub payload: String,
}

/// Uppercase first character of the model name
pub fn model_initial(model: &str) -> String {
    model
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_default()
}

/// Decide which days get a code and what each code encodes
///
/// With a token mapping, the distinct days of the mapping are used in
/// ascending order, each pointing at its token download URL. Without one,
/// days 1..=24 point at the direct per-day URL.
pub fn plan_entries(model: &str, base_url: &str, tokens: Option<&TokensFile>) -> Vec<QrEntry> {
    let initial = model_initial(model);

    let targets: Vec<(u32, Option<String>)> = match tokens {
        Some(file) => file
            .days()
            .into_iter()
            .map(|day| {
                let url = file
                    .token_for_day(day)
                    .map(|token| format!("{}/api/download/{}", base_url, token));
                (day, url)
            })
            .collect(),
        None => DEFAULT_DAYS
            .map(|day| {
                let url = format!(
                    "{}/api/models/{}/{}.pdf",
                    base_url,
                    urlencoding::encode(model),
                    day
                );
                (day, Some(url))
            })
            .collect(),
    };

    targets
        .into_iter()
        .filter_map(|(day, url)| {
            let Some(url) = url else {
                tracing::warn!(model = %model, day, "No token found for day, skipping");
                return None;
            };
            let label = format!("{}-{}", initial, day);
            Some(QrEntry {
                day,
                payload: format!("{}:{}", label, url),
                label,
            })
        })
        .collect()
}

/// Render a QR code to a greyscale raster, quiet zone included
pub fn qr_raster(payload: &str) -> Result<GrayImage, PdfError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| PdfError::Qr(e.to_string()))?;
    Ok(code
        .render::<Luma<u8>>()
        .min_dimensions(QR_PIXELS, QR_PIXELS)
        .build())
}

/// Lower-left corner of the code in grid slot `slot`
fn slot_origin(slot: usize) -> (f32, f32) {
    let available_width = A4_WIDTH - 2.0 * MARGIN;
    let available_height = A4_HEIGHT - 2.0 * MARGIN;
    let col_spacing = (available_width - COLUMNS as f32 * QR_SIZE) / (COLUMNS as f32 - 1.0);
    let row_spacing =
        (available_height - ROWS as f32 * QR_SIZE - 60.0) / (ROWS as f32 - 1.0);

    let col = (slot % COLUMNS) as f32;
    let row = (slot / COLUMNS) as f32;

    let x = MARGIN + col * (QR_SIZE + col_spacing);
    let top = A4_HEIGHT - MARGIN - (row + 1.0) * QR_SIZE - row * row_spacing - 20.0;
    (x, top - 25.0)
}

/// Lay out entries into a multi-page document
pub fn render_qr_sheet(entries: &[QrEntry]) -> Result<Vec<u8>, PdfError> {
    let mut builder = DocumentBuilder::new();

    for chunk in entries.chunks(PER_PAGE) {
        let mut page = PageCanvas::a4();
        for (slot, entry) in chunk.iter().enumerate() {
            let raster = qr_raster(&entry.payload)?;
            let image = builder.embed_gray_image(&raster);
            let (x, y) = slot_origin(slot);

            page.draw_image(image, x, y, QR_SIZE, QR_SIZE);
            page.draw_text_centered(&entry.label, x + QR_SIZE / 2.0, y - 10.0, LABEL_SIZE);
        }
        builder.add_page(page)?;
    }

    tracing::debug!(
        codes = entries.len(),
        pages = builder.page_count(),
        "Rendered QR sheet"
    );
    builder.to_bytes()
}

/// Build the complete QR sheet for a model
pub fn generate_qr_sheet(
    model: &str,
    base_url: &str,
    tokens: Option<&TokensFile>,
) -> Result<Vec<u8>, PdfError> {
    render_qr_sheet(&plan_entries(model, base_url, tokens))
}
