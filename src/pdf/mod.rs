//! PDF processing
//!
//! All binary PDF work goes through `lopdf`:
//!
//! - `split`: cut a source calendar into one document per day
//! - `qr_sheet`: lay out QR codes pointing at the per-day downloads
//! - `merge`: stitch day documents back together with separator pages
//! - `builder`: minimal page/document construction shared by the above
//!
//! Everything here is synchronous; async callers wrap it in
//! `tokio::task::spawn_blocking`.

pub mod builder;
pub mod merge;
pub mod qr_sheet;
pub mod split;

pub use builder::{text_width, DocumentBuilder, PageCanvas, A4_HEIGHT, A4_WIDTH};
pub use merge::build_backup;
pub use qr_sheet::{generate_qr_sheet, plan_entries, QrEntry};
pub use split::{day_file_name, parse_day_file_name, split_days, DayFailure, SplitReport};

use thiserror::Error;

/// PDF processing errors
#[derive(Debug, Error)]
pub enum PdfError {
    /// Source bytes are not a loadable PDF
    #[error("Invalid PDF document: {0}")]
    InvalidDocument(String),

    /// A day's page range does not fit the source document
    #[error("Day {day}: {reason}")]
    InvalidRange { day: u32, reason: String },

    /// No day ranges were supplied
    #[error("No days to split")]
    NoDays,

    #[error("PDF error: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("QR code error: {0}")]
    Qr(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// Whether the error stems from the uploaded input rather than the server
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDocument(_) | Self::InvalidRange { .. } | Self::NoDays
        )
    }
}

/// Load a document from memory, mapping parse failures to `InvalidDocument`
pub fn load_document(bytes: &[u8]) -> Result<lopdf::Document, PdfError> {
    lopdf::Document::load_mem(bytes).map_err(|e| PdfError::InvalidDocument(e.to_string()))
}

/// Page count of an in-memory PDF
pub fn page_count(bytes: &[u8]) -> Result<usize, PdfError> {
    Ok(load_document(bytes)?.get_pages().len())
}

// ============================================================================
// Page tree helpers
// ============================================================================

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

pub(crate) fn pages_root_id(doc: &lopdf::Document) -> Result<lopdf::ObjectId, PdfError> {
    Ok(doc.catalog()?.get(b"Pages")?.as_reference()?)
}

/// Hang a page directly under `parent`, keeping what it inherited
///
/// Inherited attributes are copied onto the page first, so the page no
/// longer depends on the intermediate tree nodes it is detached from.
pub(crate) fn reparent_page(
    doc: &mut lopdf::Document,
    page_id: lopdf::ObjectId,
    parent: lopdf::ObjectId,
) -> Result<(), PdfError> {
    let inherited = inherited_attributes(doc, page_id);
    let dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        dict.set(key, value);
    }
    dict.set("Parent", parent);
    Ok(())
}

/// Inheritable attributes the page lacks but an ancestor defines
fn inherited_attributes(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Vec<(&'static str, lopdf::Object)> {
    use lopdf::Object;

    let mut found = Vec::new();
    let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
        return found;
    };

    let mut missing: Vec<&'static str> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key.as_bytes()))
        .collect();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if missing.is_empty() || depth > 64 {
            break;
        }
        let Ok(node) = doc.get_object(parent_id).and_then(Object::as_dict) else {
            break;
        };
        missing.retain(|key| match node.get(key.as_bytes()) {
            Ok(value) => {
                found.push((*key, value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    found
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// An A4 document of `pages` pages, each labelled "Page <n>"
    pub fn sample_pdf(pages: usize) -> Vec<u8> {
        let mut builder = DocumentBuilder::new();
        for n in 1..=pages {
            let mut page = PageCanvas::a4();
            page.draw_text(&format!("Page {n}"), 72.0, 720.0, 24.0);
            builder.add_page(page).unwrap();
        }
        builder.to_bytes().unwrap()
    }

    /// Text drawn on each page of a document, in page order
    pub fn page_labels(bytes: &[u8]) -> Vec<String> {
        let doc = load_document(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let content = doc.get_page_content(page_id).unwrap();
                let content = lopdf::content::Content::decode(&content).unwrap();
                content
                    .operations
                    .iter()
                    .filter(|op| op.operator == "Tj")
                    .filter_map(|op| op.operands.first())
                    .filter_map(|obj| obj.as_str().ok())
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Number of image XObjects in a document
    pub fn image_count(bytes: &[u8]) -> usize {
        let doc = load_document(bytes).unwrap();
        doc.objects
            .values()
            .filter(|obj| match obj {
                lopdf::Object::Stream(stream) => matches!(
                    stream.dict.get(b"Subtype"),
                    Ok(lopdf::Object::Name(name)) if name == b"Image"
                ),
                _ => false,
            })
            .count()
    }
}
