//! Backup document assembly
//!
//! Concatenates day PDFs into one archive, each day preceded by a
//! "Day N" separator page.

use lopdf::{Document, Object, ObjectId};

use super::builder::{save_document, DocumentBuilder, PageCanvas};
use super::{load_document, pages_root_id, reparent_page, PdfError};

const SEPARATOR_FONT_SIZE: f32 = 48.0;
const SEPARATOR_RULE_INSET: f32 = 50.0;

/// Build the separator page that introduces a day
pub fn separator_page(day: u32) -> PageCanvas {
    let mut page = PageCanvas::a4();
    let (width, height) = (page.width(), page.height());

    page.draw_text_centered(
        &format!("Day {}", day),
        width / 2.0,
        (height - SEPARATOR_FONT_SIZE) / 2.0,
        SEPARATOR_FONT_SIZE,
    );
    let rule_y = height / 2.0 - 40.0;
    page.draw_line(
        (SEPARATOR_RULE_INSET, rule_y),
        (width - SEPARATOR_RULE_INSET, rule_y),
        2.0,
    );
    page
}

/// Merge `(day, pdf)` pairs, in the order given, into one document
pub fn build_backup(days: &[(u32, Vec<u8>)]) -> Result<Vec<u8>, PdfError> {
    let mut merged = DocumentBuilder::new().into_document();

    for (day, bytes) in days {
        let mut separator = DocumentBuilder::new();
        separator.add_page(separator_page(*day))?;
        append_document(&mut merged, separator.into_document())?;

        let day_doc = load_document(bytes)?;
        let pages = append_document(&mut merged, day_doc)?;
        tracing::debug!(day = *day, pages, "Appended day to backup");
    }

    merged.prune_objects();
    save_document(merged)
}

/// Move every page of `add` to the end of `base`'s page tree
///
/// Inherited attributes are copied onto each page before it is re-parented,
/// since the intermediate tree nodes of `add` are left behind.
fn append_document(base: &mut Document, mut add: Document) -> Result<usize, PdfError> {
    let base_pages_id = pages_root_id(base)?;

    add.renumber_objects_with(base.max_id + 1);

    let page_ids: Vec<ObjectId> = add.get_pages().into_values().collect();
    for &page_id in &page_ids {
        reparent_page(&mut add, page_id, base_pages_id)?;
    }

    base.max_id = base.max_id.max(add.max_id);
    base.objects.extend(add.objects);

    let pages = base.get_object_mut(base_pages_id)?.as_dict_mut()?;
    let existing = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    let kids = pages.get_mut(b"Kids")?.as_array_mut()?;
    kids.extend(page_ids.iter().copied().map(Object::Reference));
    pages.set("Count", Object::Integer(existing + page_ids.len() as i64));

    Ok(page_ids.len())
}
