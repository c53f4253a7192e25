//! Per-day PDF splitting
//!
//! The whole batch of ranges is validated against the source page count
//! before anything is written. After that each day is cut independently and
//! a failing day is logged and skipped.

use std::collections::HashSet;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use serde::Serialize;

use super::builder::save_document;
use super::{load_document, pages_root_id, reparent_page, PdfError};
use crate::schedule::DayRange;

/// Outcome of a split run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitReport {
    /// Days whose file was written, in processing order
    pub created: Vec<u32>,
    /// Days that failed after validation
    pub failures: Vec<DayFailure>,
}

impl SplitReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayFailure {
    pub day: u32,
    pub reason: String,
}

/// File name of a day's PDF (`day-<N>.pdf`, no padding)
pub fn day_file_name(day: u32) -> String {
    format!("day-{}.pdf", day)
}

/// Inverse of [`day_file_name`]
pub fn parse_day_file_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("day-")?.strip_suffix(".pdf")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|day| *day > 0)
}

/// Check every range against the source page count
pub fn validate_ranges(ranges: &[DayRange], total_pages: usize) -> Result<(), PdfError> {
    let total = total_pages as i64;
    for range in ranges {
        if range.page_start < 1 || range.page_end < 1 {
            return Err(PdfError::InvalidRange {
                day: range.day,
                reason: format!(
                    "Invalid page numbers (pageStart: {}, pageEnd: {}). Pages must be 1-based.",
                    range.page_start, range.page_end
                ),
            });
        }
        if range.page_start > range.page_end {
            return Err(PdfError::InvalidRange {
                day: range.day,
                reason: format!(
                    "pageStart ({}) is greater than pageEnd ({})",
                    range.page_start, range.page_end
                ),
            });
        }
        if range.page_end > total {
            return Err(PdfError::InvalidRange {
                day: range.day,
                reason: format!(
                    "Page range ({}-{}) exceeds total pages ({})",
                    range.page_start, range.page_end, total
                ),
            });
        }
    }
    Ok(())
}

/// Catalog entries that can point at pages outside the kept range
const PAGE_REFERENCING_CATALOG_KEYS: [&str; 4] = ["Outlines", "Dests", "OpenAction", "StructTreeRoot"];

/// Copy one day's inclusive page range into a standalone document
///
/// The kept pages are hung directly under the root `Pages` node of a copy
/// of the source, then everything no longer reachable is pruned in a single
/// pass. Page order and resources are untouched.
pub fn extract_range(source: &Document, range: &DayRange) -> Result<Vec<u8>, PdfError> {
    let pages = source.get_pages();
    let total = pages.len() as u32;
    let keep = (range.page_start.max(1) as u32)..=(range.page_end.max(0) as u32);
    if keep.is_empty() || *keep.end() > total {
        return Err(PdfError::InvalidRange {
            day: range.day,
            reason: format!("pages {}-{} outside 1-{}", range.page_start, range.page_end, total),
        });
    }
    let kept: Vec<ObjectId> = pages.range(keep).map(|(_, &id)| id).collect();

    let mut doc = source.clone();
    let root_id = pages_root_id(&doc)?;
    for &page_id in &kept {
        reparent_page(&mut doc, page_id, root_id)?;
    }

    let root = doc.get_object_mut(root_id)?.as_dict_mut()?;
    root.set(
        "Kids",
        kept.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
    );
    root.set("Count", Object::Integer(kept.len() as i64));

    let catalog = doc.catalog_mut()?;
    for key in PAGE_REFERENCING_CATALOG_KEYS {
        catalog.remove(key.as_bytes());
    }
    doc.prune_objects();

    let count = doc.get_pages().len();
    if count != range.page_count() {
        return Err(PdfError::InvalidRange {
            day: range.day,
            reason: format!("expected {} pages after copy, got {}", range.page_count(), count),
        });
    }

    save_document(doc)
}

/// Split `source` into `day-<N>.pdf` files under `output_dir`
///
/// Fails as a whole when the source cannot be loaded or any range is
/// invalid. Per-day copy or write failures land in
/// [`SplitReport::failures`]. Repeated days are written in row order, so
/// the last row for a day wins.
pub fn split_days(
    source: &[u8],
    ranges: &[DayRange],
    output_dir: &Path,
) -> Result<SplitReport, PdfError> {
    if ranges.is_empty() {
        return Err(PdfError::NoDays);
    }

    let doc = load_document(source)?;
    let total_pages = doc.get_pages().len();
    tracing::debug!(total_pages, days = ranges.len(), "Loaded source PDF");

    validate_ranges(ranges, total_pages)?;

    let mut report = SplitReport::default();
    let mut seen = HashSet::new();

    for range in ranges {
        if !seen.insert(range.day) {
            tracing::warn!(day = range.day, "Day listed more than once, later row overwrites");
        }

        tracing::debug!(
            day = range.day,
            page_start = range.page_start,
            page_end = range.page_end,
            "Processing day"
        );

        let result = extract_range(&doc, range).and_then(|bytes| {
            std::fs::write(output_dir.join(day_file_name(range.day)), bytes)?;
            Ok(())
        });

        match result {
            Ok(()) => {
                if !report.created.contains(&range.day) {
                    report.created.push(range.day);
                }
            }
            Err(e) => {
                tracing::error!(day = range.day, "Failed to split day: {}", e);
                report.failures.push(DayFailure {
                    day: range.day,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        created = report.created_count(),
        failed = report.failures.len(),
        "Split complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{page_labels, sample_pdf};
    use lopdf::{dictionary, Dictionary, Stream};
    use tempfile::TempDir;

    fn range(day: u32, page_start: i64, page_end: i64) -> DayRange {
        DayRange {
            day,
            step_start: 1,
            step_end: 1,
            page_start,
            page_end,
        }
    }

    /// Pages split across two intermediate `Pages` nodes that carry the
    /// MediaBox, with an outline pointing at the last page
    fn nested_tree_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let root_id = doc.new_object_id();
        let branch_ids = [doc.new_object_id(), doc.new_object_id()];
        let mut kids: [Vec<Object>; 2] = [Vec::new(), Vec::new()];
        let mut last_page = None;

        for n in 1..=pages {
            let branch = usize::from(n > pages / 2);
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                format!("BT (Page {n}) Tj ET").into_bytes(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => branch_ids[branch],
                "Contents" => content_id,
            });
            kids[branch].push(Object::Reference(page_id));
            last_page = Some(page_id);
        }

        for (branch_id, kids) in branch_ids.iter().zip(kids) {
            let count = kids.len() as i64;
            doc.objects.insert(
                *branch_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Pages",
                    "Parent" => root_id,
                    "Kids" => kids,
                    "Count" => Object::Integer(count),
                    "MediaBox" => vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(300),
                        Object::Integer(400),
                    ],
                }),
            );
        }
        doc.objects.insert(
            root_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => branch_ids.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
                "Count" => Object::Integer(pages as i64),
            }),
        );

        let outline_id = doc.add_object(dictionary! {
            "Type" => "Outlines",
            "Dest" => vec![Object::Reference(last_page.unwrap()), Object::Name(b"Fit".to_vec())],
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => root_id,
            "Outlines" => outline_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_day_file_names() {
        assert_eq!(day_file_name(7), "day-7.pdf");
        assert_eq!(parse_day_file_name("day-7.pdf"), Some(7));
        assert_eq!(parse_day_file_name("day-12.pdf"), Some(12));
        assert_eq!(parse_day_file_name("day-0.pdf"), None);
        assert_eq!(parse_day_file_name("day-.pdf"), None);
        assert_eq!(parse_day_file_name("day-x.pdf"), None);
        assert_eq!(parse_day_file_name("day-3.pdf.bak"), None);
        assert_eq!(parse_day_file_name("qr-codes.pdf"), None);
        assert_eq!(parse_day_file_name("day--1.pdf"), None);
    }

    #[test]
    fn test_split_two_days() {
        let dir = TempDir::new().unwrap();
        let source = sample_pdf(10);

        let report = split_days(&source, &[range(1, 1, 5), range(2, 6, 10)], dir.path()).unwrap();
        assert_eq!(report.created, vec![1, 2]);
        assert!(report.failures.is_empty());
        assert_eq!(files_in(dir.path()), vec!["day-1.pdf", "day-2.pdf"]);

        let day1 = std::fs::read(dir.path().join("day-1.pdf")).unwrap();
        let day2 = std::fs::read(dir.path().join("day-2.pdf")).unwrap();
        assert_eq!(
            page_labels(&day1),
            vec!["Page 1", "Page 2", "Page 3", "Page 4", "Page 5"]
        );
        assert_eq!(
            page_labels(&day2),
            vec!["Page 6", "Page 7", "Page 8", "Page 9", "Page 10"]
        );
    }

    #[test]
    fn test_single_page_and_overlapping_ranges() {
        let dir = TempDir::new().unwrap();
        let source = sample_pdf(4);

        let report = split_days(&source, &[range(3, 2, 2), range(9, 1, 4)], dir.path()).unwrap();
        assert_eq!(report.created, vec![3, 9]);

        let day3 = std::fs::read(dir.path().join("day-3.pdf")).unwrap();
        assert_eq!(page_labels(&day3), vec!["Page 2"]);
        let day9 = std::fs::read(dir.path().join("day-9.pdf")).unwrap();
        assert_eq!(page_labels(&day9).len(), 4);
    }

    #[test]
    fn test_range_past_end_rejects_whole_batch() {
        let dir = TempDir::new().unwrap();
        let source = sample_pdf(10);

        let result = split_days(&source, &[range(1, 1, 5), range(2, 6, 11)], dir.path());
        assert!(matches!(result, Err(PdfError::InvalidRange { day: 2, .. })));
        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_start_past_end_rejected() {
        let dir = TempDir::new().unwrap();
        let result = split_days(&sample_pdf(3), &[range(1, 4, 4)], dir.path());
        assert!(matches!(result, Err(PdfError::InvalidRange { .. })));
        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_validate_ranges() {
        assert!(validate_ranges(&[range(1, 1, 3)], 3).is_ok());
        assert!(validate_ranges(&[range(1, 0, 3)], 3).is_err());
        assert!(validate_ranges(&[range(1, 1, -1)], 3).is_err());
        assert!(validate_ranges(&[range(1, 3, 2)], 3).is_err());
        assert!(validate_ranges(&[range(1, 2, 4)], 3).is_err());
        assert!(validate_ranges(&[], 0).is_ok());
    }

    #[test]
    fn test_duplicate_day_last_row_wins() {
        let dir = TempDir::new().unwrap();
        let source = sample_pdf(6);

        let report = split_days(&source, &[range(1, 1, 2), range(1, 5, 6)], dir.path()).unwrap();
        assert_eq!(report.created, vec![1]);

        let day1 = std::fs::read(dir.path().join("day-1.pdf")).unwrap();
        assert_eq!(page_labels(&day1), vec!["Page 5", "Page 6"]);
    }

    #[test]
    fn test_invalid_source() {
        let dir = TempDir::new().unwrap();
        let result = split_days(b"not a pdf", &[range(1, 1, 1)], dir.path());
        assert!(matches!(result, Err(PdfError::InvalidDocument(_))));
    }

    #[test]
    fn test_no_ranges() {
        let dir = TempDir::new().unwrap();
        let result = split_days(&sample_pdf(1), &[], dir.path());
        assert!(matches!(result, Err(PdfError::NoDays)));
    }

    #[test]
    fn test_write_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        // A directory squatting on the output name makes that one write fail
        std::fs::create_dir(dir.path().join("day-2.pdf")).unwrap();

        let report =
            split_days(&sample_pdf(3), &[range(1, 1, 1), range(2, 2, 2), range(3, 3, 3)], dir.path())
                .unwrap();
        assert_eq!(report.created, vec![1, 3]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].day, 2);
    }

    #[test]
    fn test_nested_page_tree_is_flattened() {
        let source = load_document(&nested_tree_pdf(6)).unwrap();

        let bytes = extract_range(&source, &range(1, 2, 4)).unwrap();
        assert_eq!(page_labels(&bytes), vec!["Page 2", "Page 3", "Page 4"]);

        let doc = load_document(&bytes).unwrap();
        let root_id = pages_root_id(&doc).unwrap();
        let root = doc.get_object(root_id).unwrap().as_dict().unwrap();
        assert_eq!(root.get(b"Kids").unwrap().as_array().unwrap().len(), 3);
        assert_eq!(root.get(b"Count").unwrap().as_i64().unwrap(), 3);

        for page_id in doc.get_pages().into_values() {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), root_id);
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            assert_eq!(media_box[3].as_i64().unwrap(), 400);
        }

        // The outline targets page 6, which is not part of this day
        assert!(!doc.catalog().unwrap().has(b"Outlines"));
    }

    #[test]
    fn test_day_document_does_not_carry_other_pages() {
        let small = load_document(&sample_pdf(10)).unwrap();
        let large = load_document(&sample_pdf(200)).unwrap();

        let from_small = load_document(&extract_range(&small, &range(1, 1, 1)).unwrap()).unwrap();
        let from_large = load_document(&extract_range(&large, &range(1, 1, 1)).unwrap()).unwrap();
        assert_eq!(from_small.objects.len(), from_large.objects.len());
    }

    #[test]
    fn test_many_days_from_long_source() {
        let dir = TempDir::new().unwrap();
        let source = sample_pdf(400);
        let ranges: Vec<DayRange> = (1..=24)
            .map(|day| range(day, 1 + (day as i64 - 1) * 16, day as i64 * 16))
            .collect();

        let report = split_days(&source, &ranges, dir.path()).unwrap();
        assert_eq!(report.created.len(), 24);

        let day24 = std::fs::read(dir.path().join("day-24.pdf")).unwrap();
        let labels = page_labels(&day24);
        assert_eq!(labels.len(), 16);
        assert_eq!(labels[0], "Page 369");
        assert_eq!(labels[15], "Page 384");
    }
}
