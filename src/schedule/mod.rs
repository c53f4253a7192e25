//! Day schedule parsing
//!
//! The operator uploads a CSV with the columns
//! `day, step_start, step_end, page_start, page_end` next to the calendar
//! PDF. Rows that do not describe a day (headers repeated mid-file, totals,
//! blank lines) are skipped silently; an empty result is for the caller to
//! reject.

use serde::Serialize;

/// Page interval assigned to one calendar day
///
/// Pages are 1-based and inclusive. Steps are carried through for display
/// and are not used when splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRange {
    pub day: u32,
    pub step_start: i64,
    pub step_end: i64,
    pub page_start: i64,
    pub page_end: i64,
}

impl DayRange {
    /// Number of pages covered, 0 for an inverted range
    pub fn page_count(&self) -> usize {
        if self.page_end < self.page_start {
            0
        } else {
            (self.page_end - self.page_start + 1) as usize
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

const COLUMN_NAMES: [&str; 5] = ["day", "step_start", "step_end", "page_start", "page_end"];

/// Column positions resolved from the header row
///
/// Columns are located by name; a missing name falls back to its
/// conventional position so a file with odd header labels still parses.
#[derive(Debug, Clone, Copy)]
struct ColumnMap([usize; 5]);

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut positions = [0, 1, 2, 3, 4];
        for (slot, name) in COLUMN_NAMES.iter().enumerate() {
            if let Some(idx) = headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
            {
                positions[slot] = idx;
            }
        }
        Self(positions)
    }

    fn field<'r>(&self, record: &'r csv::StringRecord, slot: usize) -> Option<&'r str> {
        record.get(self.0[slot])
    }
}

/// Parse a schedule CSV into day ranges, in file order
pub fn parse_schedule(data: &[u8]) -> Result<Vec<DayRange>, ScheduleError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let columns = ColumnMap::from_headers(reader.headers()?);
    let mut ranges = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(line = line + 2, "Skipping unreadable CSV row: {}", e);
                continue;
            }
        };

        if let Some(range) = parse_row(&columns, &record) {
            ranges.push(range);
        }
    }

    Ok(ranges)
}

fn parse_row(columns: &ColumnMap, record: &csv::StringRecord) -> Option<DayRange> {
    let day = columns.field(record, 0).and_then(parse_leading_int)?;
    if day <= 0 {
        return None;
    }
    let day = u32::try_from(day).ok()?;

    let mut numbers = [0i64; 4];
    for (i, slot) in (1..5).enumerate() {
        numbers[i] = columns.field(record, slot).and_then(parse_leading_int)?;
    }
    let [step_start, step_end, page_start, page_end] = numbers;

    Some(DayRange {
        day,
        step_start,
        step_end,
        page_start,
        page_end,
    })
}

/// Integer prefix of a cell: optional sign then digits, rest ignored
///
/// `"12"`, `" 12 "`, `"12 pages"` and `"12.0"` all read as 12;
/// `"abc"` and `""` do not parse.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (sign, digits) = match s.as_bytes().first()? {
        b'-' => (-1, &s[1..]),
        b'+' => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "day,step_start,step_end,page_start,page_end\n";

    fn parse(body: &str) -> Vec<DayRange> {
        parse_schedule(format!("{HEADER}{body}").as_bytes()).unwrap()
    }

    #[test]
    fn test_parses_rows_in_order() {
        let ranges = parse("1,1,4,1,5\n2,5,9,6,10\n");
        assert_eq!(
            ranges,
            vec![
                DayRange { day: 1, step_start: 1, step_end: 4, page_start: 1, page_end: 5 },
                DayRange { day: 2, step_start: 5, step_end: 9, page_start: 6, page_end: 10 },
            ]
        );
        assert_eq!(ranges[0].page_count(), 5);
    }

    #[test]
    fn test_header_only_yields_nothing() {
        assert!(parse("").is_empty());
        assert!(parse_schedule(b"").unwrap().is_empty());
    }

    #[test]
    fn test_skips_non_numeric_and_zero_days() {
        let ranges = parse("total,,,,\n0,1,1,1,1\nabc,1,1,1,1\n,1,1,1,1\n3,1,1,2,2\n");
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].day, 3);
    }

    #[test]
    fn test_skips_rows_with_bad_numbers() {
        let ranges = parse("1,1,1,x,5\n2,1,1,6,\n3,a,1,1,1\n4,1,1,7,8\n");
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].day, 4);
    }

    #[test]
    fn test_negative_pages_are_kept_for_validation() {
        let ranges = parse("1,1,1,-3,5\n");
        assert_eq!(ranges[0].page_start, -3);
    }

    #[test]
    fn test_columns_located_by_name() {
        let csv = "page_end,page_start,day,step_end,step_start\n10,6,2,9,5\n";
        let ranges = parse_schedule(csv.as_bytes()).unwrap();
        assert_eq!(
            ranges,
            vec![DayRange { day: 2, step_start: 5, step_end: 9, page_start: 6, page_end: 10 }]
        );
    }

    #[test]
    fn test_whitespace_and_crlf() {
        let csv = "Day, Step_Start, Step_End, Page_Start, Page_End\r\n 1 , 1 , 2 , 3 , 4 \r\n";
        let ranges = parse_schedule(csv.as_bytes()).unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].page_start, 3);
        assert_eq!(ranges[0].page_end, 4);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let ranges = parse("1,1\n2,1,1,1,1\n");
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].day, 2);
    }

    #[test]
    fn test_duplicate_days_are_preserved() {
        let ranges = parse("1,1,1,1,2\n1,1,1,3,4\n");
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("12"), Some(12));
        assert_eq!(parse_leading_int(" 12 pages"), Some(12));
        assert_eq!(parse_leading_int("12.9"), Some(12));
        assert_eq!(parse_leading_int("-4"), Some(-4));
        assert_eq!(parse_leading_int("+4"), Some(4));
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("x1"), None);
    }
}
