//! Minimal CSV parsing for the import endpoint.
//!
//! This is a deliberately naive splitter kept faithful to the operator
//! tooling it replaces: lines split on `,`, surrounding double quotes
//! stripped, first line is the header. Embedded commas or newlines inside
//! quoted fields are NOT handled -- a documented limitation of the import
//! format.

/// A parsed CSV document: header names plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDocument {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Split one CSV line on commas, trimming whitespace and surrounding quotes.
fn split_line(line: &str) -> Vec<String> {
    line.split(',')
        .map(|field| {
            let trimmed = field.trim();
            trimmed
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(trimmed)
                .to_string()
        })
        .collect()
}

/// Parse CSV text into headers and rows.
///
/// Blank lines are skipped. Returns `None` when the input has no header
/// line. Rows shorter than the header are padded with empty strings; longer
/// rows are truncated to the header width.
pub fn parse_csv(input: &str) -> Option<CsvDocument> {
    let mut lines = input.lines().filter(|l| !l.trim().is_empty());

    let headers = split_line(lines.next()?);
    let width = headers.len();

    let rows = lines
        .map(|line| {
            let mut fields = split_line(line);
            fields.resize(width, String::new());
            fields
        })
        .collect();

    Some(CsvDocument { headers, rows })
}
