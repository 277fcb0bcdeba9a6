//! Basic header detection.
//!
//! Declared columns win outright. Sheets without declared columns fall back
//! to the densest row, preferring rows whose values contain punctuation or
//! spaces, which data rows rarely do.

use std::cmp::Reverse;
use std::ops::Range;

use fa_model::{Row, Sheet, normalize_header};

/// Headers chosen for a sheet and where the data starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicHeaders {
    /// Normalized header per column position.
    pub headers: Vec<String>,
    /// Row holding the headers; `None` when they came from declared columns.
    pub header_row: Option<usize>,
}

impl BasicHeaders {
    /// Rows after the header row.
    pub fn data_rows<'a>(&self, sheet: &'a Sheet) -> &'a [Row] {
        match self.header_row {
            None => &sheet.rows,
            Some(index) => sheet.rows.get(index + 1..).unwrap_or(&[]),
        }
    }

    /// Combined character length of all headers.
    pub fn total_len(&self) -> usize {
        self.headers.iter().map(|h| h.chars().count()).sum()
    }

    pub fn header(&self, position: usize) -> &str {
        self.headers.get(position).map_or("", String::as_str)
    }
}

/// Detect headers for a sheet. The earliest row wins ties.
pub fn detect_header_row(sheet: &Sheet) -> BasicHeaders {
    if sheet.has_declared_columns() {
        return BasicHeaders {
            headers: sheet.columns.iter().map(|c| normalize_header(c)).collect(),
            header_row: None,
        };
    }
    let keys = sheet.column_keys();
    let best = sheet
        .rows
        .iter()
        .enumerate()
        // Equal ranks go to the earliest row rather than the last one; data
        // rows below the headers often tie them on density.
        .map(|(index, row)| (row_rank(row, &keys), Reverse(index)))
        .max();
    match best {
        Some((_, Reverse(index))) => BasicHeaders {
            headers: keys
                .iter()
                .map(|key| normalize_header(sheet.cell(index, key)))
                .collect(),
            header_row: Some(index),
        },
        None => BasicHeaders {
            headers: Vec::new(),
            header_row: None,
        },
    }
}

/// Positions carrying values; position 0 holds the row label.
pub fn value_columns(headers: &[String]) -> Range<usize> {
    1..headers.len().max(1)
}

/// (non-empty count, values containing punctuation or whitespace)
fn row_rank(row: &Row, keys: &[String]) -> (usize, usize) {
    let values: Vec<&str> = keys
        .iter()
        .filter_map(|key| row.get(key))
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
        .collect();
    let richness = values
        .iter()
        .filter(|value| {
            value
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '*' | '/' | '-'))
        })
        .count();
    (values.len(), richness)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_columns_are_headers() {
        let sheet = Sheet::new(
            vec!["Lane ID".to_string(), " Origin  Port".to_string()],
            Vec::new(),
        );
        let detected = detect_header_row(&sheet);
        assert_eq!(detected.headers, vec!["lane id", "origin port"]);
        assert_eq!(detected.header_row, None);
    }

    #[test]
    fn densest_row_wins_without_declared_columns() {
        let mut sheet = Sheet::from_grid([
            vec!["Quote", "", ""],
            vec!["Lane", "Rate (USD)", "Transit days"],
            vec!["1", "100", "3"],
        ]);
        sheet.columns.clear();
        let detected = detect_header_row(&sheet);
        assert_eq!(detected.header_row, Some(1));
        assert_eq!(detected.headers, vec!["lane", "rate (usd)", "transit days"]);
        assert_eq!(detected.data_rows(&sheet).len(), 1);
    }

    #[test]
    fn equal_rank_picks_earliest_row() {
        let mut sheet = Sheet::from_grid([
            vec!["Lane", "Origin", "Rate"],
            vec!["1", "CNSHA", "100"],
            vec!["2", "CNNGB", "120"],
        ]);
        sheet.columns.clear();
        let detected = detect_header_row(&sheet);
        assert_eq!(detected.header_row, Some(0));
        assert_eq!(detected.headers, vec!["lane", "origin", "rate"]);
    }

    #[test]
    fn value_columns_skip_row_label() {
        let headers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(value_columns(&headers), 1..3);
        assert!(value_columns(&[]).is_empty());
    }
}
