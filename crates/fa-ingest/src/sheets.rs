//! Data-sheet detection.

use fa_model::{Document, Sheet};

/// Name fragments marking instruction, index or banner sheets.
const NON_DATA_MARKERS: &[&str] = &[
    "instruction",
    "toc",
    "validation",
    "info",
    "confidential",
    "保密",
];

const MIN_DATA_ROWS: usize = 2;
const MIN_COLUMNS: usize = 3;

/// True when the sheet name marks a non-data sheet.
pub fn is_metadata_sheet(name: &str) -> bool {
    let lower = name.to_lowercase();
    NON_DATA_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// True when the sheet has enough rows and columns to analyze.
pub fn has_data_shape(sheet: &Sheet) -> bool {
    sheet.row_count() >= MIN_DATA_ROWS && sheet.column_keys().len() >= MIN_COLUMNS
}

/// Names of sheets eligible for automatic processing, in document order.
pub fn find_data_sheets(document: &Document) -> Vec<String> {
    document
        .sheets
        .iter()
        .filter(|(name, sheet)| !is_metadata_sheet(name) && has_data_shape(sheet))
        .map(|(name, _)| name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, cols: usize) -> Sheet {
        Sheet::from_grid((0..rows).map(|r| (0..cols).map(move |c| format!("{r}-{c}"))))
    }

    #[test]
    fn skips_metadata_and_small_sheets() {
        let mut doc = Document::new();
        doc.insert("Rates", grid(5, 4));
        doc.insert("Instructions", grid(5, 4));
        doc.insert("TOC", grid(5, 4));
        doc.insert("保密声明", grid(5, 4));
        doc.insert("Narrow", grid(5, 2));
        doc.insert("Short", grid(1, 6));
        assert_eq!(find_data_sheets(&doc), vec!["Rates"]);
    }

    #[test]
    fn metadata_markers_are_case_insensitive() {
        assert!(is_metadata_sheet("Validation Notes"));
        assert!(is_metadata_sheet("General INFO"));
        assert!(!is_metadata_sheet("Lane Rates"));
    }
}
