//! Spreadsheet documents as extracted to JSON.
//!
//! A document maps sheet names to sheets. Each sheet carries an ordered list
//! of column identifiers and rows keyed by those identifiers. Cells are kept
//! as strings; an absent cell reads as the empty string.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One row of a sheet, keyed by column identifier.
pub type Row = BTreeMap<String, String>;

/// A named collection of sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub sheets: BTreeMap<String, Sheet>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a sheet.
    pub fn insert(&mut self, name: impl Into<String>, sheet: Sheet) {
        self.sheets.insert(name.into(), sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }
}

/// A table of raw cell values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Column identifiers as declared by the extractor (may be empty).
    #[serde(default)]
    pub columns: Vec<String>,
    /// Data rows in document order.
    #[serde(default, rename = "data")]
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Build a sheet from positional string rows, naming columns `col_0..`.
    pub fn from_grid<R, C>(grid: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows: Vec<Vec<String>> = grid
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let columns: Vec<String> = (0..width).map(generic_column).collect();
        let rows = rows
            .into_iter()
            .map(|values| {
                columns
                    .iter()
                    .cloned()
                    .zip(values)
                    .filter(|(_, value)| !value.is_empty())
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// True when the extractor declared column identifiers.
    pub fn has_declared_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Declared columns, or the identifiers observed across rows when none
    /// were declared (`col_N` keys ordered by their numeric suffix).
    pub fn column_keys(&self) -> Vec<String> {
        if self.has_declared_columns() {
            return self.columns.clone();
        }
        let keys: BTreeSet<&String> = self.rows.iter().flat_map(|row| row.keys()).collect();
        let mut keys: Vec<String> = keys.into_iter().cloned().collect();
        keys.sort_by(|a, b| column_sort_key(a).cmp(&column_sort_key(b)));
        keys
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell text at `row`/`column`, or `""` when absent.
    pub fn cell(&self, row: usize, column: &str) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map_or("", String::as_str)
    }
}

/// Generic identifier for the column at `index`.
pub fn generic_column(index: usize) -> String {
    format!("col_{index}")
}

/// Position encoded in a generic `col_N` identifier.
pub fn generic_column_index(column: &str) -> Option<usize> {
    column.strip_prefix("col_")?.parse().ok()
}

fn column_sort_key(column: &str) -> (usize, &str) {
    (generic_column_index(column).unwrap_or(usize::MAX), column)
}
