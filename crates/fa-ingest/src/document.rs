//! JSON document loading.
//!
//! Extracted workbooks arrive as `{sheet: {columns: [..], data: [{col: value}]}}`.
//! Cell values may be any JSON scalar; they are stringified on load so the
//! rest of the pipeline only deals with text.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use fa_model::{Document, Row, Sheet};

use crate::error::{IngestError, Result};

/// Read and parse a document from disk.
pub fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&text, path)
}

/// Parse document JSON. `path` is only used for error context.
pub fn parse_document(text: &str, path: &Path) -> Result<Document> {
    let value: Value = serde_json::from_str(text).map_err(|source| IngestError::DocumentParse {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Object(entries) = value else {
        return Err(IngestError::DocumentLayout {
            path: path.to_path_buf(),
            reason: "top level is not an object".to_string(),
        });
    };

    let mut document = Document::new();
    for (name, entry) in entries {
        let Value::Object(sheet) = entry else {
            debug!(sheet = %name, "skipping non-table entry");
            continue;
        };
        document.insert(name, sheet_from_json(&sheet));
    }
    Ok(document)
}

fn sheet_from_json(object: &Map<String, Value>) -> Sheet {
    let columns = match object.get("columns") {
        Some(Value::Array(items)) => items.iter().map(cell_text).collect(),
        _ => Vec::new(),
    };
    let rows = match object.get("data") {
        Some(Value::Array(items)) => items.iter().map(row_from_json).collect(),
        _ => Vec::new(),
    };
    Sheet::new(columns, rows)
}

fn row_from_json(value: &Value) -> Row {
    match value {
        Value::Object(cells) => cells
            .iter()
            .map(|(key, cell)| (key.clone(), cell_text(cell)))
            .collect(),
        other => {
            warn!(kind = json_kind(other), "row is not an object; treating as empty");
            Row::new()
        }
    }
}

/// Stringify a JSON scalar the way it appears in the source sheet.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
