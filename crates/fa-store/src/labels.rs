//! Manual label corrections.
//!
//! A labels file maps sheet names to `column_labels`, each a raw header and
//! the label a user assigned to it. Applying it marks every listed header
//! fillable with a `user` verdict, overriding anything learned.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use fa_model::{PatternStore, Verdict};

use crate::error::{Result, StoreError};
use crate::io::load_json;

/// Labels supplied for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLabels {
    #[serde(default)]
    pub column_labels: BTreeMap<String, String>,
}

/// User label file: sheet name to labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelUpdates {
    pub sheets: BTreeMap<String, SheetLabels>,
}

impl LabelUpdates {
    /// Read a labels file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)?.ok_or_else(|| StoreError::Io {
            operation: "read labels",
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }

    pub fn label_count(&self) -> usize {
        self.sheets.values().map(|s| s.column_labels.len()).sum()
    }
}

/// Apply user labels to `store`, returning how many headers were updated.
pub fn apply_label_updates(store: &mut PatternStore, updates: &LabelUpdates) -> usize {
    let mut applied = 0;
    for (sheet_name, labels) in &updates.sheets {
        let patterns = store.sheet_mut(sheet_name);
        for (raw, label) in &labels.column_labels {
            patterns.add_variant(raw.clone(), raw.clone());
            patterns.columns_to_fill.insert(raw.clone());
            patterns
                .verifications
                .insert(raw.clone(), Verdict::user(label.clone()));
            debug!(sheet = %sheet_name, header = %raw, label = %label, "applied user label");
            applied += 1;
        }
    }
    applied
}
