//! The accumulated knowledge base.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::verdict::{ValuePattern, Verdict};

/// How a sheet's headers were obtained during training.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HeaderDetectionMethod {
    /// Declared columns or the densest row.
    #[default]
    Basic,
    /// Candidate scoring confirmed by the semantic validator.
    Enhanced,
}

/// Everything learned about one sheet name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetPatterns {
    /// Canonical header to the raw variants it was seen as.
    #[serde(default)]
    pub header_map: BTreeMap<String, BTreeSet<String>>,
    /// Headers observed transitioning from empty to filled.
    #[serde(default)]
    pub columns_to_fill: BTreeSet<String>,
    #[serde(default)]
    pub column_positions: BTreeMap<String, usize>,
    #[serde(default)]
    pub verifications: BTreeMap<String, Verdict>,
    #[serde(default)]
    pub enhanced_patterns: BTreeMap<String, ValuePattern>,
    #[serde(default)]
    pub header_detection_method: HeaderDetectionMethod,
}

impl SheetPatterns {
    pub fn is_fillable(&self, header: &str) -> bool {
        self.columns_to_fill.contains(header)
    }

    /// Record a header variant.
    pub fn add_variant(&mut self, header: impl Into<String>, variant: impl Into<String>) {
        self.header_map
            .entry(header.into())
            .or_default()
            .insert(variant.into());
    }

    pub fn verdict(&self, header: &str) -> Option<&Verdict> {
        self.verifications.get(header)
    }

    pub fn value_pattern(&self, header: &str) -> Option<&ValuePattern> {
        self.enhanced_patterns.get(header)
    }
}

/// Pattern store keyed by sheet name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternStore {
    #[serde(default)]
    pub sheets: BTreeMap<String, SheetPatterns>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetPatterns> {
        self.sheets.get(name)
    }

    /// Mutable access, creating an empty entry if needed.
    pub fn sheet_mut(&mut self, name: &str) -> &mut SheetPatterns {
        self.sheets.entry(name.to_string()).or_default()
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// Total fillable headers across sheets.
    pub fn fillable_count(&self) -> usize {
        self.sheets.values().map(|s| s.columns_to_fill.len()).sum()
    }
}
