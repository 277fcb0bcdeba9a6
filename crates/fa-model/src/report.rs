//! Identification report types.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Final call on a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Fill,
    Unknown,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fill => f.write_str("fill"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Decision and provenance for one analyzed column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDecision {
    pub position: usize,
    pub header: String,
    pub label: String,
    pub confidence: f64,
    pub verified_by: String,
    pub decision: Decision,
    pub learned_fillable: bool,
    pub decision_factors: Vec<String>,
    pub enhanced_header: bool,
    /// Learned sheets that produced a candidate (cross-sheet only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source_patterns: Vec<String>,
}

/// How the headers of an analyzed sheet were obtained.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeaderEnhancement {
    /// Validated headers replaced the basic ones.
    pub enhanced: bool,
    pub confidence: f64,
    /// `validated`, `unavailable`, `malformed` or `not_requested`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Number of header-row candidates offered to the validator.
    pub candidates: usize,
    pub original_headers: Vec<String>,
}

/// Per-sheet identification output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReport {
    /// Columns decided `fill`.
    pub columns: Vec<ColumnDecision>,
    /// Columns left `unknown`.
    pub unknowns: Vec<ColumnDecision>,
    pub total_headers: usize,
    pub analyzed_columns: usize,
    pub header_enhancement: HeaderEnhancement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_sheet_patterns_used: Option<usize>,
}

impl SheetReport {
    /// Mean confidence of `fill` columns, if any.
    pub fn mean_fill_confidence(&self) -> Option<f64> {
        if self.columns.is_empty() {
            return None;
        }
        let total: f64 = self.columns.iter().map(|c| c.confidence).sum();
        Some(total / self.columns.len() as f64)
    }

    /// Fill count weighted by mean fill confidence.
    pub fn score(&self) -> f64 {
        self.mean_fill_confidence()
            .map_or(0.0, |mean| self.columns.len() as f64 * mean)
    }
}

/// Outcome of one requested or detected sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SheetOutcome {
    Analyzed(SheetReport),
    Error { error: String },
}

impl SheetOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn report(&self) -> Option<&SheetReport> {
        match self {
            Self::Analyzed(report) => Some(report),
            Self::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Which identification pass produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifyStrategy {
    CrossSheet,
    SheetFirst,
}

/// Report-level failure when no sheet could be selected at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportError {
    pub message: String,
    pub available_sheets: Vec<String>,
    pub learned_sheets: Vec<String>,
}

/// Aggregate counts across sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub sheets_processed: usize,
    pub total_fillable_columns: usize,
    pub total_unknown_columns: usize,
    pub sheet_errors: usize,
    pub patterns_analyzed: usize,
    pub best_sheet: Option<String>,
    pub best_sheet_score: f64,
}

/// Identification result for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifyReport {
    pub strategy: IdentifyStrategy,
    pub primary_sheet: Option<String>,
    pub sheets: BTreeMap<String, SheetOutcome>,
    pub summary: ReportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportError>,
}

impl IdentifyReport {
    /// Build a report and its summary from per-sheet outcomes.
    pub fn from_outcomes(
        strategy: IdentifyStrategy,
        sheets: BTreeMap<String, SheetOutcome>,
        patterns_analyzed: usize,
    ) -> Self {
        let mut summary = ReportSummary {
            patterns_analyzed,
            ..ReportSummary::default()
        };
        let mut best: Option<(&String, f64)> = None;
        for (name, outcome) in &sheets {
            let Some(report) = outcome.report() else {
                summary.sheet_errors += 1;
                continue;
            };
            summary.sheets_processed += 1;
            summary.total_fillable_columns += report.columns.len();
            summary.total_unknown_columns += report.unknowns.len();
            let score = report.score();
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((name, score));
            }
        }
        if let Some((name, score)) = best {
            summary.best_sheet = Some(name.clone());
            summary.best_sheet_score = score;
        }
        Self {
            strategy,
            primary_sheet: summary.best_sheet.clone(),
            sheets,
            summary,
            error: None,
        }
    }

    /// Report for a request that matched no sheet.
    pub fn failed(strategy: IdentifyStrategy, error: ReportError) -> Self {
        Self {
            strategy,
            primary_sheet: None,
            sheets: BTreeMap::new(),
            summary: ReportSummary::default(),
            error: Some(error),
        }
    }

    /// Analyzed output of the primary sheet.
    pub fn primary(&self) -> Option<&SheetReport> {
        self.primary_sheet
            .as_deref()
            .and_then(|name| self.sheets.get(name))
            .and_then(SheetOutcome::report)
    }

    pub fn has_errors(&self) -> bool {
        self.error.is_some() || self.sheets.values().any(SheetOutcome::is_error)
    }
}
