//! Identification entry point.
//!
//! Cross-sheet matching runs first. When its primary sheet is weak (mean
//! fill confidence below 80% of the threshold) or no primary sheet exists,
//! sheet-first matching produces the report instead.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{info, info_span, warn};

use fa_header::{HeaderDetector, LabelVerifier};
use fa_ingest::find_data_sheets;
use fa_model::{
    Document, IdentifyReport, IdentifyStrategy, PatternStore, ReportError, Sheet, SheetOutcome,
    SheetReport,
};

use crate::headers::SheetHeaders;
use crate::{cross_sheet, sheet_first};

/// Share of the threshold the cross-sheet primary mean must reach.
const CROSS_SHEET_QUALITY: f64 = 0.8;

/// Identification knobs.
#[derive(Debug, Clone)]
pub struct IdentifyOptions {
    /// Minimum confidence for a `fill` decision.
    pub threshold: f64,
    /// Sheets to analyze; empty means auto-detect.
    pub sheets: Vec<String>,
    /// Run candidate scoring and semantic validation per sheet.
    pub use_enhanced_headers: bool,
}

impl Default for IdentifyOptions {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            sheets: Vec::new(),
            use_enhanced_headers: true,
        }
    }
}

/// Headers resolved once per sheet and shared by both passes, so the
/// validator is consulted at most once per sheet.
#[derive(Debug, Default)]
struct HeaderCache {
    sheets: BTreeMap<String, SheetHeaders>,
}

impl HeaderCache {
    fn resolve(
        &mut self,
        detector: Option<&mut HeaderDetector>,
        file_name: &str,
        sheet_name: &str,
        sheet: &Sheet,
    ) -> &SheetHeaders {
        self.sheets
            .entry(sheet_name.to_string())
            .or_insert_with(|| SheetHeaders::resolve(detector, file_name, sheet_name, sheet))
    }
}

/// Decides which columns of a new document need filling.
pub struct Identifier {
    detector: HeaderDetector,
    verifier: Box<dyn LabelVerifier>,
    options: IdentifyOptions,
}

impl Identifier {
    pub fn new(
        detector: HeaderDetector,
        verifier: Box<dyn LabelVerifier>,
        options: IdentifyOptions,
    ) -> Self {
        Self {
            detector,
            verifier,
            options,
        }
    }

    pub fn options(&self) -> &IdentifyOptions {
        &self.options
    }

    /// Cross-sheet identification with sheet-first fallback.
    pub fn identify(
        &mut self,
        file_name: &str,
        document: &Document,
        store: &PatternStore,
    ) -> IdentifyReport {
        let span = info_span!("identify", file = %file_name);
        let _guard = span.enter();
        let start = Instant::now();

        let mut cache = HeaderCache::default();
        let cross = self.cross_sheet(file_name, document, store, &mut cache);
        let minimum = self.options.threshold * CROSS_SHEET_QUALITY;
        let primary_mean = cross.primary().and_then(SheetReport::mean_fill_confidence);

        let report = match primary_mean {
            Some(mean) if mean >= minimum => cross,
            _ => {
                info!(
                    primary_mean = primary_mean.unwrap_or(0.0),
                    minimum, "cross-sheet result too weak, using sheet-first matching"
                );
                self.sheet_first(file_name, document, store, &mut cache)
            }
        };

        info!(
            strategy = ?report.strategy,
            fillable = report.summary.total_fillable_columns,
            unknown = report.summary.total_unknown_columns,
            sheet_errors = report.summary.sheet_errors,
            duration_ms = start.elapsed().as_millis(),
            "identification complete"
        );
        report
    }

    /// Match every sheet against all learned sheets.
    pub fn identify_cross_sheet(
        &mut self,
        file_name: &str,
        document: &Document,
        store: &PatternStore,
    ) -> IdentifyReport {
        self.cross_sheet(file_name, document, store, &mut HeaderCache::default())
    }

    /// Match sheets only against the learned sheet of the same name.
    pub fn identify_sheet_first(
        &mut self,
        file_name: &str,
        document: &Document,
        store: &PatternStore,
    ) -> IdentifyReport {
        self.sheet_first(file_name, document, store, &mut HeaderCache::default())
    }

    fn cross_sheet(
        &mut self,
        file_name: &str,
        document: &Document,
        store: &PatternStore,
        cache: &mut HeaderCache,
    ) -> IdentifyReport {
        let targets = if self.options.sheets.is_empty() {
            find_data_sheets(document)
        } else {
            self.options.sheets.clone()
        };

        let mut outcomes = BTreeMap::new();
        let mut patterns_analyzed = 0;
        for name in targets {
            let Some(sheet) = document.sheet(&name) else {
                warn!(sheet = %name, "requested sheet not found");
                outcomes.insert(name, SheetOutcome::error("sheet not found"));
                continue;
            };
            let detector = self
                .options
                .use_enhanced_headers
                .then_some(&mut self.detector);
            let headers = cache.resolve(detector, file_name, &name, sheet);
            let report = cross_sheet::analyze_sheet(
                headers,
                store,
                self.verifier.as_ref(),
                self.options.threshold,
            );
            patterns_analyzed += report.cross_sheet_patterns_used.unwrap_or(0);
            outcomes.insert(name, SheetOutcome::Analyzed(report));
        }
        IdentifyReport::from_outcomes(IdentifyStrategy::CrossSheet, outcomes, patterns_analyzed)
    }

    fn sheet_first(
        &mut self,
        file_name: &str,
        document: &Document,
        store: &PatternStore,
        cache: &mut HeaderCache,
    ) -> IdentifyReport {
        let targets = if self.options.sheets.is_empty() {
            let available = find_data_sheets(document);
            let matching: Vec<String> = available
                .iter()
                .filter(|name| store.sheet(name).is_some())
                .cloned()
                .collect();
            if matching.is_empty() {
                warn!("no document sheet matches a learned sheet");
                return IdentifyReport::failed(
                    IdentifyStrategy::SheetFirst,
                    ReportError {
                        message: "No matching sheets found".to_string(),
                        available_sheets: available,
                        learned_sheets: store.sheet_names().map(str::to_string).collect(),
                    },
                );
            }
            matching
        } else {
            self.options.sheets.clone()
        };

        let mut outcomes = BTreeMap::new();
        for name in targets {
            let Some(sheet) = document.sheet(&name) else {
                warn!(sheet = %name, "requested sheet not found");
                outcomes.insert(name, SheetOutcome::error("sheet not found in file"));
                continue;
            };
            let detector = self
                .options
                .use_enhanced_headers
                .then_some(&mut self.detector);
            let headers = cache.resolve(detector, file_name, &name, sheet);
            let report = sheet_first::analyze_sheet(
                headers,
                store.sheet(&name),
                self.verifier.as_ref(),
                self.options.threshold,
            );
            outcomes.insert(name, SheetOutcome::Analyzed(report));
        }
        IdentifyReport::from_outcomes(IdentifyStrategy::SheetFirst, outcomes, 0)
    }
}
