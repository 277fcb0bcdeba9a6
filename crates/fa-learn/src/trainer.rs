//! Training over empty/filled document pairs.
//!
//! Each pair contributes a partial [`PatternStore`] describing which columns
//! the filled version populated. Partial stores are merged into the running
//! store with [`fa_store::merge_into`], so a failing pair never corrupts
//! what earlier pairs learned.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use fa_header::{HeaderDetector, LabelVerifier, TRAIN_ACCEPT_CONFIDENCE, apply_enhanced_headers};
use fa_ingest::{
    TrainingPair, detect_header_row, find_data_sheets, load_document, pair_training_files,
    value_columns,
};
use fa_model::{
    Document, HeaderDetectionMethod, PatternStore, Sheet, SheetPatterns, generic_column,
};

use crate::error::{LearnError, Result};
use crate::fillability::{FillabilityWeights, analyze_column, column_values};
use crate::value_pattern::learn_value_patterns;

/// Confidence added to a label verdict backed by a typed value pattern.
const PATTERN_BOOST: f64 = 0.1;

/// Training knobs.
#[derive(Debug, Clone)]
pub struct TrainerOptions {
    /// Only learn this sheet instead of every common data sheet.
    pub sheet: Option<String>,
    /// Run candidate scoring and semantic validation on the filled sheet.
    pub use_enhanced_headers: bool,
    pub weights: FillabilityWeights,
}

impl Default for TrainerOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            use_enhanced_headers: true,
            weights: FillabilityWeights::default(),
        }
    }
}

/// What one sheet of a pair contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLearning {
    pub sheet: String,
    pub analyzed_columns: usize,
    pub fillable_columns: usize,
    pub detection_method: HeaderDetectionMethod,
}

/// Partial store learned from one pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairLearning {
    pub store: PatternStore,
    pub sheets: Vec<SheetLearning>,
    /// Requested sheets missing from either document.
    pub skipped_sheets: Vec<String>,
}

/// Outcome of one pair during a directory run.
#[derive(Debug, Clone, PartialEq)]
pub enum PairStatus {
    Learned(Vec<SheetLearning>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairReport {
    pub pair: TrainingPair,
    pub status: PairStatus,
}

/// Result of training over a directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRun {
    pub store: PatternStore,
    pub pairs: Vec<PairReport>,
}

impl TrainingRun {
    pub fn failed_pairs(&self) -> usize {
        self.pairs
            .iter()
            .filter(|report| matches!(report.status, PairStatus::Failed(_)))
            .count()
    }
}

/// Learns fillable columns from document pairs.
pub struct Trainer {
    detector: HeaderDetector,
    verifier: Box<dyn LabelVerifier>,
    options: TrainerOptions,
}

impl Trainer {
    pub fn new(
        detector: HeaderDetector,
        verifier: Box<dyn LabelVerifier>,
        options: TrainerOptions,
    ) -> Self {
        Self {
            detector,
            verifier,
            options,
        }
    }

    /// Train on every pair found in `dir`, merging into `base`.
    ///
    /// Fails only when the directory cannot be read or holds no pair;
    /// individual pair failures are reported and skipped.
    pub fn train_directory(&mut self, dir: &Path, base: PatternStore) -> Result<TrainingRun> {
        let span = info_span!("train", dir = %dir.display());
        let _guard = span.enter();
        let start = Instant::now();

        let pairs = pair_training_files(dir)?;
        if pairs.is_empty() {
            return Err(LearnError::NoTrainingPairs {
                path: dir.to_path_buf(),
            });
        }
        info!(pairs = pairs.len(), "found training pairs");

        let mut store = base;
        let mut reports = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let status = match self.learn_from_pair(&pair.empty, &pair.filled) {
                Ok(learning) => {
                    fa_store::merge_into(&mut store, &learning.store);
                    PairStatus::Learned(learning.sheets)
                }
                Err(e) => {
                    let error = fa_store::error_chain(&e);
                    warn!(pair = %pair.key, %error, "skipping training pair");
                    PairStatus::Failed(error)
                }
            };
            reports.push(PairReport { pair, status });
        }

        info!(
            sheets = store.sheets.len(),
            fillable = store.fillable_count(),
            duration_ms = start.elapsed().as_millis(),
            "training complete"
        );
        Ok(TrainingRun {
            store,
            pairs: reports,
        })
    }

    /// Load and learn one pair.
    pub fn learn_from_pair(&mut self, empty: &Path, filled: &Path) -> Result<PairLearning> {
        let empty_doc = load_document(empty)?;
        let filled_doc = load_document(filled)?;
        let file_name = display_name(filled);
        Ok(self.learn_from_documents(&file_name, &empty_doc, &filled_doc))
    }

    /// Learn from already loaded documents. `file_name` identifies the
    /// filled document for the semantic validator.
    pub fn learn_from_documents(
        &mut self,
        file_name: &str,
        empty: &Document,
        filled: &Document,
    ) -> PairLearning {
        let sheet_names = match &self.options.sheet {
            Some(sheet) => vec![sheet.clone()],
            None => {
                let filled_sheets: BTreeSet<String> =
                    find_data_sheets(filled).into_iter().collect();
                find_data_sheets(empty)
                    .into_iter()
                    .filter(|name| filled_sheets.contains(name))
                    .collect()
            }
        };
        if sheet_names.is_empty() {
            debug!(file = %file_name, "no common data sheets");
        }

        let mut learning = PairLearning::default();
        for name in sheet_names {
            let (Some(empty_sheet), Some(filled_sheet)) = (empty.sheet(&name), filled.sheet(&name))
            else {
                warn!(file = %file_name, sheet = %name, "sheet missing from one side of the pair");
                learning.skipped_sheets.push(name);
                continue;
            };
            let (patterns, summary) = self.learn_sheet(file_name, &name, empty_sheet, filled_sheet);
            learning.store.sheets.insert(name, patterns);
            learning.sheets.push(summary);
        }
        learning
    }

    fn learn_sheet(
        &mut self,
        file_name: &str,
        sheet_name: &str,
        empty: &Sheet,
        filled: &Sheet,
    ) -> (SheetPatterns, SheetLearning) {
        let empty_headers = detect_header_row(empty);
        let filled_headers = detect_header_row(filled);
        let basic = if empty_headers.total_len() >= filled_headers.total_len() {
            &empty_headers.headers
        } else {
            &filled_headers.headers
        };

        let mut detection_method = HeaderDetectionMethod::Basic;
        let headers = if self.options.use_enhanced_headers {
            let filled_keys = filled.column_keys();
            let keys: Vec<String> = (0..basic.len())
                .map(|i| {
                    filled_keys
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| generic_column(i))
                })
                .collect();
            let detection = self.detector.detect(file_name, sheet_name, filled);
            let (headers, enhancement) =
                apply_enhanced_headers(basic, &keys, Some(&detection), TRAIN_ACCEPT_CONFIDENCE);
            if enhancement.enhanced {
                detection_method = HeaderDetectionMethod::Enhanced;
            }
            headers
        } else {
            basic.clone()
        };

        let empty_rows = empty_headers.data_rows(empty);
        let filled_rows = filled_headers.data_rows(filled);

        let mut patterns = SheetPatterns {
            header_detection_method: detection_method,
            ..SheetPatterns::default()
        };
        let mut analyzed = 0;
        for position in value_columns(&headers) {
            let Some(raw) = headers.get(position).filter(|h| !h.is_empty()) else {
                continue;
            };
            let column_key = empty
                .columns
                .get(position)
                .cloned()
                .unwrap_or_else(|| generic_column(position));
            let analysis = analyze_column(
                &column_values(empty_rows, &column_key),
                &column_values(filled_rows, &column_key),
                &self.options.weights,
            );
            analyzed += 1;

            if analysis.fillable {
                patterns.columns_to_fill.insert(raw.clone());
                patterns.column_positions.insert(raw.clone(), position);
                if let Some(pattern) = learn_value_patterns(&analysis.filled_sample_values) {
                    patterns.enhanced_patterns.insert(raw.clone(), pattern);
                }
                debug!(
                    sheet = %sheet_name,
                    header = %raw,
                    position,
                    confidence = analysis.confidence,
                    "fillable column"
                );
            }
            patterns.add_variant(raw.clone(), raw.clone());

            let mut verdict = self.verifier.verify(raw).into_verdict();
            if let Some(pattern) = patterns.enhanced_patterns.get(raw) {
                if pattern.is_typed() {
                    verdict.confidence = f64::min(verdict.confidence + PATTERN_BOOST, 1.0);
                }
                verdict.method.push_str("+pattern");
            }
            patterns
                .verifications
                .insert(raw.clone(), verdict.with_analysis(analysis));
        }

        info!(
            sheet = %sheet_name,
            analyzed,
            fillable = patterns.columns_to_fill.len(),
            method = ?detection_method,
            "learned sheet"
        );
        let summary = SheetLearning {
            sheet: sheet_name.to_string(),
            analyzed_columns: analyzed,
            fillable_columns: patterns.columns_to_fill.len(),
            detection_method,
        };
        (patterns, summary)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}
