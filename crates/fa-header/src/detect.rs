//! Enhanced header detection: candidate scoring plus semantic validation.

use std::time::Instant;

use tracing::{debug, info_span};

use fa_model::{HeaderEnhancement, Sheet, generic_column, normalize_header};

use crate::history::LearningPatterns;
use crate::scorer::{CandidateRanking, HeaderScorer, ScorerConfig};
use crate::validator::{NoValidator, SemanticValidator, ValidationOutcome, ValidationRequest};

/// Validator confidence above which identification adopts validated headers.
pub const IDENTIFY_ACCEPT_CONFIDENCE: f64 = 0.6;

/// Validator confidence above which training adopts validated headers.
pub const TRAIN_ACCEPT_CONFIDENCE: f64 = 0.7;

/// Outcome of running enhanced detection on one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderDetection {
    pub ranking: CandidateRanking,
    pub outcome: ValidationOutcome,
}

impl HeaderDetection {
    pub fn confidence(&self) -> f64 {
        self.outcome.confidence()
    }

    /// True when a non-empty validated mapping beats `threshold`.
    pub fn is_accepted(&self, threshold: f64) -> bool {
        self.outcome
            .mapping()
            .is_some_and(|mapping| !mapping.is_empty())
            && self.confidence() > threshold
    }
}

/// Scores header rows and asks a semantic validator to confirm them.
pub struct HeaderDetector {
    scorer: HeaderScorer,
    validator: Box<dyn SemanticValidator>,
}

impl std::fmt::Debug for HeaderDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderDetector")
            .field("scorer", &self.scorer)
            .finish_non_exhaustive()
    }
}

impl Default for HeaderDetector {
    fn default() -> Self {
        Self::offline()
    }
}

impl HeaderDetector {
    pub fn new(config: ScorerConfig, validator: Box<dyn SemanticValidator>) -> Self {
        Self {
            scorer: HeaderScorer::new(config),
            validator,
        }
    }

    /// Detector without a validator; every detection is `Unavailable`.
    pub fn offline() -> Self {
        Self::new(ScorerConfig::default(), Box::new(NoValidator))
    }

    /// Rank header rows of `sheet` and validate the best candidates.
    pub fn detect(&mut self, file_name: &str, sheet_name: &str, sheet: &Sheet) -> HeaderDetection {
        let span = info_span!("detect_headers", file = %file_name, sheet = %sheet_name);
        let _guard = span.enter();
        let start = Instant::now();

        let empty = LearningPatterns::default();
        let learned = self.validator.learning_patterns().unwrap_or(&empty);
        let ranking = self.scorer.rank(sheet, learned);
        let outcome = self.validator.validate(&ValidationRequest {
            file_name,
            sheet_name,
            sheet,
            candidates: ranking.for_validator(),
        });

        debug!(
            candidates = ranking.candidates.len(),
            outcome = outcome.kind(),
            confidence = outcome.confidence(),
            duration_ms = start.elapsed().as_millis(),
            "header detection complete"
        );
        HeaderDetection { ranking, outcome }
    }
}

/// Replace basic headers with validated ones when the detection is accepted.
///
/// For each column position the validated mapping is consulted under the
/// generic identifier (`col_N`) first, then the sheet's column key; columns
/// missing from both keep their basic header. The returned headers have one
/// entry per column key.
pub fn apply_enhanced_headers(
    basic: &[String],
    column_keys: &[String],
    detection: Option<&HeaderDetection>,
    threshold: f64,
) -> (Vec<String>, HeaderEnhancement) {
    let Some(detection) = detection else {
        return (
            basic.to_vec(),
            HeaderEnhancement {
                outcome: "not_requested".to_string(),
                reason: Some("not requested".to_string()),
                original_headers: basic.to_vec(),
                ..HeaderEnhancement::default()
            },
        );
    };

    let mut enhancement = HeaderEnhancement {
        enhanced: false,
        confidence: detection.confidence(),
        outcome: detection.outcome.kind().to_string(),
        reason: Some(detection.outcome.reason().to_string()).filter(|r| !r.is_empty()),
        candidates: detection.ranking.candidates.len(),
        original_headers: basic.to_vec(),
    };

    let Some(mapping) = detection
        .outcome
        .mapping()
        .filter(|_| detection.is_accepted(threshold))
    else {
        return (basic.to_vec(), enhancement);
    };

    let headers = column_keys
        .iter()
        .enumerate()
        .map(|(position, key)| {
            mapping
                .get(&generic_column(position))
                .or_else(|| mapping.get(key))
                .map(|header| normalize_header(header))
                .or_else(|| basic.get(position).cloned())
                .unwrap_or_else(|| generic_column(position))
        })
        .collect();
    enhancement.enhanced = true;
    (headers, enhancement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn detection(pairs: &[(&str, &str)], confidence: f64) -> HeaderDetection {
        HeaderDetection {
            ranking: CandidateRanking::default(),
            outcome: ValidationOutcome::Validated {
                mapping: pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect::<BTreeMap<_, _>>(),
                confidence,
                reasoning: String::new(),
            },
        }
    }

    #[test]
    fn accepted_mapping_replaces_headers() {
        let basic = strings(&["lane", "pol", "rate"]);
        let keys = strings(&["col_0", "col_1", "col_2"]);
        let found = detection(&[("col_1", "Origin_Port"), ("col_2", "Rate  USD")], 0.9);
        let (headers, enhancement) =
            apply_enhanced_headers(&basic, &keys, Some(&found), IDENTIFY_ACCEPT_CONFIDENCE);
        assert_eq!(headers, strings(&["lane", "origin_port", "rate usd"]));
        assert!(enhancement.enhanced);
        assert_eq!(enhancement.outcome, "validated");
        assert_eq!(enhancement.original_headers, basic);
    }

    #[test]
    fn declared_column_keys_are_consulted() {
        let basic = strings(&["a", "b"]);
        let keys = strings(&["Lane", "Rate"]);
        let found = detection(&[("Rate", "rate")], 0.9);
        let (headers, _) = apply_enhanced_headers(&basic, &keys, Some(&found), 0.6);
        assert_eq!(headers, strings(&["a", "rate"]));
    }

    #[test]
    fn low_confidence_keeps_basic_headers() {
        let basic = strings(&["lane", "pol"]);
        let keys = strings(&["col_0", "col_1"]);
        let found = detection(&[("col_1", "origin_port")], 0.7);
        let (headers, enhancement) =
            apply_enhanced_headers(&basic, &keys, Some(&found), TRAIN_ACCEPT_CONFIDENCE);
        assert_eq!(headers, basic);
        assert!(!enhancement.enhanced);
        assert_eq!(enhancement.confidence, 0.7);
    }

    #[test]
    fn unavailable_validator_is_recorded() {
        let mut detector = HeaderDetector::offline();
        let sheet = Sheet::from_grid([vec!["Lane", "Origin", "Rate"], vec!["1", "A", "5"]]);
        let found = detector.detect("a.json", "Rates", &sheet);
        let basic = strings(&["lane", "origin", "rate"]);
        let (headers, enhancement) =
            apply_enhanced_headers(&basic, &sheet.column_keys(), Some(&found), 0.6);
        assert_eq!(headers, basic);
        assert_eq!(enhancement.outcome, "unavailable");
        assert_eq!(enhancement.reason.as_deref(), Some("No OpenAI client"));
        assert!(enhancement.candidates > 0);
    }

    #[test]
    fn skipped_detection_is_not_requested() {
        let basic = strings(&["lane"]);
        let (_, enhancement) = apply_enhanced_headers(&basic, &strings(&["col_0"]), None, 0.6);
        assert_eq!(enhancement.outcome, "not_requested");
        assert!(!enhancement.enhanced);
    }
}
