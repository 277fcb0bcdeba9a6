//! Sheet-first matching: headers are only compared with the learned sheet
//! of the same name.

use fa_header::LabelVerifier;
use fa_model::{ColumnDecision, Decision, SheetPatterns, SheetReport, ValuePattern};

use crate::cross_sheet::ENHANCED_HEADER_BOOST;
use crate::headers::SheetHeaders;

const LEARNED_FILLABLE_WEIGHT: f64 = 0.7;
const VERDICT_WEIGHT: f64 = 0.3;
const ANALYSIS_WEIGHT: f64 = 0.2;
const VALUE_PATTERN_BONUS: f64 = 0.1;
/// Fill threshold relaxation favouring recall.
const THRESHOLD_RELAXATION: f64 = 0.8;
const ANALYSIS_REASONS_KEPT: usize = 2;

/// Decide every value column of one sheet from its same-name patterns.
pub fn analyze_sheet(
    headers: &SheetHeaders,
    learned: Option<&SheetPatterns>,
    verifier: &dyn LabelVerifier,
    threshold: f64,
) -> SheetReport {
    let boost = headers.validator_boost();
    let fill_threshold = threshold * THRESHOLD_RELAXATION;
    let mut columns = Vec::new();
    let mut unknowns = Vec::new();

    for (position, header) in headers.value_headers() {
        let mut score = 0.0;
        let mut decision_factors = Vec::new();

        let learned_fillable = learned.is_some_and(|patterns| patterns.is_fillable(header));
        if learned_fillable {
            score += LEARNED_FILLABLE_WEIGHT;
            decision_factors.push("learned_fillable".to_string());
        }

        let (label, method) = match learned.and_then(|patterns| patterns.verdict(header)) {
            Some(verdict) => {
                score += verdict.confidence * VERDICT_WEIGHT;
                if let Some(analysis) = &verdict.pattern_analysis {
                    score += analysis.confidence * ANALYSIS_WEIGHT;
                    decision_factors.extend(
                        analysis
                            .reasons
                            .iter()
                            .take(ANALYSIS_REASONS_KEPT)
                            .map(|reason| reason.as_str().to_string()),
                    );
                }
                (verdict.label.clone(), verdict.method.clone())
            }
            None => {
                let live = verifier.verify(header);
                score += live.confidence * VERDICT_WEIGHT;
                (live.label, live.method)
            }
        };

        if learned
            .and_then(|patterns| patterns.value_pattern(header))
            .is_some_and(ValuePattern::is_typed)
        {
            score += VALUE_PATTERN_BONUS;
            decision_factors.push("has_value_patterns".to_string());
        }
        if boost {
            score += ENHANCED_HEADER_BOOST;
            decision_factors.push("ai_enhanced_header".to_string());
        }

        let confidence = f64::min(score, 1.0);
        let fill = learned_fillable || confidence >= fill_threshold;
        let column = ColumnDecision {
            position,
            header: header.to_string(),
            label,
            confidence,
            verified_by: method,
            decision: if fill { Decision::Fill } else { Decision::Unknown },
            learned_fillable,
            decision_factors,
            enhanced_header: headers.enhancement.enhanced,
            source_patterns: Vec::new(),
        };
        if fill {
            columns.push(column);
        } else {
            unknowns.push(column);
        }
    }

    SheetReport {
        columns,
        unknowns,
        total_headers: headers.headers.len(),
        analyzed_columns: headers.analyzed_columns(),
        header_enhancement: headers.enhancement.clone(),
        cross_sheet_patterns_used: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fa_header::VocabularyVerifier;
    use fa_model::{FillAnalysis, FillReason, HeaderEnhancement, ValueType, Verdict};

    fn headers(names: &[&str]) -> SheetHeaders {
        SheetHeaders {
            headers: names.iter().map(|n| (*n).to_string()).collect(),
            enhancement: HeaderEnhancement::default(),
        }
    }

    #[test]
    fn learned_column_scores_every_factor() {
        let mut learned = SheetPatterns::default();
        learned.columns_to_fill.insert("rate".to_string());
        let analysis = FillAnalysis {
            fillable: true,
            confidence: 1.0,
            reasons: vec![
                FillReason::EmptyToFilled,
                FillReason::ValueDiversityIncrease,
                FillReason::NumericPattern,
            ],
            ..FillAnalysis::default()
        };
        learned.verifications.insert(
            "rate".to_string(),
            Verdict::new("rate", 0.5, "mock-exact").with_analysis(analysis),
        );
        learned.enhanced_patterns.insert(
            "rate".to_string(),
            ValuePattern {
                value_types: vec![ValueType::Numeric],
                ..ValuePattern::default()
            },
        );

        let report = analyze_sheet(
            &headers(&["lane", "rate"]),
            Some(&learned),
            &VocabularyVerifier::default(),
            0.7,
        );
        assert_eq!(report.columns.len(), 1);
        let rate = &report.columns[0];
        // 0.7 + 0.5 * 0.3 + 1.0 * 0.2 + 0.1, capped
        assert_eq!(rate.confidence, 1.0);
        assert_eq!(
            rate.decision_factors,
            vec![
                "learned_fillable",
                "empty_to_filled",
                "value_diversity_increase",
                "has_value_patterns",
            ]
        );
        assert_eq!(rate.verified_by, "mock-exact");
        assert!(report.cross_sheet_patterns_used.is_none());
    }

    #[test]
    fn unlearned_column_uses_live_verification() {
        let report = analyze_sheet(
            &headers(&["lane", "remarks", "rate"]),
            None,
            &VocabularyVerifier::default(),
            0.7,
        );
        // 0.95 * 0.3 stays below 0.56
        assert!(report.columns.is_empty());
        assert_eq!(report.unknowns.len(), 2);
        assert_eq!(report.unknowns[0].label, "remarks");
        assert!((report.unknowns[0].confidence - 0.285).abs() < 1e-9);

        // A low threshold lets the live verdict alone decide.
        let report = analyze_sheet(
            &headers(&["lane", "rate"]),
            None,
            &VocabularyVerifier::default(),
            0.3,
        );
        assert_eq!(report.columns.len(), 1);
        assert!(!report.columns[0].learned_fillable);
    }
}
