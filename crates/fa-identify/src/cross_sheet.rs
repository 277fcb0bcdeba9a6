//! Cross-sheet matching.
//!
//! Every header of the target sheet is matched against the patterns of all
//! learned sheets, not only the one sharing its name. Sheets are frequently
//! renamed between tender rounds while their columns stay the same.

use std::collections::BTreeSet;

use fa_header::{LabelVerifier, UNKNOWN_LABEL};
use fa_model::{ColumnDecision, Decision, PatternStore, SheetReport};

use crate::headers::SheetHeaders;
use crate::similarity::header_similarity;

const DIRECT_CONFIDENCE: f64 = 0.95;
const VERIFICATION_DISCOUNT: f64 = 0.85;
const PATTERN_CONFIDENCE: f64 = 0.75;
const SEMANTIC_MIN_SIMILARITY: f64 = 0.7;
const SEMANTIC_DISCOUNT: f64 = 0.7;
pub(crate) const ENHANCED_HEADER_BOOST: f64 = 0.15;

/// Which rule produced the winning candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    DirectLearnedFillable,
    VerificationMatch,
    EnhancedPatternMatch,
    SemanticSimilarity,
    /// No learned sheet knew the header; the label verifier decided.
    LiveVerification,
}

/// Best evidence for one header across all learned sheets.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSheetMatch {
    pub confidence: f64,
    pub label: String,
    pub method: String,
    pub learned_fillable: bool,
    pub decision_factors: Vec<String>,
    /// Learned sheets that produced any candidate, sorted.
    pub source_patterns: Vec<String>,
    pub match_type: MatchType,
}

struct Candidate<'a> {
    confidence: f64,
    label: &'a str,
    method: String,
    learned_fillable: bool,
    factors: Vec<String>,
    source_sheet: &'a str,
    match_type: MatchType,
}

fn factors(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

/// Find the strongest candidate for `header` across every learned sheet.
///
/// Ties keep the earliest candidate. Without any candidate the header is
/// verified live.
pub fn best_match(
    header: &str,
    store: &PatternStore,
    verifier: &dyn LabelVerifier,
) -> CrossSheetMatch {
    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    for (sheet_name, learned) in &store.sheets {
        let fillable = learned.is_fillable(header);
        let verdict = learned.verdict(header);

        if fillable {
            candidates.push(Candidate {
                confidence: DIRECT_CONFIDENCE,
                label: verdict.map_or(UNKNOWN_LABEL, |v| v.label.as_str()),
                method: verdict.map_or_else(|| "learned".to_string(), |v| v.method.clone()),
                learned_fillable: true,
                factors: factors(&["direct_match", "learned_fillable"]),
                source_sheet: sheet_name,
                match_type: MatchType::DirectLearnedFillable,
            });
        }
        if let Some(verdict) = verdict {
            candidates.push(Candidate {
                confidence: verdict.confidence * VERIFICATION_DISCOUNT,
                label: &verdict.label,
                method: verdict.method.clone(),
                learned_fillable: fillable,
                factors: factors(&["verification_match"]),
                source_sheet: sheet_name,
                match_type: MatchType::VerificationMatch,
            });
        }
        if learned.value_pattern(header).is_some() {
            candidates.push(Candidate {
                confidence: PATTERN_CONFIDENCE,
                label: UNKNOWN_LABEL,
                method: "enhanced_pattern".to_string(),
                learned_fillable: fillable,
                factors: factors(&["enhanced_pattern"]),
                source_sheet: sheet_name,
                match_type: MatchType::EnhancedPatternMatch,
            });
        }
        for (verified_header, verdict) in &learned.verifications {
            let similarity = header_similarity(header, verified_header);
            if similarity > SEMANTIC_MIN_SIMILARITY {
                candidates.push(Candidate {
                    confidence: similarity * verdict.confidence * SEMANTIC_DISCOUNT,
                    label: &verdict.label,
                    method: format!("semantic_similarity_{similarity:.2}"),
                    learned_fillable: false,
                    factors: vec![format!("semantic_match_{similarity:.2}")],
                    source_sheet: sheet_name,
                    match_type: MatchType::SemanticSimilarity,
                });
            }
        }
    }

    let source_patterns: Vec<String> = candidates
        .iter()
        .map(|c| c.source_sheet)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let best = candidates.into_iter().reduce(|best, candidate| {
        if candidate.confidence > best.confidence {
            candidate
        } else {
            best
        }
    });
    match best {
        Some(best) => {
            let mut decision_factors = best.factors;
            decision_factors.push("cross_sheet_analysis".to_string());
            CrossSheetMatch {
                confidence: best.confidence,
                label: best.label.to_string(),
                method: format!("{}+cross-sheet", best.method),
                learned_fillable: best.learned_fillable,
                decision_factors,
                source_patterns,
                match_type: best.match_type,
            }
        }
        None => {
            let live = verifier.verify(header);
            CrossSheetMatch {
                confidence: live.confidence,
                label: live.label,
                method: live.method,
                learned_fillable: false,
                decision_factors: factors(&["live_verification"]),
                source_patterns,
                match_type: MatchType::LiveVerification,
            }
        }
    }
}

/// Decide every value column of one sheet against all learned sheets.
pub fn analyze_sheet(
    headers: &SheetHeaders,
    store: &PatternStore,
    verifier: &dyn LabelVerifier,
    threshold: f64,
) -> SheetReport {
    let boost = headers.validator_boost();
    let mut columns = Vec::new();
    let mut unknowns = Vec::new();

    for (position, header) in headers.value_headers() {
        let found = best_match(header, store, verifier);
        let mut decision_factors = found.decision_factors;
        let mut confidence = found.confidence;
        if boost {
            confidence += ENHANCED_HEADER_BOOST;
            decision_factors.push("ai_enhanced_header".to_string());
        }
        let confidence = confidence.min(1.0);
        let fill = found.learned_fillable || confidence >= threshold;

        let column = ColumnDecision {
            position,
            header: header.to_string(),
            label: found.label,
            confidence,
            verified_by: found.method,
            decision: if fill { Decision::Fill } else { Decision::Unknown },
            learned_fillable: found.learned_fillable,
            decision_factors,
            enhanced_header: headers.enhancement.enhanced,
            source_patterns: found.source_patterns,
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
        cross_sheet_patterns_used: Some(store.sheets.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fa_header::VocabularyVerifier;
    use fa_model::Verdict;

    fn store() -> PatternStore {
        let mut store = PatternStore::new();
        let ocean = store.sheet_mut("Ocean");
        ocean.columns_to_fill.insert("rate usd".to_string());
        ocean
            .verifications
            .insert("rate usd".to_string(), Verdict::new("rate", 0.9, "mock-fuzzy"));
        let air = store.sheet_mut("Air");
        air.verifications
            .insert("transit days".to_string(), Verdict::new("transit_time", 0.9, "mock-variant"));
        store
    }

    #[test]
    fn direct_membership_wins() {
        let found = best_match("rate usd", &store(), &VocabularyVerifier::default());
        assert_eq!(found.match_type, MatchType::DirectLearnedFillable);
        assert_eq!(found.confidence, 0.95);
        assert_eq!(found.label, "rate");
        assert_eq!(found.method, "mock-fuzzy+cross-sheet");
        assert_eq!(
            found.decision_factors,
            vec!["direct_match", "learned_fillable", "cross_sheet_analysis"]
        );
        assert_eq!(found.source_patterns, vec!["Ocean"]);
    }

    #[test]
    fn similar_header_from_other_sheet() {
        let found = best_match("transit day", &store(), &VocabularyVerifier::default());
        assert_eq!(found.match_type, MatchType::SemanticSimilarity);
        assert_eq!(found.label, "transit_time");
        assert!(!found.learned_fillable);
        assert_eq!(found.source_patterns, vec!["Air"]);
        assert!(found.method.starts_with("semantic_similarity_0.9"));
    }

    #[test]
    fn unknown_header_is_verified_live() {
        let found = best_match("carrier name", &PatternStore::new(), &VocabularyVerifier::default());
        assert_eq!(found.match_type, MatchType::LiveVerification);
        assert_eq!(found.label, "carrier");
        assert_eq!(found.decision_factors, vec!["live_verification"]);
        assert!(found.source_patterns.is_empty());
    }
}
