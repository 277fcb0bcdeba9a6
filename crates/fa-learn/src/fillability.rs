//! Column fillability analysis.
//!
//! Compares one column across the empty and filled versions of a document.
//! A column is fillable when the filled version populates cells the empty
//! version left blank; secondary signals reward richer or more structured
//! filled values.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use fa_model::{FillAnalysis, FillReason, Row};

/// Rows sampled from each side of a pair.
pub const SAMPLE_LIMIT: usize = 200;

/// Filled values kept on the analysis for pattern learning.
const KEPT_SAMPLE_VALUES: usize = 10;

// =============================================================================
// Signal thresholds
// =============================================================================

const MAX_EMPTY_RATIO: f64 = 0.1;
const MIN_FILLED_RATIO: f64 = 0.3;
const MIN_FILL_GAIN: f64 = 0.2;
const DIVERSITY_FACTOR: f64 = 1.5;
const NUMERIC_SHARE: f64 = 0.7;
const MIN_STRUCTURED_SHAPES: usize = 2;

static NUMERIC_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.,]+$").expect("valid regex"));

/// Shapes typical of filled-in bid values: integers, amounts, codes, ISO
/// dates and e-mail addresses.
static STRUCTURED_SHAPES: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        r"\d+",
        r"[\d.,]+",
        r"[A-Z]{2,4}",
        r"\d{4}-\d{2}-\d{2}",
        r"[a-z]+@[a-z]+\.[a-z]+",
    ]
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
});

/// Signal weights and the fillable cut-off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillabilityWeights {
    pub empty_to_filled: f64,
    pub increased_filling: f64,
    pub value_diversity: f64,
    pub numeric_pattern: f64,
    pub structured_pattern: f64,
    /// Minimum confidence for a fillable verdict.
    pub fillable_threshold: f64,
}

impl Default for FillabilityWeights {
    fn default() -> Self {
        Self {
            empty_to_filled: 0.8,
            increased_filling: 0.6,
            value_diversity: 0.3,
            numeric_pattern: 0.2,
            structured_pattern: 0.1,
            fillable_threshold: 0.3,
        }
    }
}

/// Trimmed cell text of `column_key` for the first [`SAMPLE_LIMIT`] rows.
pub fn column_values<'a>(rows: &'a [Row], column_key: &str) -> Vec<&'a str> {
    rows.iter()
        .take(SAMPLE_LIMIT)
        .map(|row| row.get(column_key).map_or("", |value| value.trim()))
        .collect()
}

fn is_populated(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

/// Compare one column's empty and filled samples.
pub fn analyze_column<E, F>(empty: &[E], filled: &[F], weights: &FillabilityWeights) -> FillAnalysis
where
    E: AsRef<str>,
    F: AsRef<str>,
{
    let empty: Vec<&str> = empty
        .iter()
        .take(SAMPLE_LIMIT)
        .map(|v| v.as_ref().trim())
        .collect();
    let filled: Vec<&str> = filled
        .iter()
        .take(SAMPLE_LIMIT)
        .map(|v| v.as_ref().trim())
        .collect();

    let total_rows = empty.len().min(filled.len());
    if total_rows == 0 {
        return FillAnalysis::no_data();
    }

    let empty_populated: Vec<&str> = empty.iter().copied().filter(|v| is_populated(v)).collect();
    let filled_populated: Vec<&str> = filled.iter().copied().filter(|v| is_populated(v)).collect();
    let empty_ratio = empty_populated.len() as f64 / total_rows as f64;
    let filled_ratio = filled_populated.len() as f64 / total_rows as f64;

    let mut score = 0.0;
    let mut reasons = Vec::new();

    if empty_ratio <= MAX_EMPTY_RATIO && filled_ratio >= MIN_FILLED_RATIO {
        score += weights.empty_to_filled;
        reasons.push(FillReason::EmptyToFilled);
    } else if empty_ratio < filled_ratio && filled_ratio - empty_ratio >= MIN_FILL_GAIN {
        score += weights.increased_filling;
        reasons.push(FillReason::IncreasedFilling);
    }

    let empty_distinct: BTreeSet<&str> = empty_populated.iter().copied().collect();
    let filled_distinct: BTreeSet<&str> = filled_populated.iter().copied().collect();
    if filled_distinct.len() as f64 > empty_distinct.len() as f64 * DIVERSITY_FACTOR {
        score += weights.value_diversity;
        reasons.push(FillReason::ValueDiversityIncrease);
    }

    if !filled_populated.is_empty() {
        let numeric = filled_populated
            .iter()
            .filter(|v| NUMERIC_VALUE.is_match(&v.replace(' ', "")))
            .count();
        if numeric as f64 / filled_populated.len() as f64 > NUMERIC_SHARE {
            score += weights.numeric_pattern;
            reasons.push(FillReason::NumericPattern);
        }

        let shapes = STRUCTURED_SHAPES
            .iter()
            .filter(|shape| filled_populated.iter().any(|v| shape.is_match(v)))
            .count();
        if shapes >= MIN_STRUCTURED_SHAPES {
            score += weights.structured_pattern;
            reasons.push(FillReason::StructuredPattern);
        }
    }

    let confidence = f64::min(score, 1.0);
    FillAnalysis {
        fillable: confidence >= weights.fillable_threshold,
        confidence,
        reasons,
        empty_ratio,
        filled_ratio,
        empty_count: empty_populated.len(),
        filled_count: filled_populated.len(),
        total_rows,
        filled_sample_values: filled_populated
            .iter()
            .take(KEPT_SAMPLE_VALUES)
            .map(|v| (*v).to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(empty: &[&str], filled: &[&str]) -> FillAnalysis {
        analyze_column(empty, filled, &FillabilityWeights::default())
    }

    #[test]
    fn blank_to_numeric_column() {
        let analysis = analyze(&["", "", "0", ""], &["100", "250", "0", "300"]);
        assert!(analysis.fillable);
        assert_eq!(analysis.empty_ratio, 0.0);
        assert_eq!(analysis.filled_ratio, 0.75);
        assert_eq!(
            analysis.reasons,
            vec![
                FillReason::EmptyToFilled,
                FillReason::ValueDiversityIncrease,
                FillReason::NumericPattern,
                FillReason::StructuredPattern,
            ]
        );
        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(analysis.filled_sample_values, vec!["100", "250", "300"]);
    }

    #[test]
    fn partial_filling() {
        let analysis = analyze(&["A", "", "", ""], &["A", "B", "", ""]);
        assert!(analysis.has_reason(FillReason::IncreasedFilling));
        assert!(!analysis.has_reason(FillReason::EmptyToFilled));
        assert!(analysis.fillable);
    }

    #[test]
    fn unchanged_column_is_not_fillable() {
        let analysis = analyze(&["x", "y", "z"], &["x", "y", "z"]);
        assert!(!analysis.fillable);
        assert!(analysis.reasons.is_empty());
        assert_eq!(analysis.confidence, 0.0);
    }

    #[test]
    fn no_overlap_is_no_data() {
        let analysis = analyze(&[], &["100"]);
        assert_eq!(analysis, FillAnalysis::no_data());
    }

    #[test]
    fn total_is_shorter_side() {
        let analysis = analyze(&["", ""], &["1", "2", "3", "4"]);
        assert_eq!(analysis.total_rows, 2);
        assert_eq!(analysis.filled_ratio, 2.0);
    }

    #[test]
    fn samples_are_capped() {
        let empty = vec![""; 300];
        let filled: Vec<String> = (0..300).map(|i| format!("{i}")).collect();
        let analysis = analyze_column(&empty, &filled, &FillabilityWeights::default());
        assert_eq!(analysis.total_rows, SAMPLE_LIMIT);
        assert_eq!(analysis.filled_sample_values.len(), 10);
    }

    #[test]
    fn reads_column_values_from_rows() {
        let rows: Vec<Row> = vec![
            [("col_1".to_string(), " 5 ".to_string())].into(),
            Row::new(),
        ];
        assert_eq!(column_values(&rows, "col_1"), vec!["5", ""]);
    }
}
