//! Per-column learning outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Signal that contributed to a fillability decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillReason {
    /// Column was (almost) empty in the blank version and populated in the filled one.
    EmptyToFilled,
    /// Column gained at least 20 points of fill rate.
    IncreasedFilling,
    /// Filled version carries many more distinct values.
    ValueDiversityIncrease,
    /// Filled values are mostly numeric.
    NumericPattern,
    /// Filled values match several structured shapes (codes, dates, amounts).
    StructuredPattern,
    /// The two samples share no rows.
    NoData,
}

impl FillReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyToFilled => "empty_to_filled",
            Self::IncreasedFilling => "increased_filling",
            Self::ValueDiversityIncrease => "value_diversity_increase",
            Self::NumericPattern => "numeric_pattern",
            Self::StructuredPattern => "structured_pattern",
            Self::NoData => "no_data",
        }
    }
}

impl fmt::Display for FillReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of comparing one column across an empty/filled pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillAnalysis {
    pub fillable: bool,
    /// Composite confidence in `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub reasons: Vec<FillReason>,
    #[serde(default)]
    pub empty_ratio: f64,
    #[serde(default)]
    pub filled_ratio: f64,
    #[serde(default)]
    pub empty_count: usize,
    #[serde(default)]
    pub filled_count: usize,
    #[serde(default)]
    pub total_rows: usize,
    /// Up to ten non-empty values from the filled version.
    #[serde(default)]
    pub filled_sample_values: Vec<String>,
}

impl FillAnalysis {
    /// Terminal outcome for columns without overlapping rows.
    pub fn no_data() -> Self {
        Self {
            reasons: vec![FillReason::NoData],
            ..Self::default()
        }
    }

    pub fn has_reason(&self, reason: FillReason) -> bool {
        self.reasons.contains(&reason)
    }
}

/// Majority shape of a column's filled values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Numeric,
    Alphabetic,
    Mixed,
}

/// Length distribution of sampled values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LengthStats {
    pub min: usize,
    pub max: usize,
    pub avg: f64,
    pub median: f64,
}

/// What filled values of a column look like.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuePattern {
    #[serde(default)]
    pub value_types: Vec<ValueType>,
    #[serde(default)]
    pub common_prefixes: Vec<String>,
    #[serde(default)]
    pub common_suffixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_stats: Option<LengthStats>,
}

impl ValuePattern {
    /// True when at least one type classification applies.
    pub fn is_typed(&self) -> bool {
        !self.value_types.is_empty()
    }
}

/// Stored outcome of labeling a header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: String,
    pub confidence: f64,
    /// Which verifier produced the label (`mock-exact`, `openai`, `user`, ...).
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_analysis: Option<FillAnalysis>,
}

impl Verdict {
    pub fn new(label: impl Into<String>, confidence: f64, method: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence,
            method: method.into(),
            pattern_analysis: None,
        }
    }

    /// Manual correction supplied by a user.
    pub fn user(label: impl Into<String>) -> Self {
        Self::new(label, 1.0, "user")
    }

    #[must_use]
    pub fn with_analysis(mut self, analysis: FillAnalysis) -> Self {
        self.pattern_analysis = Some(analysis);
        self
    }

    /// True when `other` disagrees on label or confidence.
    pub fn conflicts_with(&self, other: &Verdict) -> bool {
        self.label != other.label || (self.confidence - other.confidence).abs() > f64::EPSILON
    }
}
