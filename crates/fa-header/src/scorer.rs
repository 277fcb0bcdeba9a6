//! Header row candidate scoring.
//!
//! Four independent strategies each rank the first rows of a sheet by how
//! much they look like a header row:
//!
//! - **Keyword**: share of cells containing logistics/business vocabulary
//! - **Structural**: coverage, uniqueness, underscore naming and cell length
//! - **Template**: share of cells carrying template markup
//! - **Historical**: indicator words learned from past validations
//!
//! The best rows of each strategy are merged into one ranking that feeds the
//! semantic validator.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use fa_model::Sheet;

use crate::clean::{clean_header_name, extract_clean_headers, has_template_marker, present_value};
use crate::history::LearningPatterns;

// =============================================================================
// Scoring constants
// =============================================================================

const KEYWORD_WEIGHT: f64 = 40.0;
const KEYWORD_MIN_SCORE: f64 = 15.0;

const COVERAGE_WEIGHT: f64 = 30.0;
const UNIQUENESS_WEIGHT: f64 = 25.0;
const UNDERSCORE_WEIGHT: f64 = 20.0;
const LENGTH_BONUS: f64 = 15.0;
const HEADER_LENGTH_RANGE: std::ops::RangeInclusive<f64> = 3.0..=25.0;
const STRUCTURAL_MIN_SCORE: f64 = 20.0;

const TEMPLATE_WEIGHT: f64 = 50.0;
const TEMPLATE_MIN_SCORE: f64 = 10.0;

const HISTORY_WEIGHT: f64 = 30.0;
const NEGATIVE_INDICATOR_PENALTY: f64 = 0.5;

/// Business vocabulary by category. Matching is substring containment on the
/// lowercased cell.
pub const BUSINESS_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "logistics",
        &[
            "lane", "service", "port", "origin", "destination", "carrier", "freight", "shipment",
            "transport", "routing", "mode", "vessel",
        ],
    ),
    (
        "financial",
        &[
            "cost", "price", "rate", "fee", "charge", "amount", "total", "minimum", "surcharge",
            "currency", "billing", "payment", "invoice",
        ],
    ),
    (
        "measurement",
        &[
            "cbm", "volume", "weight", "kilos", "pounds", "tons", "cubic", "meter", "feet",
            "dimensions", "length", "width", "height",
        ],
    ),
    (
        "temporal",
        &[
            "date", "time", "effective", "expiration", "valid", "period", "duration", "schedule",
            "start", "end", "from", "to",
        ],
    ),
    (
        "identifiers",
        &[
            "id", "code", "number", "reference", "tracking", "lane_id", "item", "sku", "part",
            "model", "serial",
        ],
    ),
    (
        "geographic",
        &[
            "country", "region", "zone", "area", "location", "address", "city", "state",
            "continent", "territory",
        ],
    ),
    (
        "business",
        &[
            "quote", "bid", "proposal", "contract", "agreement", "terms", "conditions", "client",
            "customer", "vendor", "supplier",
        ],
    ),
    (
        "operational",
        &[
            "status", "type", "category", "class", "grade", "level", "priority", "urgency",
            "requirements",
        ],
    ),
];

/// Scan limits for candidate scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorerConfig {
    /// Rows scanned from the top of the sheet.
    pub scan_rows: usize,
    /// Rows with fewer populated cells are never candidates.
    pub min_values: usize,
    /// Candidates offered to the semantic validator.
    pub validator_candidates: usize,
    /// Candidates kept for diagnostics.
    pub reported_candidates: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            scan_rows: 50,
            min_values: 3,
            validator_candidates: 3,
            reported_candidates: 5,
        }
    }
}

/// Scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PatternBased,
    Structural,
    TemplatePattern,
    HistoricalLearning,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::PatternBased,
        Strategy::Structural,
        Strategy::TemplatePattern,
        Strategy::HistoricalLearning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PatternBased => "pattern_based",
            Self::Structural => "structural",
            Self::TemplatePattern => "template_pattern",
            Self::HistoricalLearning => "historical_learning",
        }
    }

    /// How many of this strategy's rows enter the combined ranking.
    fn combined_quota(&self) -> usize {
        match self {
            Self::PatternBased | Self::Structural => 2,
            Self::TemplatePattern | Self::HistoricalLearning => 1,
        }
    }
}

/// A component contributing to a row's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub name: &'static str,
    pub value: f64,
    pub description: String,
}

/// A row scored by one strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowScore {
    pub row_index: usize,
    pub score: f64,
    pub components: Vec<ScoreComponent>,
}

impl RowScore {
    /// Human-readable breakdown of the score.
    pub fn explain(&self) -> String {
        self.components
            .iter()
            .map(|c| format!("{}: {:.2}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A ranked header row with its cleaned headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderCandidate {
    pub strategy: Strategy,
    #[serde(flatten)]
    pub row: RowScore,
    /// Column identifier to cleaned header.
    pub headers: BTreeMap<String, String>,
}

impl HeaderCandidate {
    pub fn row_index(&self) -> usize {
        self.row.row_index
    }

    pub fn score(&self) -> f64 {
        self.row.score
    }
}

/// Combined ranking over all strategies.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateRanking {
    /// Rows each strategy kept before combination.
    pub strategy_counts: BTreeMap<Strategy, usize>,
    /// Deduplicated candidates, best first.
    pub candidates: Vec<HeaderCandidate>,
    #[serde(skip)]
    validator_limit: usize,
}

impl CandidateRanking {
    /// Candidates offered to the semantic validator.
    pub fn for_validator(&self) -> &[HeaderCandidate] {
        let end = self.validator_limit.min(self.candidates.len());
        &self.candidates[..end]
    }

    pub fn best(&self) -> Option<&HeaderCandidate> {
        self.candidates.first()
    }
}

/// Scores candidate header rows.
#[derive(Debug, Clone, Default)]
pub struct HeaderScorer {
    config: ScorerConfig,
}

impl HeaderScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Run all strategies and combine them.
    pub fn rank(&self, sheet: &Sheet, learned: &LearningPatterns) -> CandidateRanking {
        let rows = self.scan(sheet);
        let column_count = sheet.column_keys().len();

        let mut strategy_counts = BTreeMap::new();
        let mut combined = Vec::new();
        for strategy in Strategy::ALL {
            let scored = match strategy {
                Strategy::PatternBased => score_keywords(&rows),
                Strategy::Structural => score_structure(&rows, column_count),
                Strategy::TemplatePattern => score_templates(&rows),
                Strategy::HistoricalLearning => score_history(&rows, learned),
            };
            strategy_counts.insert(strategy, scored.len());
            combined.extend(
                scored
                    .into_iter()
                    .take(strategy.combined_quota())
                    .map(|row| (strategy, row)),
            );
        }
        combined.sort_by(|a, b| descending(a.1.score, b.1.score));

        let mut seen = BTreeSet::new();
        let candidates = combined
            .into_iter()
            .filter(|(_, row)| seen.insert(row.row_index))
            .take(self.config.reported_candidates)
            .map(|(strategy, row)| HeaderCandidate {
                strategy,
                headers: extract_clean_headers(sheet, row.row_index),
                row,
            })
            .collect();

        CandidateRanking {
            strategy_counts,
            candidates,
            validator_limit: self.config.validator_candidates,
        }
    }

    /// Populated cell values of the scanned rows; sparse rows are dropped.
    fn scan<'a>(&self, sheet: &'a Sheet) -> Vec<ScannedRow<'a>> {
        let keys = sheet.column_keys();
        sheet
            .rows
            .iter()
            .take(self.config.scan_rows)
            .enumerate()
            .filter_map(|(row_index, row)| {
                let values: Vec<&str> = keys
                    .iter()
                    .filter_map(|key| row.get(key))
                    .map(String::as_str)
                    .filter_map(present_value)
                    .collect();
                (values.len() >= self.config.min_values).then_some(ScannedRow { row_index, values })
            })
            .collect()
    }
}

struct ScannedRow<'a> {
    row_index: usize,
    values: Vec<&'a str>,
}

impl ScannedRow<'_> {
    fn ratio(&self, count: usize) -> f64 {
        count as f64 / self.values.len() as f64
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn ranked(mut rows: Vec<RowScore>) -> Vec<RowScore> {
    rows.sort_by(|a, b| descending(a.score, b.score));
    rows
}

fn contains_keyword(value: &str) -> bool {
    let lower = value.to_lowercase();
    BUSINESS_KEYWORDS
        .iter()
        .any(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
}

fn score_keywords(rows: &[ScannedRow<'_>]) -> Vec<RowScore> {
    ranked(
        rows.iter()
            .filter_map(|row| {
                let matches = row.values.iter().filter(|v| contains_keyword(v)).count();
                let ratio = row.ratio(matches);
                let score = ratio * KEYWORD_WEIGHT;
                (score > KEYWORD_MIN_SCORE).then(|| RowScore {
                    row_index: row.row_index,
                    score,
                    components: vec![ScoreComponent {
                        name: "keyword_ratio",
                        value: ratio,
                        description: format!("{matches} of {} cells", row.values.len()),
                    }],
                })
            })
            .collect(),
    )
}

fn score_structure(rows: &[ScannedRow<'_>], column_count: usize) -> Vec<RowScore> {
    let columns = column_count.max(1) as f64;
    ranked(
        rows.iter()
            .filter_map(|row| {
                let count = row.values.len() as f64;
                let coverage = count / columns;
                let distinct: BTreeSet<&str> = row.values.iter().copied().collect();
                let uniqueness = distinct.len() as f64 / count;
                let underscore_ratio =
                    row.ratio(row.values.iter().filter(|v| v.contains('_')).count());
                let avg_length = row
                    .values
                    .iter()
                    .map(|v| v.chars().count() as f64)
                    .sum::<f64>()
                    / count;
                let length_bonus = if HEADER_LENGTH_RANGE.contains(&avg_length) {
                    LENGTH_BONUS
                } else {
                    0.0
                };
                let score = coverage * COVERAGE_WEIGHT
                    + uniqueness * UNIQUENESS_WEIGHT
                    + underscore_ratio * UNDERSCORE_WEIGHT
                    + length_bonus;
                (score > STRUCTURAL_MIN_SCORE).then(|| RowScore {
                    row_index: row.row_index,
                    score,
                    components: vec![
                        ScoreComponent {
                            name: "coverage",
                            value: coverage,
                            description: format!("{count} of {columns} columns"),
                        },
                        ScoreComponent {
                            name: "uniqueness",
                            value: uniqueness,
                            description: format!("{} distinct", distinct.len()),
                        },
                        ScoreComponent {
                            name: "underscore_ratio",
                            value: underscore_ratio,
                            description: "cells using underscore naming".to_string(),
                        },
                        ScoreComponent {
                            name: "avg_length",
                            value: avg_length,
                            description: format!("length bonus {length_bonus}"),
                        },
                    ],
                })
            })
            .collect(),
    )
}

fn score_templates(rows: &[ScannedRow<'_>]) -> Vec<RowScore> {
    ranked(
        rows.iter()
            .filter_map(|row| {
                let matches = row.values.iter().filter(|v| has_template_marker(v)).count();
                let ratio = row.ratio(matches);
                let score = ratio * TEMPLATE_WEIGHT;
                (score > TEMPLATE_MIN_SCORE).then(|| RowScore {
                    row_index: row.row_index,
                    score,
                    components: vec![ScoreComponent {
                        name: "template_ratio",
                        value: ratio,
                        description: format!("{matches} of {} cells", row.values.len()),
                    }],
                })
            })
            .collect(),
    )
}

fn score_history(rows: &[ScannedRow<'_>], learned: &LearningPatterns) -> Vec<RowScore> {
    if learned.is_empty() {
        return Vec::new();
    }
    let positive: Vec<String> = learned
        .positive_indicators
        .iter()
        .map(|p| p.to_lowercase())
        .collect();
    let negative: Vec<String> = learned
        .negative_indicators
        .iter()
        .map(|p| p.to_lowercase())
        .collect();

    ranked(
        rows.iter()
            .filter_map(|row| {
                let mut net = 0.0;
                for value in &row.values {
                    let cleaned = clean_header_name(value);
                    if positive.iter().any(|p| cleaned.contains(p.as_str())) {
                        net += 1.0;
                    }
                    let penalties = negative.iter().filter(|n| cleaned.contains(n.as_str())).count();
                    net -= penalties as f64 * NEGATIVE_INDICATOR_PENALTY;
                }
                (net > 0.0).then(|| RowScore {
                    row_index: row.row_index,
                    score: net / row.values.len() as f64 * HISTORY_WEIGHT,
                    components: vec![ScoreComponent {
                        name: "indicator_matches",
                        value: net,
                        description: format!(
                            "{} learned indicators applied",
                            learned.positive_indicators.len()
                        ),
                    }],
                })
            })
            .collect(),
    )
}
