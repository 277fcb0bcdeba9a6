//! Decision history of the semantic validator.
//!
//! Every validated mapping is logged together with a truncated copy of the
//! prompt context. Words from validated headers become positive indicators
//! that the historical scoring strategy looks for in later sheets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::validator::ValidatorReply;

/// Default file name of the decision history.
pub const DEFAULT_HISTORY_FILE: &str = "openai_header_decisions.json";

const MAX_POSITIVE_INDICATORS: usize = 100;
const MAX_NEGATIVE_INDICATORS: usize = 50;
const CONTEXT_LIMIT: usize = 1000;
/// Indicators and headers must be longer than this many characters.
const MIN_INDICATOR_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMetadata {
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub total_decisions: u64,
    #[serde(default)]
    pub accuracy_feedback: BTreeMap<String, serde_json::Value>,
}

/// One logged validator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub file_name: String,
    /// First 1000 characters of the prompt context.
    pub context: String,
    pub ai_result: ValidatorReply,
    pub confidence: f64,
}

/// Keyword indicators aggregated from past decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningPatterns {
    #[serde(default)]
    pub positive_indicators: Vec<String>,
    #[serde(default)]
    pub negative_indicators: Vec<String>,
    #[serde(default)]
    pub common_mappings: BTreeMap<String, String>,
}

impl LearningPatterns {
    pub fn is_empty(&self) -> bool {
        self.positive_indicators.is_empty() && self.negative_indicators.is_empty()
    }

    fn absorb(&mut self, reply: &ValidatorReply) {
        for header in reply.validated_mapping.values() {
            if header.chars().count() <= MIN_INDICATOR_CHARS {
                continue;
            }
            for part in header.replace('_', " ").split_whitespace() {
                if part.chars().count() > MIN_INDICATOR_CHARS
                    && !self.positive_indicators.iter().any(|p| p == part)
                {
                    self.positive_indicators.push(part.to_string());
                }
            }
        }
        keep_last(&mut self.positive_indicators, MAX_POSITIVE_INDICATORS);
        keep_last(&mut self.negative_indicators, MAX_NEGATIVE_INDICATORS);
    }
}

fn keep_last(values: &mut Vec<String>, limit: usize) {
    if values.len() > limit {
        values.drain(..values.len() - limit);
    }
}

/// Append-only log of validator decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionHistory {
    pub metadata: HistoryMetadata,
    #[serde(default)]
    pub decisions: BTreeMap<String, DecisionRecord>,
    #[serde(default)]
    pub learning_patterns: LearningPatterns,
}

impl DecisionHistory {
    pub fn new(created: DateTime<Utc>) -> Self {
        Self {
            metadata: HistoryMetadata {
                created,
                total_decisions: 0,
                accuracy_feedback: BTreeMap::new(),
            },
            decisions: BTreeMap::new(),
            learning_patterns: LearningPatterns::default(),
        }
    }

    /// Log a validated reply and refresh the indicator lists.
    ///
    /// Returns the record identifier (`{file}_{YYYYmmdd_HHMMSS}`).
    pub fn record(
        &mut self,
        file_name: &str,
        context: &str,
        reply: &ValidatorReply,
        now: DateTime<Utc>,
    ) -> String {
        let id = format!("{file_name}_{}", now.format("%Y%m%d_%H%M%S"));
        self.decisions.insert(
            id.clone(),
            DecisionRecord {
                timestamp: now,
                file_name: file_name.to_string(),
                context: context.chars().take(CONTEXT_LIMIT).collect(),
                ai_result: reply.clone(),
                confidence: reply.confidence,
            },
        );
        self.metadata.total_decisions += 1;
        self.learning_patterns.absorb(reply);
        id
    }
}

/// File-backed [`DecisionHistory`].
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    path: PathBuf,
}

impl HistoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history, or start a fresh one when the file is missing,
    /// unreadable or corrupt.
    pub fn load_or_new(&self) -> DecisionHistory {
        match fa_store::load_json(&self.path) {
            Ok(Some(history)) => history,
            Ok(None) => {
                debug!(path = %self.path.display(), "starting new decision history");
                DecisionHistory::new(Utc::now())
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %fa_store::error_chain(&e),
                    "could not load decision history, starting a new one"
                );
                DecisionHistory::new(Utc::now())
            }
        }
    }

    pub fn save(&self, history: &DecisionHistory) -> Result<()> {
        fa_store::save_json(&self.path, history)?;
        debug!(
            path = %self.path.display(),
            decisions = history.metadata.total_decisions,
            "saved decision history"
        );
        Ok(())
    }
}
