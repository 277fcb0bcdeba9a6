//! Semantic header validation.
//!
//! A validator looks at the best header-row candidates plus a few sample
//! rows and returns the mapping it believes in. Failures are outcomes, not
//! errors: callers treat `Unavailable` and `Malformed` as "no mapping" but
//! keep the distinction for diagnostics.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fa_model::Sheet;

use crate::chat::ChatClient;
use crate::history::{DecisionHistory, HistoryRepository, LearningPatterns};
use crate::scorer::HeaderCandidate;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

const CONTEXT_HEADERS: usize = 10;
const CONTEXT_SAMPLE_ROWS: usize = 3;
const CONTEXT_SAMPLE_COLUMNS: usize = 10;
const MAX_TOKENS: u32 = 2000;
/// Confidence assigned to a free-text reply without a JSON object.
const FREE_TEXT_CONFIDENCE: f64 = 0.5;

const SYSTEM_PROMPT: &str = "You are an expert data analyst specializing in business document \
header detection. Evaluate the proposed header mappings for the spreadsheet and provide the best \
possible mapping. Focus on business meaning, consistency with the logistics and financial domain, \
header naming conventions and alignment with the data types. Respond with a JSON object \
containing: validated_mapping ({col_X: cleaned_header_name}), confidence (0.0-1.0), reasoning \
(string) and improvements (list of strings).";

/// Inputs for one validation call.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRequest<'a> {
    pub file_name: &'a str,
    pub sheet_name: &'a str,
    pub sheet: &'a Sheet,
    pub candidates: &'a [HeaderCandidate],
}

/// Structured validator answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorReply {
    #[serde(default)]
    pub validated_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub improvements: Vec<String>,
}

/// Result of asking a validator.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The validator answered.
    Validated {
        mapping: BTreeMap<String, String>,
        confidence: f64,
        reasoning: String,
    },
    /// No validator configured, or the call failed.
    Unavailable { reason: String },
    /// The validator answered with something unparseable.
    Malformed { reason: String },
}

impl ValidationOutcome {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Validated confidence; `0.0` for the failure outcomes.
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Validated { confidence, .. } => *confidence,
            Self::Unavailable { .. } | Self::Malformed { .. } => 0.0,
        }
    }

    /// Validated mapping, if any.
    pub fn mapping(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Validated { mapping, .. } => Some(mapping),
            Self::Unavailable { .. } | Self::Malformed { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validated { .. } => "validated",
            Self::Unavailable { .. } => "unavailable",
            Self::Malformed { .. } => "malformed",
        }
    }

    /// Reasoning or failure reason.
    pub fn reason(&self) -> &str {
        match self {
            Self::Validated { reasoning, .. } => reasoning,
            Self::Unavailable { reason } | Self::Malformed { reason } => reason,
        }
    }
}

/// Judges header-row candidates.
pub trait SemanticValidator {
    fn validate(&mut self, request: &ValidationRequest<'_>) -> ValidationOutcome;

    /// Indicators learned from earlier validations, if the validator keeps any.
    fn learning_patterns(&self) -> Option<&LearningPatterns> {
        None
    }
}

/// Validator used when no chat client is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidator;

impl SemanticValidator for NoValidator {
    fn validate(&mut self, _request: &ValidationRequest<'_>) -> ValidationOutcome {
        ValidationOutcome::unavailable("No OpenAI client")
    }
}

/// Validator backed by a chat-completions endpoint.
///
/// Validated replies are logged in the decision history, which is saved
/// after every call when a repository is attached.
#[derive(Debug)]
pub struct ChatValidator {
    client: ChatClient,
    history: DecisionHistory,
    repository: Option<HistoryRepository>,
}

impl ChatValidator {
    pub fn new(client: ChatClient, history: DecisionHistory) -> Self {
        Self {
            client,
            history,
            repository: None,
        }
    }

    /// Persist the history to `repository` after each validation.
    #[must_use]
    pub fn with_repository(mut self, repository: HistoryRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn history(&self) -> &DecisionHistory {
        &self.history
    }

    fn record(&mut self, file_name: &str, context: &str, reply: &ValidatorReply) {
        let id = self.history.record(file_name, context, reply, Utc::now());
        debug!(decision = %id, confidence = reply.confidence, "recorded validator decision");
        if let Some(repository) = &self.repository
            && let Err(e) = repository.save(&self.history)
        {
            warn!(
                path = %repository.path().display(),
                error = %fa_store::error_chain(&e),
                "could not save decision history"
            );
        }
    }
}

impl SemanticValidator for ChatValidator {
    fn validate(&mut self, request: &ValidationRequest<'_>) -> ValidationOutcome {
        let context = prepare_context(request);
        let text = match self.client.complete(SYSTEM_PROMPT, &context, MAX_TOKENS) {
            Ok(text) => text,
            Err(e) => {
                let error = fa_store::error_chain(&e);
                warn!(
                    file = %request.file_name,
                    sheet = %request.sheet_name,
                    %error,
                    "header validation unavailable"
                );
                return ValidationOutcome::unavailable(format!("API error: {error}"));
            }
        };
        let (outcome, reply) = parse_validator_response(&text);
        if let Some(reply) = reply {
            self.record(request.file_name, &context, &reply);
        }
        outcome
    }

    fn learning_patterns(&self) -> Option<&LearningPatterns> {
        Some(&self.history.learning_patterns)
    }
}

/// Render the prompt describing candidates and sample rows.
pub fn prepare_context(request: &ValidationRequest<'_>) -> String {
    let mut context = String::new();
    let _ = writeln!(context, "File: {}", request.file_name);
    let _ = writeln!(context, "Sheet: {}", request.sheet_name);
    let _ = writeln!(context, "\nDETECTION CANDIDATES:");

    for (i, candidate) in request.candidates.iter().enumerate() {
        let _ = writeln!(
            context,
            "\nCandidate {} (Row {}):",
            i + 1,
            candidate.row_index()
        );
        for (column, header) in candidate.headers.iter().take(CONTEXT_HEADERS) {
            let _ = writeln!(context, "  {column} -> '{header}'");
        }
        if candidate.headers.len() > CONTEXT_HEADERS {
            let _ = writeln!(
                context,
                "  ... and {} more headers",
                candidate.headers.len() - CONTEXT_HEADERS
            );
        }
    }

    let _ = writeln!(context, "\n\nSAMPLE DATA (first {CONTEXT_SAMPLE_ROWS} rows):");
    let keys = request.sheet.column_keys();
    for row_index in 0..request.sheet.row_count().min(CONTEXT_SAMPLE_ROWS) {
        let _ = writeln!(context, "\nRow {row_index}:");
        for key in keys.iter().take(CONTEXT_SAMPLE_COLUMNS) {
            let value = request.sheet.cell(row_index, key).trim();
            if !value.is_empty() {
                let _ = writeln!(context, "  {key}: '{value}'");
            }
        }
    }

    context.push_str(
        "\n\nTASK: Evaluate the candidates and provide the BEST header mapping. Consider \
         business domain appropriateness (logistics, shipping, finance), header naming \
         consistency, semantic alignment with the data and standard industry terminology.\n\
         Please provide your analysis in JSON format.\n",
    );
    context
}

/// Interpret a validator reply.
///
/// The first `{` through the last `}` is parsed as JSON. Text without any
/// object is taken as a low-confidence answer with an empty mapping. The
/// parsed reply is returned alongside for history logging.
pub fn parse_validator_response(text: &str) -> (ValidationOutcome, Option<ValidatorReply>) {
    let Some(found) = JSON_OBJECT.find(text) else {
        let reply = ValidatorReply {
            confidence: FREE_TEXT_CONFIDENCE,
            reasoning: text.to_string(),
            ..ValidatorReply::default()
        };
        return (validated(&reply), Some(reply));
    };
    match serde_json::from_str::<ValidatorReply>(found.as_str()) {
        Ok(mut reply) => {
            reply.confidence = reply.confidence.clamp(0.0, 1.0);
            (validated(&reply), Some(reply))
        }
        Err(e) => (
            ValidationOutcome::Malformed {
                reason: format!("Parsing error: {e}"),
            },
            None,
        ),
    }
}

fn validated(reply: &ValidatorReply) -> ValidationOutcome {
    ValidationOutcome::Validated {
        mapping: reply.validated_mapping.clone(),
        confidence: reply.confidence,
        reasoning: reply.reasoning.clone(),
    }
}
