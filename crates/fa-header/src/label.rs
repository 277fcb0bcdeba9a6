//! Header label verification.
//!
//! Maps a raw header onto a controlled vocabulary of logistics bid labels.
//! The vocabulary verifier works offline; the chat verifier asks the model
//! and falls back to the vocabulary whenever the call or its reply fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use fa_model::{Verdict, normalize_label};

use crate::chat::ChatClient;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Label returned when nothing in the vocabulary fits.
pub const UNKNOWN_LABEL: &str = "unknown";

const EXACT_CONFIDENCE: f64 = 0.95;
const VARIANT_CONFIDENCE: f64 = 0.9;
const FUZZY_CONFIDENCE: f64 = 0.6;
const UNKNOWN_CONFIDENCE: f64 = 0.3;
const CHAT_DEFAULT_CONFIDENCE: f64 = 0.5;
const MAX_TOKENS: u32 = 200;

/// Controlled vocabulary: label and the header spellings seen for it.
pub const CONTROLLED_VOCABULARY: &[(&str, &[&str])] = &[
    ("lane_id", &["lane", "lane no", "lane number", "lane ref", "route id"]),
    ("origin_port", &["origin", "pol", "port of loading", "from port", "load port"]),
    (
        "destination_port",
        &["destination", "pod", "port of discharge", "to port", "discharge port"],
    ),
    ("origin_country", &["country of origin", "from country", "origin ctry"]),
    ("destination_country", &["country of destination", "to country", "dest country"]),
    ("carrier", &["carrier name", "shipping line", "airline", "scac"]),
    ("service_type", &["service", "mode", "service level", "transport mode"]),
    ("transit_time", &["transit", "transit days", "tt", "lead time"]),
    ("rate", &["price", "cost", "freight rate", "all in rate", "unit rate"]),
    ("currency", &["curr", "ccy", "currency code"]),
    ("minimum_charge", &["minimum", "min charge", "min"]),
    ("surcharge", &["surcharges", "baf", "caf", "fuel surcharge"]),
    ("volume_cbm", &["cbm", "volume", "cubic meters"]),
    ("weight_kg", &["weight", "kg", "kgs", "gross weight", "kilos"]),
    ("effective_date", &["valid from", "start date", "effective from"]),
    ("expiration_date", &["valid to", "end date", "valid until", "expiry"]),
    ("remarks", &["comments", "notes", "remark"]),
];

/// Outcome of verifying one header.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVerdict {
    pub label: String,
    pub confidence: f64,
    /// `mock-exact`, `mock-variant`, `mock-fuzzy`, `mock-unknown` or `openai`.
    pub method: String,
}

impl LabelVerdict {
    fn new(label: &str, confidence: f64, method: &str) -> Self {
        Self {
            label: label.to_string(),
            confidence,
            method: method.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }

    pub fn into_verdict(self) -> Verdict {
        Verdict::new(self.label, self.confidence, self.method)
    }
}

/// Assigns a vocabulary label to a raw header.
pub trait LabelVerifier {
    fn verify(&self, raw_header: &str) -> LabelVerdict;
}

/// Offline matcher over [`CONTROLLED_VOCABULARY`].
#[derive(Debug, Clone)]
pub struct VocabularyVerifier {
    entries: Vec<VocabularyEntry>,
}

#[derive(Debug, Clone)]
struct VocabularyEntry {
    label: String,
    /// Label with underscores as spaces.
    spoken: String,
    variants: Vec<String>,
    tokens: Vec<String>,
}

impl Default for VocabularyVerifier {
    fn default() -> Self {
        Self::new(
            CONTROLLED_VOCABULARY
                .iter()
                .map(|(label, variants)| (*label, variants.iter().copied())),
        )
    }
}

impl VocabularyVerifier {
    pub fn new<'a, V>(vocabulary: impl IntoIterator<Item = (&'a str, V)>) -> Self
    where
        V: IntoIterator<Item = &'a str>,
    {
        let entries = vocabulary
            .into_iter()
            .map(|(label, variants)| VocabularyEntry {
                label: label.to_string(),
                spoken: label.replace('_', " "),
                variants: variants.into_iter().map(normalize_label).collect(),
                tokens: label.split('_').map(str::to_string).collect(),
            })
            .collect();
        Self { entries }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }
}

impl LabelVerifier for VocabularyVerifier {
    fn verify(&self, raw_header: &str) -> LabelVerdict {
        let normalized = normalize_label(raw_header);
        for entry in &self.entries {
            if normalized == entry.spoken {
                return LabelVerdict::new(&entry.label, EXACT_CONFIDENCE, "mock-exact");
            }
            if entry.variants.iter().any(|v| *v == normalized) {
                return LabelVerdict::new(&entry.label, VARIANT_CONFIDENCE, "mock-variant");
            }
        }
        for entry in &self.entries {
            if entry
                .tokens
                .iter()
                .any(|token| normalized.contains(token.as_str()))
            {
                return LabelVerdict::new(&entry.label, FUZZY_CONFIDENCE, "mock-fuzzy");
            }
        }
        LabelVerdict::new(UNKNOWN_LABEL, UNKNOWN_CONFIDENCE, "mock-unknown")
    }
}

#[derive(Deserialize)]
struct LabelReply {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Verifier that asks the chat endpoint, falling back to the vocabulary.
#[derive(Debug, Clone)]
pub struct ChatLabelVerifier {
    client: ChatClient,
    fallback: VocabularyVerifier,
}

impl ChatLabelVerifier {
    pub fn new(client: ChatClient, fallback: VocabularyVerifier) -> Self {
        Self { client, fallback }
    }

    fn prompt(&self, raw_header: &str) -> String {
        let labels: Vec<&str> = self.fallback.labels().collect();
        format!(
            "Map the provided column header to one of the controlled vocabulary labels. \
             If none match, answer 'unknown'.\n\
             Controlled vocabulary keys: {labels:?}\n\
             Header: {raw_header}\n\
             Answer in JSON with keys: label, confidence (0-1)."
        )
    }

    fn ask(&self, raw_header: &str) -> Option<LabelVerdict> {
        let text = match self.client.complete(
            "You are a data labeling assistant.",
            &self.prompt(raw_header),
            MAX_TOKENS,
        ) {
            Ok(text) => text,
            Err(e) => {
                let error = fa_store::error_chain(&e);
                debug!(header = %raw_header, %error, "label verification call failed");
                return None;
            }
        };
        let json = JSON_OBJECT.find(&text)?;
        let reply: LabelReply = match serde_json::from_str(json.as_str()) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(header = %raw_header, error = %e, "unparseable label reply");
                return None;
            }
        };
        let label = reply.label.unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        let confidence = reply
            .confidence
            .unwrap_or(CHAT_DEFAULT_CONFIDENCE)
            .clamp(0.0, 1.0);
        Some(LabelVerdict {
            label,
            confidence,
            method: "openai".to_string(),
        })
    }
}

impl LabelVerifier for ChatLabelVerifier {
    fn verify(&self, raw_header: &str) -> LabelVerdict {
        self.ask(raw_header)
            .unwrap_or_else(|| self.fallback.verify(raw_header))
    }
}
