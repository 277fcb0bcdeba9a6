//! Header detection for bid spreadsheets.
//!
//! Ranks candidate header rows, cleans template markup out of header cells,
//! optionally confirms the result with a semantic validator, and maps raw
//! headers onto a controlled label vocabulary.

pub mod chat;
pub mod clean;
pub mod detect;
pub mod error;
pub mod history;
pub mod label;
pub mod scorer;
pub mod validator;

pub use chat::{ChatClient, ChatConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use clean::{TEMPLATE_PATTERNS, clean_header_name, extract_clean_headers, has_template_marker};
pub use detect::{
    HeaderDetection, HeaderDetector, IDENTIFY_ACCEPT_CONFIDENCE, TRAIN_ACCEPT_CONFIDENCE,
    apply_enhanced_headers,
};
pub use error::{HeaderError, Result};
pub use history::{
    DEFAULT_HISTORY_FILE, DecisionHistory, DecisionRecord, HistoryRepository, LearningPatterns,
};
pub use label::{
    CONTROLLED_VOCABULARY, ChatLabelVerifier, LabelVerdict, LabelVerifier, UNKNOWN_LABEL,
    VocabularyVerifier,
};
pub use scorer::{
    BUSINESS_KEYWORDS, CandidateRanking, HeaderCandidate, HeaderScorer, RowScore, ScoreComponent,
    ScorerConfig, Strategy,
};
pub use validator::{
    ChatValidator, NoValidator, SemanticValidator, ValidationOutcome, ValidationRequest,
    ValidatorReply, parse_validator_response, prepare_context,
};
