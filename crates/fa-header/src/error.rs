//! Header detection error types.

use thiserror::Error;

/// Errors raised while talking to the chat endpoint or persisting history.
///
/// Validator and verifier implementations convert these into degraded
/// outcomes; they never reach the fillability analysis.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// Transport failure, including timeouts.
    #[error("chat request failed")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("chat endpoint returned {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Response had no message content.
    #[error("chat response contained no message content")]
    EmptyResponse,

    /// Decision history could not be read or written.
    #[error("decision history")]
    History(#[from] fa_store::StoreError),
}

/// Result type for header detection operations.
pub type Result<T> = std::result::Result<T, HeaderError>;
