//! Training error types.

use std::path::PathBuf;

use thiserror::Error;

use fa_ingest::IngestError;

#[derive(Debug, Error)]
pub enum LearnError {
    /// The training directory holds no empty/filled pair.
    #[error("no training pairs found in {path}")]
    NoTrainingPairs { path: PathBuf },

    /// A document or directory could not be read.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, LearnError>;
