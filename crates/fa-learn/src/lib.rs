//! Learning which spreadsheet columns get filled in.
//!
//! Compares empty and filled versions of the same document, scores each
//! column's fillability and records the result in a [`fa_model::PatternStore`].

pub mod error;
pub mod fillability;
pub mod trainer;
pub mod value_pattern;

pub use error::{LearnError, Result};
pub use fillability::{FillabilityWeights, SAMPLE_LIMIT, analyze_column, column_values};
pub use trainer::{
    PairLearning, PairReport, PairStatus, SheetLearning, Trainer, TrainerOptions, TrainingRun,
};
pub use value_pattern::learn_value_patterns;
