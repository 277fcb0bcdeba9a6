//! Identification of fillable columns in new documents.
//!
//! Headers of each sheet are matched against learned patterns, first across
//! all learned sheets and, when that is inconclusive, against the learned
//! sheet of the same name.

pub mod cross_sheet;
pub mod engine;
pub mod headers;
pub mod sheet_first;
pub mod similarity;

pub use cross_sheet::{CrossSheetMatch, MatchType, best_match};
pub use engine::{IdentifyOptions, Identifier};
pub use headers::SheetHeaders;
pub use similarity::header_similarity;
