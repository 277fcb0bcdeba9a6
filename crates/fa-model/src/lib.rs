pub mod document;
pub mod normalize;
pub mod report;
pub mod store;
pub mod verdict;

pub use document::{Document, Row, Sheet, generic_column, generic_column_index};
pub use normalize::{normalize_header, normalize_label};
pub use report::{
    ColumnDecision, Decision, HeaderEnhancement, IdentifyReport, IdentifyStrategy, ReportError,
    ReportSummary, SheetOutcome, SheetReport,
};
pub use store::{HeaderDetectionMethod, PatternStore, SheetPatterns};
pub use verdict::{FillAnalysis, FillReason, LengthStats, ValuePattern, ValueType, Verdict};
