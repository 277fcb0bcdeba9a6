//! Pattern store persistence and merging.

pub mod error;
pub mod io;
pub mod labels;
pub mod merge;
pub mod repository;

pub use error::{Result, StoreError, error_chain};
pub use io::{load_json, save_json};
pub use labels::{LabelUpdates, SheetLabels, apply_label_updates};
pub use merge::{merge, merge_into};
pub use repository::{DEFAULT_STORE_FILE, PatternRepository};
