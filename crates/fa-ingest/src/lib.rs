pub mod discovery;
pub mod document;
pub mod error;
pub mod header;
pub mod sheets;

pub use discovery::{
    FileRole, PairingMethod, TrainingPair, list_json_files, normalize_filename_for_pairing,
    pair_training_files,
};
pub use document::{cell_text, load_document, parse_document};
pub use error::{IngestError, Result};
pub use header::{BasicHeaders, detect_header_row, value_columns};
pub use sheets::{find_data_sheets, has_data_shape, is_metadata_sheet};
