use std::path::PathBuf;

use fa_learn::PairReport;
use fa_model::IdentifyReport;

#[derive(Debug)]
pub struct TrainResult {
    pub store_path: PathBuf,
    pub pairs: Vec<PairReport>,
    pub learned_sheets: usize,
    pub fillable_columns: usize,
    pub failed_pairs: usize,
}

#[derive(Debug)]
pub struct IdentifyResult {
    pub file: PathBuf,
    pub report: IdentifyReport,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct UpdateResult {
    pub store_path: PathBuf,
    pub sheets: usize,
    pub labels_applied: usize,
}
