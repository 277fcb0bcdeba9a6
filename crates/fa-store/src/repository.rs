//! File-backed pattern store.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use fa_model::PatternStore;

use crate::error::Result;
use crate::io::{load_json, save_json};

/// Default file name of the pattern store.
pub const DEFAULT_STORE_FILE: &str = "patterns_store.json";

/// Loads and saves a [`PatternStore`] at a fixed path.
#[derive(Debug, Clone)]
pub struct PatternRepository {
    path: PathBuf,
}

impl PatternRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store, or `None` if the file does not exist yet.
    pub fn load(&self) -> Result<Option<PatternStore>> {
        let store: Option<PatternStore> = load_json(&self.path)?;
        if let Some(store) = &store {
            debug!(
                path = %self.path.display(),
                sheets = store.sheets.len(),
                fillable = store.fillable_count(),
                "loaded pattern store"
            );
        }
        Ok(store)
    }

    /// Load the store, starting empty when the file does not exist.
    pub fn load_or_default(&self) -> Result<PatternStore> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Replace the stored file atomically.
    pub fn save(&self, store: &PatternStore) -> Result<()> {
        save_json(&self.path, store)?;
        info!(
            path = %self.path.display(),
            sheets = store.sheets.len(),
            "saved pattern store"
        );
        Ok(())
    }
}
