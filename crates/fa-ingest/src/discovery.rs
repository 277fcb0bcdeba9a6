//! Training-file discovery and empty/filled pairing.
//!
//! A training folder holds JSON exports of the same workbook before and after
//! it was filled in. File names carry the role (`empty`/`blank` vs `filled`)
//! plus noise such as ordinal prefixes and package suffixes; pairing strips
//! that noise to derive a shared key.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{IngestError, Result};

static ORDINAL_ROLE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.\s*(blank|filled?)\s*").expect("valid regex"));
static UNDERSCORE_ROLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_?(empty|filled?|blank)_?").expect("valid regex"));
static SPACED_ROLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(empty|filled?|blank)\s+").expect("valid regex"));
static TRAILING_ROLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(empty|filled?|blank)(_[^.]*)?\.json$").expect("valid regex")
});
static PACKAGE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*pkg\d*").expect("valid regex"));
static DASH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*[a-z0-9]+$").expect("valid regex"));
static REPEATED_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").expect("valid regex"));
static REPEATED_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));
static FALLBACK_EMPTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*)(?:empty|blank)(.*)\.json$").expect("valid regex"));
static FALLBACK_FILLED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*)(?:filled?)(.*)\.json$").expect("valid regex"));

/// Role a file name signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Empty,
    Filled,
}

impl FileRole {
    /// Classify a file name; `None` when it carries no role word.
    pub fn of(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();
        if lower.contains("empty") || lower.contains("blank") {
            Some(Self::Empty)
        } else if lower.contains("filled") || lower.contains("fill") {
            Some(Self::Filled)
        } else {
            None
        }
    }
}

/// How a pair was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingMethod {
    /// Normalized file-name keys matched.
    Normalized,
    /// Text around the role word matched.
    Fallback,
}

/// An empty/filled document pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingPair {
    pub key: String,
    pub empty: PathBuf,
    pub filled: PathBuf,
    pub method: PairingMethod,
}

/// Lists all JSON files in a directory, sorted by file name.
pub fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Derive the pairing key of a training file name.
pub fn normalize_filename_for_pairing(file_name: &str) -> String {
    let base = file_name.to_lowercase();
    let base = ORDINAL_ROLE_PREFIX.replace(&base, "");
    let base = UNDERSCORE_ROLE.replace_all(&base, "_");
    let base = SPACED_ROLE.replace_all(&base, " ");
    let base = TRAILING_ROLE.replace(&base, ".json");
    let base = PACKAGE_SUFFIX.replace_all(&base, "");
    let stem = base.replace(".json", "");
    let base = format!("{}.json", DASH_SUFFIX.replace(&stem, ""));
    let base = REPEATED_UNDERSCORES.replace_all(&base, "_");
    let base = REPEATED_SPACES.replace_all(&base, " ");
    base.trim_matches('_').trim().to_string()
}

/// Pair empty and filled documents found in `dir`.
///
/// Files without a role word, or whose key has no counterpart, are left out.
pub fn pair_training_files(dir: &Path) -> Result<Vec<TrainingPair>> {
    let files = list_json_files(dir)?;
    let names: Vec<(&PathBuf, String)> = files
        .iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            Some((path, name))
        })
        .collect();

    let mut empties: BTreeMap<String, &PathBuf> = BTreeMap::new();
    let mut filleds: BTreeMap<String, &PathBuf> = BTreeMap::new();
    for (path, name) in &names {
        let Some(role) = FileRole::of(name) else {
            continue;
        };
        let key = normalize_filename_for_pairing(name);
        debug!(file = %name, key = %key, ?role, "classified training file");
        match role {
            FileRole::Empty => empties.insert(key, *path),
            FileRole::Filled => filleds.insert(key, *path),
        };
    }

    let mut pairs: Vec<TrainingPair> = empties
        .iter()
        .filter_map(|(key, empty)| {
            filleds.get(key).map(|filled| TrainingPair {
                key: key.clone(),
                empty: (*empty).clone(),
                filled: (*filled).clone(),
                method: PairingMethod::Normalized,
            })
        })
        .collect();

    let mut used: BTreeSet<PathBuf> = pairs
        .iter()
        .flat_map(|pair| [pair.empty.clone(), pair.filled.clone()])
        .collect();
    let mut fallback_empties: BTreeMap<String, &PathBuf> = BTreeMap::new();
    let mut fallback_filleds: BTreeMap<String, &PathBuf> = BTreeMap::new();
    for (path, name) in &names {
        if let Some(key) = fallback_key(&FALLBACK_EMPTY, name) {
            fallback_empties.insert(key, *path);
        } else if let Some(key) = fallback_key(&FALLBACK_FILLED, name) {
            fallback_filleds.insert(key, *path);
        }
    }
    for (key, empty) in &fallback_empties {
        let Some(filled) = fallback_filleds.get(key) else {
            continue;
        };
        if used.contains(*empty) || used.contains(*filled) {
            continue;
        }
        debug!(key = %key, "paired by fallback");
        used.insert((*empty).clone());
        used.insert((*filled).clone());
        pairs.push(TrainingPair {
            key: key.clone(),
            empty: (*empty).clone(),
            filled: (*filled).clone(),
            method: PairingMethod::Fallback,
        });
    }

    Ok(pairs)
}

fn fallback_key(pattern: &Regex, name: &str) -> Option<String> {
    let captures = pattern.captures(name)?;
    let head = captures.get(1).map_or("", |m| m.as_str());
    let tail = captures.get(2).map_or("", |m| m.as_str());
    Some(format!("{head}{tail}").to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_ordinal_prefixes() {
        assert_eq!(
            normalize_filename_for_pairing("1. Blank CPT_Rates.json"),
            normalize_filename_for_pairing("4. Filled CPT_Rates.json"),
        );
    }

    #[test]
    fn normalizes_underscore_roles() {
        assert_eq!(
            normalize_filename_for_pairing("tender_empty_v2.json"),
            "tender_v2.json"
        );
        assert_eq!(
            normalize_filename_for_pairing("tender_filled_v2.json"),
            "tender_v2.json"
        );
    }

    #[test]
    fn strips_package_suffixes() {
        assert_eq!(
            normalize_filename_for_pairing("Ocean Tender Empty - PKG1.json"),
            normalize_filename_for_pairing("Ocean Tender Filled - PKG2.json"),
        );
    }

    #[test]
    fn classifies_roles() {
        assert_eq!(FileRole::of("Rates BLANK.json"), Some(FileRole::Empty));
        assert_eq!(FileRole::of("rates_filled.json"), Some(FileRole::Filled));
        assert_eq!(FileRole::of("rates_fill.json"), Some(FileRole::Filled));
        assert_eq!(FileRole::of("rates.json"), None);
    }
}
