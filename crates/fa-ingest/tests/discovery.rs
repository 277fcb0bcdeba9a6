//! Tests for training-file pairing and document loading.

use std::fs;
use std::path::{Path, PathBuf};

use fa_ingest::{PairingMethod, load_document, pair_training_files};

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "{}").expect("write file");
    path
}

#[test]
fn pairs_files_by_normalized_name() {
    let dir = tempfile::tempdir().expect("temp dir");
    let empty = touch(dir.path(), "1. Blank CPT_Ocean.json");
    let filled = touch(dir.path(), "4. Filled CPT_Ocean.json");
    touch(dir.path(), "notes.json");
    touch(dir.path(), "Air_empty.json");
    touch(dir.path(), "readme.txt");

    let pairs = pair_training_files(dir.path()).expect("pair files");
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].empty, empty);
    assert_eq!(pairs[0].filled, filled);
    assert_eq!(pairs[0].method, PairingMethod::Normalized);
}

#[test]
fn fallback_pairs_files_missed_by_normalization() {
    let dir = tempfile::tempdir().expect("temp dir");
    // The ordinal-prefix rule only knows "blank"/"filled", so these two
    // normalize to different keys and only the fallback pairs them.
    let empty = touch(dir.path(), "1. Empty rates.json");
    let filled = touch(dir.path(), "1. Filled rates.json");

    let pairs = pair_training_files(dir.path()).expect("pair files");
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].key, "1.  rates");
    assert_eq!(pairs[0].empty, empty);
    assert_eq!(pairs[0].filled, filled);
    assert_eq!(pairs[0].method, PairingMethod::Fallback);
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope");
    assert!(pair_training_files(&missing).is_err());
}

#[test]
fn loads_document_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("doc.json");
    fs::write(
        &path,
        r#"{"Rates": {"columns": ["col_0", "col_1", "col_2"], "data": [{"col_0": "A", "col_1": 1}]}}"#,
    )
    .expect("write doc");

    let doc = load_document(&path).expect("load");
    let rates = doc.sheet("Rates").expect("sheet");
    assert_eq!(rates.row_count(), 1);
    assert_eq!(rates.cell(0, "col_1"), "1");
}
