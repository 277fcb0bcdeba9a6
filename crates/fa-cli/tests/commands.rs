//! End-to-end command tests with the offline header stack.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use fa_cli::cli::{HeaderArgs, IdentifyArgs, TrainArgs, UpdateArgs};
use fa_cli::commands::{run_identify, run_train, run_update};
use fa_header::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use fa_learn::PairStatus;
use fa_model::{Decision, PatternStore};
use fa_store::PatternRepository;

fn ocean_json(filled: bool) -> serde_json::Value {
    let rate = |value: &'static str| if filled { value } else { "" };
    json!({
        "Ocean": {
            "columns": ["Lane", "Origin", "Rate"],
            "data": [
                {"Lane": "1", "Origin": "CNSHA", "Rate": rate("1200")},
                {"Lane": "2", "Origin": "CNNGB", "Rate": rate("1350")},
                {"Lane": "3", "Origin": "CNTAO", "Rate": rate("1100")},
            ]
        }
    })
}

fn offline_headers(dir: &Path) -> HeaderArgs {
    HeaderArgs {
        no_enhanced_headers: false,
        api_key: None,
        model: DEFAULT_MODEL.to_string(),
        base_url: DEFAULT_BASE_URL.to_string(),
        mock: true,
        history: dir.join("history.json"),
    }
}

fn train_args(data_dir: &Path, store: &Path) -> TrainArgs {
    TrainArgs {
        data_dir: data_dir.to_path_buf(),
        store: store.to_path_buf(),
        sheet: None,
        fresh: false,
        headers: offline_headers(data_dir),
    }
}

fn write_pair(dir: &Path) -> PathBuf {
    let empty = dir.join("1. Blank Ocean.json");
    fs::write(&empty, ocean_json(false).to_string()).expect("write empty");
    fs::write(dir.join("4. Filled Ocean.json"), ocean_json(true).to_string())
        .expect("write filled");
    empty
}

#[test]
fn train_identify_and_update_share_one_store() {
    let data = tempfile::tempdir().expect("data dir");
    let work = tempfile::tempdir().expect("work dir");
    let empty = write_pair(data.path());
    let store_path = work.path().join("patterns.json");

    let trained = run_train(&train_args(data.path(), &store_path)).expect("train");
    assert_eq!(trained.pairs.len(), 1);
    assert!(matches!(trained.pairs[0].status, PairStatus::Learned(_)));
    assert_eq!(trained.learned_sheets, 1);
    assert_eq!(trained.fillable_columns, 1);
    assert_eq!(trained.failed_pairs, 0);

    let out = work.path().join("report.json");
    let identified = run_identify(&IdentifyArgs {
        file: empty,
        store: store_path.clone(),
        sheets: Vec::new(),
        // origin's learned verdict alone scores 0.9 * 0.85
        threshold: 0.8,
        out: Some(out.clone()),
        headers: offline_headers(work.path()),
    })
    .expect("identify");
    let ocean = identified.report.primary().expect("primary sheet");
    assert_eq!(ocean.columns.len(), 1);
    assert_eq!(ocean.columns[0].header, "rate");
    assert_eq!(ocean.columns[0].decision, Decision::Fill);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read report")).expect("json");
    assert_eq!(written["strategy"], "cross_sheet");
    assert_eq!(written["summary"]["total_fillable_columns"], 1);
    assert_eq!(written["sheets"]["Ocean"]["columns"][0]["decision"], "fill");

    let labels = work.path().join("labels.json");
    fs::write(
        &labels,
        json!({"Ocean": {"column_labels": {"origin": "origin_port"}}}).to_string(),
    )
    .expect("write labels");
    let updated = run_update(&UpdateArgs {
        store: store_path.clone(),
        labels,
    })
    .expect("update");
    assert_eq!(updated.labels_applied, 1);
    assert_eq!(updated.sheets, 1);

    let store: PatternStore = PatternRepository::new(&store_path)
        .load()
        .expect("load store")
        .expect("store exists");
    let ocean = store.sheet("Ocean").expect("ocean sheet");
    assert!(ocean.is_fillable("origin"));
    let verdict = ocean.verdict("origin").expect("user verdict");
    assert_eq!(verdict.label, "origin_port");
    assert_eq!(verdict.method, "user");
}

#[test]
fn retraining_merges_unless_fresh() {
    let data = tempfile::tempdir().expect("data dir");
    let work = tempfile::tempdir().expect("work dir");
    write_pair(data.path());
    let store_path = work.path().join("patterns.json");

    let mut base = PatternStore::new();
    base.sheet_mut("Air").columns_to_fill.insert("rate".to_string());
    PatternRepository::new(&store_path)
        .save(&base)
        .expect("seed store");

    let merged = run_train(&train_args(data.path(), &store_path)).expect("train");
    assert_eq!(merged.learned_sheets, 2);

    let mut fresh = train_args(data.path(), &store_path);
    fresh.fresh = true;
    let replaced = run_train(&fresh).expect("fresh train");
    assert_eq!(replaced.learned_sheets, 1);
}

#[test]
fn train_without_pairs_fails() {
    let data = tempfile::tempdir().expect("data dir");
    fs::write(data.path().join("notes.json"), "{}").expect("write file");
    let store_path = data.path().join("patterns.json");

    let error = run_train(&train_args(data.path(), &store_path)).expect_err("no pairs");
    assert!(format!("{error:#}").contains("train from"));
    assert!(!store_path.exists());
}

#[test]
fn identify_requires_a_trained_store() {
    let work = tempfile::tempdir().expect("work dir");
    let file = work.path().join("tender.json");
    fs::write(&file, ocean_json(false).to_string()).expect("write tender");

    let error = run_identify(&IdentifyArgs {
        file,
        store: work.path().join("missing.json"),
        sheets: Vec::new(),
        threshold: 0.7,
        out: None,
        headers: offline_headers(work.path()),
    })
    .expect_err("missing store");
    assert!(error.to_string().contains("run `train` first"));
}

#[test]
fn corrupt_decision_history_does_not_block_commands() {
    let data = tempfile::tempdir().expect("data dir");
    let work = tempfile::tempdir().expect("work dir");
    let empty = write_pair(data.path());
    let store_path = work.path().join("patterns.json");
    let history = work.path().join("history.json");
    fs::write(&history, "{ not json").expect("write history");

    // Nothing listens on the discard port, so every chat call is unavailable.
    let headers = HeaderArgs {
        api_key: Some("sk-test".to_string()),
        base_url: "http://127.0.0.1:9/v1".to_string(),
        mock: false,
        history,
        ..offline_headers(work.path())
    };

    let mut args = train_args(data.path(), &store_path);
    args.headers = headers.clone();
    let trained = run_train(&args).expect("train with corrupt history");
    assert_eq!(trained.failed_pairs, 0);
    assert_eq!(trained.learned_sheets, 1);

    let identified = run_identify(&IdentifyArgs {
        file: empty,
        store: store_path,
        sheets: Vec::new(),
        threshold: 0.8,
        out: None,
        headers,
    })
    .expect("identify with corrupt history");
    assert!(identified.report.primary().is_some());
}
