//! Training tests over small empty/filled documents.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::json;

use fa_header::{
    HeaderDetector, ScorerConfig, SemanticValidator, ValidationOutcome, ValidationRequest,
    VocabularyVerifier,
};
use fa_learn::{LearnError, PairStatus, Trainer, TrainerOptions};
use fa_model::{
    Document, FillReason, HeaderDetectionMethod, PatternStore, Sheet, ValueType, Verdict,
};

fn rates_json(filled: bool) -> serde_json::Value {
    let rate = |value: &'static str| if filled { value } else { "" };
    json!({
        "Rates": {
            "columns": ["Lane", "Origin", "Rate"],
            "data": [
                {"Lane": "1", "Origin": "CNSHA", "Rate": rate("1200")},
                {"Lane": "2", "Origin": "CNNGB", "Rate": rate("1350")},
                {"Lane": "3", "Origin": "CNTAO", "Rate": rate("1100")},
            ]
        },
        "Instructions": {
            "columns": ["Step", "Text", "Owner"],
            "data": [{"Step": "1"}, {"Step": "2"}]
        }
    })
}

fn rates_document(filled: bool) -> Document {
    serde_json::from_value(rates_json(filled)).expect("valid document")
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write document");
}

fn offline_trainer(options: TrainerOptions) -> Trainer {
    Trainer::new(
        HeaderDetector::offline(),
        Box::new(VocabularyVerifier::default()),
        options,
    )
}

#[test]
fn learns_filled_rate_column() {
    let mut trainer = offline_trainer(TrainerOptions::default());
    let learning = trainer.learn_from_documents(
        "Filled Rates.json",
        &rates_document(false),
        &rates_document(true),
    );

    assert_eq!(learning.sheets.len(), 1);
    assert_eq!(learning.sheets[0].sheet, "Rates");
    assert_eq!(learning.sheets[0].analyzed_columns, 2);
    assert_eq!(learning.sheets[0].fillable_columns, 1);
    assert_eq!(learning.sheets[0].detection_method, HeaderDetectionMethod::Basic);

    let rates = learning.store.sheet("Rates").expect("rates learned");
    assert!(rates.is_fillable("rate"));
    assert!(!rates.is_fillable("origin"));
    assert_eq!(rates.column_positions.get("rate"), Some(&2));
    assert!(rates.header_map["origin"].contains("origin"));

    let pattern = rates.value_pattern("rate").expect("rate pattern");
    assert_eq!(pattern.value_types, vec![ValueType::Numeric]);

    let verdict = rates.verdict("rate").expect("rate verdict");
    assert_eq!(verdict.label, "rate");
    assert_eq!(verdict.confidence, 1.0);
    assert_eq!(verdict.method, "mock-exact+pattern");
    let analysis = verdict.pattern_analysis.as_ref().expect("analysis kept");
    assert!(analysis.has_reason(FillReason::EmptyToFilled));

    let origin = rates.verdict("origin").expect("origin verdict");
    assert_eq!(origin.label, "origin_port");
    assert_eq!(origin.method, "mock-variant");
}

#[test]
fn requested_sheet_missing_from_pair_is_skipped() {
    let mut trainer = offline_trainer(TrainerOptions {
        sheet: Some("Air".to_string()),
        ..TrainerOptions::default()
    });
    let learning =
        trainer.learn_from_documents("f.json", &rates_document(false), &rates_document(true));
    assert!(learning.store.is_empty());
    assert_eq!(learning.skipped_sheets, vec!["Air".to_string()]);
}

struct RenamingValidator;

impl SemanticValidator for RenamingValidator {
    fn validate(&mut self, _request: &ValidationRequest<'_>) -> ValidationOutcome {
        ValidationOutcome::Validated {
            mapping: BTreeMap::from([("col_2".to_string(), "Bid Rate".to_string())]),
            confidence: 0.9,
            reasoning: "rate column".to_string(),
        }
    }
}

#[test]
fn validated_headers_mark_sheet_enhanced() {
    let mut trainer = Trainer::new(
        HeaderDetector::new(ScorerConfig::default(), Box::new(RenamingValidator)),
        Box::new(VocabularyVerifier::default()),
        TrainerOptions::default(),
    );
    let learning =
        trainer.learn_from_documents("f.json", &rates_document(false), &rates_document(true));
    let rates = learning.store.sheet("Rates").expect("rates learned");
    assert_eq!(rates.header_detection_method, HeaderDetectionMethod::Enhanced);
    assert!(rates.is_fillable("bid rate"));
    assert!(!rates.is_fillable("rate"));
}

#[test]
fn basic_headers_only_when_enhancement_disabled() {
    let mut trainer = Trainer::new(
        HeaderDetector::new(ScorerConfig::default(), Box::new(RenamingValidator)),
        Box::new(VocabularyVerifier::default()),
        TrainerOptions {
            use_enhanced_headers: false,
            ..TrainerOptions::default()
        },
    );
    let learning =
        trainer.learn_from_documents("f.json", &rates_document(false), &rates_document(true));
    let rates = learning.store.sheet("Rates").expect("rates learned");
    assert_eq!(rates.header_detection_method, HeaderDetectionMethod::Basic);
    assert!(rates.is_fillable("rate"));
}

#[test]
fn directory_training_merges_into_base_and_survives_bad_pairs() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "1. Blank Ocean.json", &rates_json(false).to_string());
    write(dir.path(), "4. Filled Ocean.json", &rates_json(true).to_string());
    write(dir.path(), "1. Blank Broken.json", "not json");
    write(dir.path(), "4. Filled Broken.json", "{}");

    let mut base = PatternStore::new();
    let air = base.sheet_mut("Air");
    air.columns_to_fill.insert("weight".to_string());
    air.verifications
        .insert("weight".to_string(), Verdict::user("weight_kg"));

    let mut trainer = offline_trainer(TrainerOptions::default());
    let run = trainer
        .train_directory(dir.path(), base)
        .expect("training runs");

    assert_eq!(run.pairs.len(), 2);
    assert_eq!(run.failed_pairs(), 1);
    assert!(run.pairs.iter().any(|report| matches!(
        &report.status,
        PairStatus::Learned(sheets) if sheets.len() == 1
    )));
    assert!(run.store.sheet("Air").expect("base kept").is_fillable("weight"));
    assert!(run.store.sheet("Rates").expect("rates learned").is_fillable("rate"));
    assert_eq!(run.store.fillable_count(), 2);
}

#[test]
fn directory_without_pairs_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "notes.json", "{}");
    let mut trainer = offline_trainer(TrainerOptions::default());
    let err = trainer
        .train_directory(dir.path(), PatternStore::new())
        .expect_err("no pairs");
    assert!(matches!(err, LearnError::NoTrainingPairs { .. }));
}

#[test]
fn sheets_without_declared_columns_use_densest_row() {
    let empty = Sheet::from_grid([
        vec!["Lane", "Origin", "Rate"],
        vec!["1", "CNSHA", ""],
        vec!["2", "CNNGB", ""],
    ]);
    let filled = Sheet::from_grid([
        vec!["Lane", "Origin", "Rate"],
        vec!["1", "CNSHA", "1200"],
        vec!["2", "CNNGB", "1350"],
    ]);
    let mut empty_doc = Document::new();
    empty_doc.insert("Rates", Sheet::new(Vec::new(), empty.rows));
    let mut filled_doc = Document::new();
    filled_doc.insert("Rates", Sheet::new(Vec::new(), filled.rows));

    let mut trainer = offline_trainer(TrainerOptions {
        sheet: Some("Rates".to_string()),
        ..TrainerOptions::default()
    });
    let learning = trainer.learn_from_documents("f.json", &empty_doc, &filled_doc);
    let rates = learning.store.sheet("Rates").expect("rates learned");
    assert!(rates.is_fillable("rate"));
    assert_eq!(rates.column_positions.get("rate"), Some(&2));
}
