use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{Level, info, info_span, trace, warn};

use fa_header::{
    ChatClient, ChatConfig, ChatLabelVerifier, ChatValidator, HeaderDetector, HistoryRepository,
    LabelVerifier, ScorerConfig, VocabularyVerifier,
};
use fa_identify::{IdentifyOptions, Identifier};
use fa_learn::{Trainer, TrainerOptions};
use fa_model::{Document, IdentifyReport, PatternStore};
use fa_store::{LabelUpdates, PatternRepository, apply_label_updates};

use crate::cli::{HeaderArgs, IdentifyArgs, TrainArgs, UpdateArgs};
use crate::logging::redact_value;
use crate::types::{IdentifyResult, TrainResult, UpdateResult};

/// Fallback environment variable for the chat API key.
const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Cell values traced per fill column when `--log-data` is set.
const TRACED_SAMPLES: usize = 3;

/// Header detector and label verifier for the configured validator mode.
pub fn build_header_stack(args: &HeaderArgs) -> Result<(HeaderDetector, Box<dyn LabelVerifier>)> {
    if args.mock {
        info!("mock mode, using offline header detection and vocabulary labels");
        return Ok(offline_stack());
    }
    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|key| !key.trim().is_empty());
    let Some(api_key) = api_key else {
        warn!("no API key configured, semantic header validation disabled");
        return Ok(offline_stack());
    };

    let config = ChatConfig::new(api_key)
        .with_model(&args.model)
        .with_base_url(&args.base_url);
    let client = ChatClient::new(config).context("build chat client")?;
    let repository = HistoryRepository::new(&args.history);
    let history = repository.load_or_new();
    let validator = ChatValidator::new(client.clone(), history).with_repository(repository);
    let detector = HeaderDetector::new(ScorerConfig::default(), Box::new(validator));
    let verifier = ChatLabelVerifier::new(client, VocabularyVerifier::default());
    Ok((detector, Box::new(verifier)))
}

fn offline_stack() -> (HeaderDetector, Box<dyn LabelVerifier>) {
    (
        HeaderDetector::offline(),
        Box::new(VocabularyVerifier::default()),
    )
}

pub fn run_train(args: &TrainArgs) -> Result<TrainResult> {
    let span = info_span!("train_command", data_dir = %args.data_dir.display());
    let _guard = span.enter();

    let repository = PatternRepository::new(&args.store);
    let base = if args.fresh {
        info!("starting from an empty store");
        PatternStore::new()
    } else {
        repository
            .load_or_default()
            .with_context(|| format!("load pattern store {}", args.store.display()))?
    };

    let (detector, verifier) = build_header_stack(&args.headers)?;
    let options = TrainerOptions {
        sheet: args.sheet.clone(),
        use_enhanced_headers: !args.headers.no_enhanced_headers,
        ..TrainerOptions::default()
    };
    let mut trainer = Trainer::new(detector, verifier, options);
    let run = trainer
        .train_directory(&args.data_dir, base)
        .with_context(|| format!("train from {}", args.data_dir.display()))?;

    repository
        .save(&run.store)
        .with_context(|| format!("save pattern store {}", args.store.display()))?;

    Ok(TrainResult {
        store_path: args.store.clone(),
        learned_sheets: run.store.sheets.len(),
        fillable_columns: run.store.fillable_count(),
        failed_pairs: run.failed_pairs(),
        pairs: run.pairs,
    })
}

pub fn run_identify(args: &IdentifyArgs) -> Result<IdentifyResult> {
    let repository = PatternRepository::new(&args.store);
    let store = repository
        .load()
        .with_context(|| format!("load pattern store {}", args.store.display()))?
        .with_context(|| {
            format!(
                "pattern store {} not found, run `train` first",
                args.store.display()
            )
        })?;
    let document = fa_ingest::load_document(&args.file)
        .with_context(|| format!("load document {}", args.file.display()))?;

    let (detector, verifier) = build_header_stack(&args.headers)?;
    let options = IdentifyOptions {
        threshold: args.threshold,
        sheets: args.sheets.clone(),
        use_enhanced_headers: !args.headers.no_enhanced_headers,
    };
    let mut identifier = Identifier::new(detector, verifier, options);
    let file_name = args
        .file
        .file_name()
        .map_or_else(|| args.file.display().to_string(), |n| n.to_string_lossy().into_owned());
    let report = identifier.identify(&file_name, &document, &store);
    trace_fill_samples(&document, &report);

    if let Some(path) = &args.out {
        write_report(path, &report)?;
    }

    Ok(IdentifyResult {
        file: args.file.clone(),
        report,
        report_path: args.out.clone(),
    })
}

fn write_report(path: &Path, report: &IdentifyReport) -> Result<()> {
    let start = Instant::now();
    fa_store::save_json(path, report)
        .with_context(|| format!("write report {}", path.display()))?;
    info!(
        path = %path.display(),
        duration_ms = start.elapsed().as_millis(),
        "report written"
    );
    Ok(())
}

/// Trace a few cells of every fill column, masked unless `--log-data` is set.
fn trace_fill_samples(document: &Document, report: &IdentifyReport) {
    if !tracing::enabled!(Level::TRACE) {
        return;
    }
    for (name, outcome) in &report.sheets {
        let (Some(sheet), Some(sheet_report)) = (document.sheet(name), outcome.report()) else {
            continue;
        };
        let keys = sheet.column_keys();
        for column in &sheet_report.columns {
            let Some(key) = keys.get(column.position) else {
                continue;
            };
            let samples: Vec<&str> = (0..sheet.row_count())
                .map(|row| sheet.cell(row, key))
                .filter(|value| !value.trim().is_empty())
                .take(TRACED_SAMPLES)
                .map(redact_value)
                .collect();
            trace!(sheet = %name, column = %column.header, ?samples, "fill column samples");
        }
    }
}

pub fn run_update(args: &UpdateArgs) -> Result<UpdateResult> {
    let repository = PatternRepository::new(&args.store);
    let mut store = repository
        .load_or_default()
        .with_context(|| format!("load pattern store {}", args.store.display()))?;
    let updates = LabelUpdates::load(&args.labels)
        .with_context(|| format!("load labels {}", args.labels.display()))?;

    let labels_applied = apply_label_updates(&mut store, &updates);
    repository
        .save(&store)
        .with_context(|| format!("save pattern store {}", args.store.display()))?;
    info!(
        sheets = updates.sheets.len(),
        labels = labels_applied,
        "labels applied"
    );

    Ok(UpdateResult {
        store_path: args.store.clone(),
        sheets: updates.sheets.len(),
        labels_applied,
    })
}
