use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use fa_cli::types::{IdentifyResult, TrainResult, UpdateResult};
use fa_ingest::PairingMethod;
use fa_learn::{PairReport, PairStatus};
use fa_model::{HeaderDetectionMethod, IdentifyReport, IdentifyStrategy, SheetOutcome};


pub fn print_train_summary(result: &TrainResult) {
    println!("Store: {}", result.store_path.display());
    println!("{}", train_table(&result.pairs));
    println!(
        "Learned sheets: {}, fillable columns: {}",
        result.learned_sheets, result.fillable_columns
    );
    if result.failed_pairs > 0 {
        eprintln!("Failed pairs:");
        for report in &result.pairs {
            if let PairStatus::Failed(error) = &report.status {
                eprintln!("- {}: {error}", report.pair.key);
            }
        }
    }
}

fn train_table(pairs: &[PairReport]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Pair"),
        header_cell("Matched by"),
        header_cell("Sheets"),
        header_cell("Enhanced"),
        header_cell("Fillable"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);

    let mut total_sheets = 0usize;
    let mut total_fillable = 0usize;
    for report in pairs {
        let method = match report.pair.method {
            PairingMethod::Normalized => dim_cell("name"),
            PairingMethod::Fallback => Cell::new("fallback").fg(Color::Yellow),
        };
        match &report.status {
            PairStatus::Learned(sheets) => {
                let enhanced = sheets
                    .iter()
                    .filter(|sheet| sheet.detection_method == HeaderDetectionMethod::Enhanced)
                    .count();
                let fillable: usize = sheets.iter().map(|sheet| sheet.fillable_columns).sum();
                total_sheets += sheets.len();
                total_fillable += fillable;
                table.add_row(vec![
                    Cell::new(&report.pair.key),
                    method,
                    Cell::new(sheets.len()),
                    count_cell(Some(enhanced), Color::Blue),
                    count_cell(Some(fillable), Color::Green),
                    Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold),
                ]);
            }
            PairStatus::Failed(_) => {
                table.add_row(vec![
                    Cell::new(&report.pair.key),
                    method,
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    Cell::new("FAILED").fg(Color::Red).add_attribute(Attribute::Bold),
                ]);
            }
        }
    }
    table.add_row(vec![
        header_cell("TOTAL"),
        dim_cell("-"),
        Cell::new(total_sheets).add_attribute(Attribute::Bold),
        dim_cell("-"),
        count_cell(Some(total_fillable), Color::Green).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    table
}

pub fn print_identify_summary(result: &IdentifyResult) {
    let report = &result.report;
    println!("File: {}", result.file.display());
    println!("Strategy: {}", strategy_name(report.strategy));
    if let Some(primary) = &report.primary_sheet {
        println!(
            "Best sheet: {primary} (score {:.2})",
            report.summary.best_sheet_score
        );
    }
    if let Some(path) = &result.report_path {
        println!("Report: {}", path.display());
    }
    if let Some(error) = &report.error {
        eprintln!("error: {}", error.message);
        eprintln!("  available sheets: {}", error.available_sheets.join(", "));
        eprintln!("  learned sheets: {}", error.learned_sheets.join(", "));
        return;
    }
    println!("{}", sheet_table(report));
    if report.summary.total_fillable_columns > 0 {
        println!();
        println!("Columns to fill:");
        println!("{}", column_table(report));
    }
    let errors: Vec<_> = report
        .sheets
        .iter()
        .filter_map(|(name, outcome)| match outcome {
            SheetOutcome::Error { error } => Some((name, error)),
            SheetOutcome::Analyzed(_) => None,
        })
        .collect();
    if !errors.is_empty() {
        eprintln!("Sheet errors:");
        for (name, error) in errors {
            eprintln!("- {name}: {error}");
        }
    }
}

fn sheet_table(report: &IdentifyReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell("Headers"),
        header_cell("Fill"),
        header_cell("Unknown"),
        header_cell("Score"),
        header_cell("Headers from"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);

    for (name, outcome) in &report.sheets {
        let primary = report.primary_sheet.as_deref() == Some(name.as_str());
        let name_cell = if primary {
            Cell::new(name).fg(Color::Blue).add_attribute(Attribute::Bold)
        } else {
            Cell::new(name)
        };
        match outcome {
            SheetOutcome::Analyzed(sheet) => {
                let source = if sheet.header_enhancement.enhanced {
                    Cell::new("validator").fg(Color::Blue)
                } else {
                    dim_cell("basic")
                };
                table.add_row(vec![
                    name_cell,
                    Cell::new(sheet.total_headers),
                    count_cell(Some(sheet.columns.len()), Color::Green),
                    count_cell(Some(sheet.unknowns.len()), Color::Yellow),
                    Cell::new(format!("{:.2}", sheet.score())),
                    source,
                ]);
            }
            SheetOutcome::Error { error } => {
                table.add_row(vec![
                    name_cell,
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    Cell::new(error).fg(Color::Red),
                ]);
            }
        }
    }
    table.add_row(vec![
        header_cell("TOTAL"),
        dim_cell("-"),
        count_cell(Some(report.summary.total_fillable_columns), Color::Green)
            .add_attribute(Attribute::Bold),
        count_cell(Some(report.summary.total_unknown_columns), Color::Yellow)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        count_cell(Some(report.summary.sheet_errors), Color::Red).add_attribute(Attribute::Bold),
    ]);
    table
}

fn column_table(report: &IdentifyReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell("Pos"),
        header_cell("Header"),
        header_cell("Label"),
        header_cell("Confidence"),
        header_cell("Verified by"),
        header_cell("Factors"),
    ]);
    apply_column_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);

    for (name, outcome) in &report.sheets {
        let Some(sheet) = outcome.report() else {
            continue;
        };
        for column in &sheet.columns {
            let label = if column.learned_fillable {
                Cell::new(&column.label).fg(Color::Green)
            } else {
                Cell::new(&column.label)
            };
            let factors = if column.decision_factors.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(column.decision_factors.join(", "))
            };
            table.add_row(vec![
                Cell::new(name),
                Cell::new(column.position),
                Cell::new(&column.header),
                label,
                Cell::new(format!("{:.2}", column.confidence)),
                Cell::new(&column.verified_by),
                factors,
            ]);
        }
    }
    table
}

pub fn print_update_summary(result: &UpdateResult) {
    println!("Store: {}", result.store_path.display());
    println!(
        "Applied {} label(s) across {} sheet(s)",
        result.labels_applied, result.sheets
    );
}

fn strategy_name(strategy: IdentifyStrategy) -> &'static str {
    match strategy {
        IdentifyStrategy::CrossSheet => "cross-sheet",
        IdentifyStrategy::SheetFirst => "sheet-first",
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn apply_column_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 7 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
            ColumnConstraint::UpperBoundary(Width::Percentage(25)),
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::LowerBoundary(Width::Fixed(12)),
            ColumnConstraint::UpperBoundary(Width::Fixed(28)),
            ColumnConstraint::UpperBoundary(Width::Percentage(35)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use fa_ingest::TrainingPair;
    use fa_learn::SheetLearning;
    use fa_model::{ColumnDecision, Decision, HeaderEnhancement, SheetReport};

    fn pair(key: &str) -> TrainingPair {
        TrainingPair {
            key: key.to_string(),
            empty: PathBuf::from(format!("{key} empty.json")),
            filled: PathBuf::from(format!("{key} filled.json")),
            method: PairingMethod::Normalized,
        }
    }

    #[test]
    fn train_table_counts_learned_and_failed_pairs() {
        let pairs = vec![
            PairReport {
                pair: pair("ocean"),
                status: PairStatus::Learned(vec![SheetLearning {
                    sheet: "Rates".to_string(),
                    analyzed_columns: 3,
                    fillable_columns: 2,
                    detection_method: HeaderDetectionMethod::Basic,
                }]),
            },
            PairReport {
                pair: pair("air"),
                status: PairStatus::Failed("broken".to_string()),
            },
        ];
        let rendered = train_table(&pairs).to_string();
        assert!(rendered.contains("ocean"));
        assert!(rendered.contains("FAILED"));
        assert!(rendered.contains("TOTAL"));
        // two pairs and the totals row
        assert_eq!(train_table(&pairs).row_iter().count(), 3);
    }

    #[test]
    fn sheet_table_lists_errors_beside_reports() {
        let rate = ColumnDecision {
            position: 2,
            header: "rate".to_string(),
            label: "rate".to_string(),
            confidence: 0.95,
            verified_by: "mock-exact+cross-sheet".to_string(),
            decision: Decision::Fill,
            learned_fillable: true,
            decision_factors: vec!["learned_fillable".to_string()],
            enhanced_header: false,
            source_patterns: vec!["Rates".to_string()],
        };
        let mut sheets = BTreeMap::new();
        sheets.insert(
            "Quotes".to_string(),
            SheetOutcome::Analyzed(SheetReport {
                columns: vec![rate],
                unknowns: Vec::new(),
                total_headers: 3,
                analyzed_columns: 2,
                header_enhancement: HeaderEnhancement::default(),
                cross_sheet_patterns_used: Some(1),
            }),
        );
        sheets.insert("Air".to_string(), SheetOutcome::error("sheet not found"));
        let report = IdentifyReport::from_outcomes(IdentifyStrategy::CrossSheet, sheets, 1);

        let rendered = sheet_table(&report).to_string();
        assert!(rendered.contains("sheet not found"));
        assert!(rendered.contains("Quotes"));
        let columns = column_table(&report).to_string();
        assert!(columns.contains("learned_fillable"));
        assert!(columns.contains("0.95"));
    }
}
