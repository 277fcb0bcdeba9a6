//! Header cell cleaning.
//!
//! Bid templates wrap header text in markup (`<<axis(lane_id)>>`,
//! `bid|rate|usd`, `{{var.origin}}`). Cleaning strips that markup and
//! reduces the remainder to a lowercase underscore identifier.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use fa_model::Sheet;

/// Substrings that mark a cell as template markup.
pub const TEMPLATE_PATTERNS: [&str; 7] = [
    r"<<.*?>>",
    r"\{\{.*?\}\}",
    r"\$\{.*?\}",
    r"axis\(",
    r"bid\|",
    r"template\.",
    r"var\.",
];

static TEMPLATE_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TEMPLATE_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid regex"))
        .collect()
});
static SYSTEM_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(axis|bid|itemType|predefinedAlternativeBid)[:|]").expect("valid regex")
});
static PIPE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\|.*$").expect("valid regex"));
static BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(){}\[\]]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").expect("valid regex"));

/// True when `value` contains any template marker.
pub fn has_template_marker(value: &str) -> bool {
    TEMPLATE_MARKERS.iter().any(|re| re.is_match(value))
}

/// Clean a raw header cell. Returns an empty string when nothing is left.
///
/// The pipeline repeats until its output stops changing, so cleaning an
/// already clean header is a no-op.
pub fn clean_header_name(raw: &str) -> String {
    let mut current = clean_once(raw);
    let max_passes = raw.chars().count() * 2 + 2;
    for _ in 0..max_passes {
        let next = clean_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn clean_once(raw: &str) -> String {
    let mut cleaned = raw.to_string();
    for marker in TEMPLATE_MARKERS.iter() {
        cleaned = marker.replace_all(&cleaned, "").into_owned();
    }
    let cleaned = SYSTEM_PREFIX.replace(&cleaned, "");
    let cleaned = PIPE_TAIL.replace(&cleaned, "");
    let cleaned = BRACKETS.replace_all(&cleaned, "");
    let cleaned = WHITESPACE.replace_all(cleaned.trim(), "_");
    let cleaned = UNDERSCORES.replace_all(&cleaned, "_");
    cleaned.trim_matches('_').to_lowercase()
}

/// Trimmed cell text, or `None` for blanks and `nan` placeholders.
pub(crate) fn present_value(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed)
    }
}

/// Column identifier to cleaned header for one row.
///
/// Cells that clean to nothing are omitted; a row past the end of the
/// sheet yields an empty mapping.
pub fn extract_clean_headers(sheet: &Sheet, row_index: usize) -> BTreeMap<String, String> {
    if row_index >= sheet.row_count() {
        return BTreeMap::new();
    }
    sheet
        .column_keys()
        .into_iter()
        .filter_map(|key| {
            let value = present_value(sheet.cell(row_index, &key))?;
            let cleaned = clean_header_name(value);
            (!cleaned.is_empty()).then_some((key, cleaned))
        })
        .collect()
}
