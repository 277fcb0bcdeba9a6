//! Shape summary of a column's filled values.

use std::sync::LazyLock;

use regex::Regex;

use fa_model::{LengthStats, ValuePattern, ValueType};

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.,\-+]+$").expect("valid regex"));
static ALPHABETIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("valid regex"));

const MAJORITY_SHARE: f64 = 0.7;
const MIXED_SHARE: f64 = 0.5;
const AFFIX_CHARS: usize = 2;
const AFFIX_MIN_VALUES: usize = 3;
const AFFIX_MIN_COUNT: usize = 2;
const AFFIX_LIMIT: usize = 3;

/// Summarize filled values. Returns `None` when there are none.
pub fn learn_value_patterns<S: AsRef<str>>(values: &[S]) -> Option<ValuePattern> {
    if values.is_empty() {
        return None;
    }
    let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
    let total = values.len() as f64;

    let numeric = values.iter().filter(|v| NUMERIC.is_match(v.trim())).count();
    let alphabetic = values.iter().filter(|v| ALPHABETIC.is_match(v.trim())).count();
    let mixed = values.len() - numeric - alphabetic;

    let mut value_types = Vec::new();
    if numeric as f64 / total > MAJORITY_SHARE {
        value_types.push(ValueType::Numeric);
    }
    if alphabetic as f64 / total > MAJORITY_SHARE {
        value_types.push(ValueType::Alphabetic);
    }
    if mixed as f64 / total > MIXED_SHARE {
        value_types.push(ValueType::Mixed);
    }

    let (common_prefixes, common_suffixes) = if values.len() >= AFFIX_MIN_VALUES {
        (
            common_affixes(values.iter().filter_map(|v| prefix(v))),
            common_affixes(values.iter().filter_map(|v| suffix(v))),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    Some(ValuePattern {
        value_types,
        common_prefixes,
        common_suffixes,
        length_stats: Some(length_stats(&values)),
    })
}

fn prefix(value: &str) -> Option<String> {
    (value.chars().count() >= AFFIX_CHARS).then(|| value.chars().take(AFFIX_CHARS).collect())
}

fn suffix(value: &str) -> Option<String> {
    let count = value.chars().count();
    (count >= AFFIX_CHARS).then(|| value.chars().skip(count - AFFIX_CHARS).collect())
}

/// Most frequent affixes seen at least twice, ties in first-seen order.
fn common_affixes(affixes: impl Iterator<Item = String>) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for affix in affixes {
        match counts.iter_mut().find(|(seen, _)| *seen == affix) {
            Some((_, count)) => *count += 1,
            None => counts.push((affix, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(AFFIX_LIMIT)
        .filter(|(_, count)| *count >= AFFIX_MIN_COUNT)
        .map(|(affix, _)| affix)
        .collect()
}

fn length_stats(values: &[&str]) -> LengthStats {
    let mut lengths: Vec<usize> = values.iter().map(|v| v.chars().count()).collect();
    lengths.sort_unstable();
    let n = lengths.len();
    let avg = lengths.iter().sum::<usize>() as f64 / n as f64;
    let median = if n % 2 == 1 {
        lengths[n / 2] as f64
    } else {
        (lengths[n / 2 - 1] + lengths[n / 2]) as f64 / 2.0
    };
    LengthStats {
        min: lengths[0],
        max: lengths[n - 1],
        avg,
        median,
    }
}
