//! Pure merge of pattern stores.
//!
//! Header variants and fillable sets are unioned, so merging is idempotent
//! and commutative for them. Positions, verdicts and value patterns are
//! last-write-wins: `incoming` replaces `base` per key, which makes the
//! result depend on merge order for those maps.

use tracing::warn;

use fa_model::{HeaderDetectionMethod, PatternStore, SheetPatterns};

/// Merge `incoming` into a copy of `base`.
pub fn merge(base: &PatternStore, incoming: &PatternStore) -> PatternStore {
    let mut merged = base.clone();
    merge_into(&mut merged, incoming);
    merged
}

/// Merge `incoming` into `base` in place.
pub fn merge_into(base: &mut PatternStore, incoming: &PatternStore) {
    for (sheet_name, patterns) in &incoming.sheets {
        let target = base.sheet_mut(sheet_name);
        merge_sheet(sheet_name, target, patterns);
    }
}

fn merge_sheet(sheet_name: &str, target: &mut SheetPatterns, incoming: &SheetPatterns) {
    for (header, variants) in &incoming.header_map {
        target
            .header_map
            .entry(header.clone())
            .or_default()
            .extend(variants.iter().cloned());
    }
    target
        .columns_to_fill
        .extend(incoming.columns_to_fill.iter().cloned());

    for (header, position) in &incoming.column_positions {
        target.column_positions.insert(header.clone(), *position);
    }

    for (header, verdict) in &incoming.verifications {
        if let Some(previous) = target.verifications.get(header)
            && previous.conflicts_with(verdict)
        {
            warn!(
                sheet = %sheet_name,
                header = %header,
                previous_label = %previous.label,
                previous_confidence = previous.confidence,
                label = %verdict.label,
                confidence = verdict.confidence,
                "overwriting conflicting verdict"
            );
        }
        target.verifications.insert(header.clone(), verdict.clone());
    }

    for (header, pattern) in &incoming.enhanced_patterns {
        target
            .enhanced_patterns
            .insert(header.clone(), pattern.clone());
    }

    target.header_detection_method =
        merged_method(target.header_detection_method, incoming.header_detection_method);
}

/// Enhanced detection sticks once any pair used it.
fn merged_method(
    base: HeaderDetectionMethod,
    incoming: HeaderDetectionMethod,
) -> HeaderDetectionMethod {
    base.max(incoming)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fa_model::Verdict;

    fn store(sheet: &str, fill: &[&str], verdict: Option<(&str, Verdict)>) -> PatternStore {
        let mut store = PatternStore::new();
        let patterns = store.sheet_mut(sheet);
        for header in fill {
            patterns.columns_to_fill.insert((*header).to_string());
            patterns.add_variant(*header, *header);
        }
        if let Some((header, verdict)) = verdict {
            patterns.verifications.insert(header.to_string(), verdict);
        }
        store
    }

    #[test]
    fn unions_fillable_sets() {
        let a = store("Rates", &["rate"], None);
        let b = store("Rates", &["currency"], None);
        let merged = merge(&a, &b);
        let rates = merged.sheet("Rates").unwrap();
        assert!(rates.is_fillable("rate"));
        assert!(rates.is_fillable("currency"));
        assert_eq!(rates.header_map.len(), 2);
    }

    #[test]
    fn incoming_verdict_wins() {
        let a = store("Rates", &[], Some(("rate", Verdict::new("rate", 0.9, "mock-variant"))));
        let b = store("Rates", &[], Some(("rate", Verdict::user("cost"))));
        let merged = merge(&a, &b);
        assert_eq!(merged.sheet("Rates").unwrap().verdict("rate").unwrap().label, "cost");

        let reversed = merge(&b, &a);
        assert_eq!(reversed.sheet("Rates").unwrap().verdict("rate").unwrap().label, "rate");
    }

    #[test]
    fn enhanced_method_is_sticky() {
        let mut a = PatternStore::new();
        a.sheet_mut("Rates").header_detection_method = HeaderDetectionMethod::Enhanced;
        let b = store("Rates", &["rate"], None);
        assert_eq!(
            merge(&a, &b).sheet("Rates").unwrap().header_detection_method,
            HeaderDetectionMethod::Enhanced
        );
        assert_eq!(
            merge(&b, &a).sheet("Rates").unwrap().header_detection_method,
            HeaderDetectionMethod::Enhanced
        );
    }

    #[test]
    fn base_is_untouched() {
        let a = store("Rates", &["rate"], None);
        let b = store("Air", &["fee"], None);
        let merged = merge(&a, &b);
        assert_eq!(a.sheets.len(), 1);
        assert_eq!(merged.sheets.len(), 2);
    }
}
