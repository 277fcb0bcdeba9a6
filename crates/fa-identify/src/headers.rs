//! Per-sheet header resolution shared by both identification passes.

use fa_header::{HeaderDetector, IDENTIFY_ACCEPT_CONFIDENCE, apply_enhanced_headers};
use fa_ingest::{detect_header_row, value_columns};
use fa_model::{HeaderEnhancement, Sheet};

/// Validator confidence above which validated headers earn a bonus.
const BOOST_CONFIDENCE: f64 = 0.8;

/// Headers chosen for one sheet and how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetHeaders {
    pub headers: Vec<String>,
    pub enhancement: HeaderEnhancement,
}

impl SheetHeaders {
    /// Basic headers, replaced by validated ones when `detector` is given
    /// and its validator confirms them.
    pub fn resolve(
        detector: Option<&mut HeaderDetector>,
        file_name: &str,
        sheet_name: &str,
        sheet: &Sheet,
    ) -> Self {
        let basic = detect_header_row(sheet).headers;
        let detection = detector.map(|detector| detector.detect(file_name, sheet_name, sheet));
        let (headers, enhancement) = apply_enhanced_headers(
            &basic,
            &sheet.column_keys(),
            detection.as_ref(),
            IDENTIFY_ACCEPT_CONFIDENCE,
        );
        Self {
            headers,
            enhancement,
        }
    }

    /// True when validated headers are in use with high confidence.
    pub fn validator_boost(&self) -> bool {
        self.enhancement.enhanced && self.enhancement.confidence > BOOST_CONFIDENCE
    }

    /// Value columns (position ≥ 1) with a non-empty header.
    pub fn value_headers(&self) -> impl Iterator<Item = (usize, &str)> {
        value_columns(&self.headers).filter_map(|position| {
            self.headers
                .get(position)
                .map(String::as_str)
                .filter(|header| !header.is_empty())
                .map(|header| (position, header))
        })
    }

    pub fn analyzed_columns(&self) -> usize {
        value_columns(&self.headers).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_resolution_skips_blank_headers() {
        let sheet = Sheet::new(
            vec![
                "Lane".to_string(),
                String::new(),
                "Rate".to_string(),
                "Notes".to_string(),
            ],
            Vec::new(),
        );
        let resolved = SheetHeaders::resolve(None, "a.json", "Rates", &sheet);
        assert_eq!(resolved.analyzed_columns(), 3);
        assert_eq!(
            resolved.value_headers().collect::<Vec<_>>(),
            vec![(2, "rate"), (3, "notes")]
        );
        assert_eq!(resolved.enhancement.outcome, "not_requested");
        assert!(!resolved.validator_boost());
    }
}
