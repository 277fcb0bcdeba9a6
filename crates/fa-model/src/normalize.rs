//! Text normalization shared by ingestion, learning and identification.

/// Canonical form of a header as stored in the pattern store.
///
/// Trims, lowercases and collapses whitespace runs into single spaces.
/// Punctuation and underscores are kept so `col_3` and `rate (usd)` survive.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Comparison key for vocabulary lookups.
///
/// Lowercases, treats `_` and `-` as word separators, drops other
/// punctuation and collapses whitespace.
pub fn normalize_label(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| match c {
            '_' | '-' => ' ',
            c if c.is_alphanumeric() || c.is_whitespace() => c,
            _ => ' ',
        })
        .collect();
    normalize_header(&spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_collapses_whitespace() {
        assert_eq!(normalize_header("  Rate \t (USD) "), "rate (usd)");
        assert_eq!(normalize_header("col_3"), "col_3");
        assert_eq!(normalize_header("   "), "");
    }

    #[test]
    fn label_strips_punctuation() {
        assert_eq!(normalize_label("Rate (USD)"), "rate usd");
        assert_eq!(normalize_label("lane_id"), "lane id");
        assert_eq!(normalize_label("Origin-Port"), "origin port");
    }
}
