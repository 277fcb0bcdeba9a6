//! Header string similarity.

use rapidfuzz::distance::indel;

/// Normalized Indel similarity of two headers, ignoring case.
///
/// `2 * LCS / (len(a) + len(b))`, in `0.0..=1.0`.
pub fn header_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    indel::normalized_similarity(a.chars(), b.chars())
}
