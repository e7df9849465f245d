//! String similarity scores on a 0–100 scale.

/// Longest common subsequence length, two-row DP over chars.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Keep the shorter string in the inner loop to minimise allocation.
    let (a, b) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let n = b.len();

    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];

    for &ca in a {
        for j in 1..=n {
            curr[j] = if ca == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Normalised InDel similarity: `100 · 2·lcs / (|a| + |b|)`.
fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    100.0 * (2 * lcs_len(a, b)) as f64 / total as f64
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] of the shorter string against every same-length window of
/// the longer one, plus the clipped windows hanging off either end.
///
/// Returns 0 when either side is empty.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    let (m, n) = (short.len(), long.len());

    if m == 0 {
        return 0.0;
    }
    if m == n {
        return ratio_chars(short, long);
    }

    let full = (0..=n - m).map(|start| &long[start..start + m]);
    let head = (1..m).map(|k| &long[..k]);
    let tail = (1..m).map(|k| &long[n - k..]);

    let mut best = 0.0f64;
    for window in full.chain(head).chain(tail) {
        best = best.max(ratio_chars(short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_full() {
        assert_eq!(ratio("MILK", "MILK"), 100.0);
        assert_eq!(partial_ratio("MILK", "MILK"), 100.0);
    }

    #[test]
    fn ratio_counts_shared_subsequence() {
        // lcs("MLK", "MILK") = 3 → 2·3 / 7
        let r = ratio("MLK", "MILK");
        assert!((r - 600.0 / 7.0).abs() < 1e-9, "ratio was {r}");
    }

    #[test]
    fn substring_scores_full_partial_ratio() {
        assert_eq!(partial_ratio("BANANA", "ORGANIC BANANAS"), 100.0);
        assert_eq!(partial_ratio("ORGANIC BANANAS", "BANANA"), 100.0);
    }

    #[test]
    fn partial_ratio_tolerates_ocr_noise() {
        let score = partial_ratio("8ANANAS", "BANANAS");
        assert!(score >= 85.0, "score was {score}");
    }

    #[test]
    fn clipped_window_at_end_counts() {
        // "KALE" only partially overlaps the end of "CURLY KAL".
        let score = partial_ratio("KALE", "CURLY KAL");
        assert!(score >= 85.0, "score was {score}");
    }

    #[test]
    fn unrelated_strings_score_low() {
        let score = partial_ratio("DETERGENT", "STRAWBERRIES");
        assert!(score < 75.0, "score was {score}");
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(partial_ratio("", "MILK"), 0.0);
        assert_eq!(partial_ratio("MILK", ""), 0.0);
    }

    #[test]
    fn symmetric() {
        assert_eq!(ratio("APPLE", "APPLY"), ratio("APPLY", "APPLE"));
        assert_eq!(partial_ratio("EGG", "EGGS LARGE"), partial_ratio("EGGS LARGE", "EGG"));
    }
}
