//! Fuzzy correction of OCR text against the known-item vocabulary.
//!
//! Runs before any parsing. Each line is split into product text and a
//! trailing price; the product text is swapped for the closest vocabulary
//! entry when it scores at or above the threshold, and the price is written
//! back normalised to two decimals. Lines that match nothing pass through
//! with only the price normalised.

use serde::{Deserialize, Serialize};
use tillroll_core::Vocabulary;

use crate::price::split_trailing_price;
use crate::similarity::partial_ratio;
use crate::types::RawText;

pub const DEFAULT_THRESHOLD: f64 = 75.0;

/// A pre-pass that rewrites raw OCR text before it is parsed.
pub trait TextCorrector: Send + Sync {
    fn correct(&self, raw_text: &str) -> String;
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrection;

impl TextCorrector for NoCorrection {
    fn correct(&self, raw_text: &str) -> String {
        raw_text.to_string()
    }
}

/// Match the product text as a whole or one token at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    WholeRow,
    Token,
}

struct Candidate {
    /// Uppercased for case-insensitive scoring.
    key: String,
    name: String,
}

pub struct VocabularyCorrector {
    candidates: Vec<Candidate>,
    threshold: f64,
    mode: MatchMode,
}

impl VocabularyCorrector {
    pub fn new(vocabulary: &Vocabulary, threshold: f64, mode: MatchMode) -> Self {
        let candidates = vocabulary
            .items()
            .map(|name| Candidate { key: name.to_uppercase(), name: name.to_string() })
            .collect();
        Self { candidates, threshold, mode }
    }

    /// Closest vocabulary entry scoring at least the threshold. Ties go to the
    /// entry that sorts first.
    fn best_match(&self, text: &str) -> Option<&str> {
        let key = text.to_uppercase();
        let mut best: Option<(&Candidate, f64)> = None;
        for candidate in &self.candidates {
            let score = partial_ratio(&key, &candidate.key);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }
        best.filter(|(_, score)| *score >= self.threshold)
            .map(|(c, _)| c.name.as_str())
    }

    fn correct_line(&self, line: &str) -> String {
        let (product, price) = split_trailing_price(line);

        let corrected = match self.mode {
            MatchMode::WholeRow => match self.best_match(product) {
                Some(name) => {
                    tracing::debug!(from = product, to = name, "Corrected line");
                    name.to_string()
                }
                None => product.to_string(),
            },
            MatchMode::Token => product
                .split_whitespace()
                .map(|token| self.best_match(token).unwrap_or(token))
                .collect::<Vec<_>>()
                .join(" "),
        };

        match price {
            Some(price) if corrected.is_empty() => price.to_string(),
            Some(price) => format!("{corrected} {price}"),
            None => corrected,
        }
    }
}

impl TextCorrector for VocabularyCorrector {
    fn correct(&self, raw_text: &str) -> String {
        if self.candidates.is_empty() {
            return raw_text.to_string();
        }
        RawText::from_ocr(raw_text)
            .lines()
            .iter()
            .map(|line| self.correct_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The corrector to use for `vocabulary`: none at all when it is empty.
pub fn corrector_for(vocabulary: &Vocabulary, threshold: f64, mode: MatchMode) -> Box<dyn TextCorrector> {
    if vocabulary.is_empty() {
        Box::new(NoCorrection)
    } else {
        Box::new(VocabularyCorrector::new(vocabulary, threshold, mode))
    }
}

/// Whole-row correction of `raw_text` against `vocabulary`.
pub fn correct(raw_text: &str, vocabulary: &Vocabulary, threshold: f64) -> String {
    corrector_for(vocabulary, threshold, MatchMode::WholeRow).correct(raw_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(items: &[&str]) -> Vocabulary {
        Vocabulary::new(0, items.iter().map(|s| s.to_string()))
    }

    #[test]
    fn whole_row_replaces_close_match() {
        let v = vocab(&["BANANAS", "MILK"]);
        assert_eq!(correct("8ANANAS 1.08", &v, DEFAULT_THRESHOLD), "BANANAS 1.08");
    }

    #[test]
    fn unmatched_line_keeps_text_and_normalises_price() {
        let v = vocab(&["BANANAS"]);
        assert_eq!(correct("DETERGENT 1234", &v, DEFAULT_THRESHOLD), "DETERGENT 12.34");
    }

    #[test]
    fn line_without_price() {
        let v = vocab(&["WALMART"]);
        assert_eq!(correct("WALMART", &v, DEFAULT_THRESHOLD), "WALMART");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let v = vocab(&["Greek Yogurt"]);
        assert_eq!(correct("GREEK YOGURT 4.50", &v, DEFAULT_THRESHOLD), "Greek Yogurt 4.50");
    }

    #[test]
    fn token_mode_corrects_each_word() {
        let v = vocab(&["ORGANIC", "BANANAS"]);
        let corrector = VocabularyCorrector::new(&v, 85.0, MatchMode::Token);
        assert_eq!(corrector.correct("0RGANIC 8ANANAS 1.08"), "ORGANIC BANANAS 1.08");
    }

    #[test]
    fn empty_vocabulary_is_a_no_op() {
        let text = "WALMART\n\nMILK 3.5\n";
        assert_eq!(correct(text, &Vocabulary::default(), DEFAULT_THRESHOLD), text);
    }

    #[test]
    fn drops_blank_lines() {
        let v = vocab(&["MILK"]);
        assert_eq!(correct("MILK 3.50\n\n  \nBREAD 2.25", &v, 90.0), "MILK 3.50\nBREAD 2.25");
    }

    #[test]
    fn price_only_line() {
        let v = vocab(&["MILK"]);
        assert_eq!(correct("6.15", &v, DEFAULT_THRESHOLD), "6.15");
    }

    #[test]
    fn threshold_is_inclusive() {
        let v = vocab(&["BANANAS"]);
        // 2·6 / 14 ≈ 85.7
        assert_eq!(correct("8ANANAS", &v, 85.0), "BANANAS");
        assert_eq!(correct("8ANANAS", &v, 86.0), "8ANANAS");
    }
}
