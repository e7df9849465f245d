use serde::{Deserialize, Serialize};
use tillroll_core::Money;

use crate::price::parse_amount;
use crate::types::LineItem;

// ── Patterns ──────────────────────────────────────────────────────────────────

re!(re_numeric, r"-?\d+(?:[.,]\d{1,2})?");
re!(re_numeric_with_unit,
    r"-?\d+(?:[.,]\d{1,2})?(?:\s*(?:/1b|/lb|\blb\b|\bTb\b))?");
re!(re_total_broad, r"(?i)\b(?:total|balance|amount\s+due)\b");
re!(re_total_balance, r"(?i)\bbalance\b");

/// Whole-line phrases that never describe a purchase.
const NON_ITEM_LINES: &[&str] = &["SAVINGS", "YOU SAVED:"];

/// Footer and payment vocabulary; any line containing one is noise.
const SKIP_PHRASES: &[&str] = &["SAVINGS", "YOU SAVED", "DISCOVER", "SUBTOTAL", "TAX"];

const MIN_NAME_CHARS: usize = 3;

/// Which words mark a line as the receipt total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalVocabulary {
    /// Only lines mentioning `BALANCE`.
    BalanceOnly,
    /// Whole-word `total`, `balance` or `amount due`.
    #[default]
    Broad,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineClass {
    Noise,
    Total(Money),
    Item(LineItem),
}

#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    total_vocabulary: TotalVocabulary,
}

impl LineClassifier {
    pub fn new(total_vocabulary: TotalVocabulary) -> Self {
        Self { total_vocabulary }
    }

    /// Parse `line` as a purchased item; totals and noise yield `None`.
    pub fn parse_item(&self, line: &str) -> Option<LineItem> {
        match self.classify(line) {
            LineClass::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn classify(&self, line: &str) -> LineClass {
        let line = line.trim();
        if line.is_empty() || is_skip_line(line) {
            return LineClass::Noise;
        }

        let tokens = numeric_tokens(line);
        let Some(last) = tokens.last() else {
            return LineClass::Noise;
        };
        let price = parse_amount(last);

        if self.is_total_line(line) {
            return match price {
                Some(total) => LineClass::Total(total),
                None => LineClass::Noise,
            };
        }

        if price.is_some_and(Money::is_negative) {
            return LineClass::Noise;
        }

        let name = clean_name(line);
        if name.chars().count() < MIN_NAME_CHARS {
            return LineClass::Noise;
        }

        LineClass::Item(LineItem { name, price })
    }

    fn is_total_line(&self, line: &str) -> bool {
        match self.total_vocabulary {
            TotalVocabulary::BalanceOnly => re_total_balance().is_match(line),
            TotalVocabulary::Broad => re_total_broad().is_match(line),
        }
    }
}

fn is_skip_line(line: &str) -> bool {
    let upper = line.to_uppercase();
    NON_ITEM_LINES.iter().any(|p| upper == *p) || SKIP_PHRASES.iter().any(|p| upper.contains(p))
}

/// Numbers on `line` in order.
///
/// A leading `-` is a sign only at the start of the line or after
/// whitespace. Integers glued to a following letter (`1b`, `12oz`) are unit
/// text, not numbers.
fn numeric_tokens(line: &str) -> Vec<&str> {
    re_numeric()
        .find_iter(line)
        .filter_map(|m| {
            let mut start = m.start();
            if m.as_str().starts_with('-') {
                let prev = line[..start].chars().next_back();
                if prev.is_some_and(|c| !c.is_whitespace()) {
                    start += 1;
                }
            }
            let text = &line[start..m.end()];

            let glued = line[m.end()..].chars().next().is_some_and(|c| c.is_ascii_alphabetic());
            if glued && !text.contains(['.', ',']) {
                return None;
            }
            Some(text)
        })
        .collect()
}

/// Strip numbers with their unit markers and stray symbols, then drop any
/// word left without a letter or digit.
fn clean_name(line: &str) -> String {
    let stripped = re_numeric_with_unit().replace_all(line, " ");
    stripped
        .replace(['*', '@', '$', '\t'], " ")
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .collect::<Vec<_>>()
        .join(" ")
}
