use serde::{Deserialize, Serialize};

re!(re_receipt_date, r"\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{2}-\d{2}-\d{4}");
re!(re_phone, r"\(?\d{3}\)?[\s\-]\d{3}[\s\-]\d{4}");
re!(re_url, r"(?i)(https?://|www\.)\S+");

/// Store name and date as found on the receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub store: Option<String>,
    pub date: Option<String>,
}

/// Picks the store name out of the receipt lines.
pub trait StoreNameStrategy: Send + Sync {
    fn store_name(&self, lines: &[String]) -> Option<String>;
}

/// The first non-empty line, verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstLine;

impl StoreNameStrategy for FirstLine {
    fn store_name(&self, lines: &[String]) -> Option<String> {
        lines
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
            .map(str::to_string)
    }
}

/// Scores the header lines and prefers short all-caps text, skipping
/// phone numbers, URLs, dates and lines that open with a digit.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderHeuristic;

impl StoreNameStrategy for HeaderHeuristic {
    fn store_name(&self, lines: &[String]) -> Option<String> {
        lines
            .iter()
            .take(10)
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .filter(|l| !re_phone().is_match(l))
            .filter(|l| !re_url().is_match(l))
            .filter(|l| !re_receipt_date().is_match(l))
            .filter(|l| l.len() >= 3 && l.len() <= 50)
            .filter(|l| !l.starts_with(|c: char| c.is_ascii_digit()))
            // Earliest line wins a tie.
            .enumerate()
            .max_by_key(|(idx, l)| {
                let all_caps = l.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase());
                let score = (if all_caps { 2i32 } else { 0 }) + (l.len() as i32).min(20);
                (score, std::cmp::Reverse(*idx))
            })
            .map(|(_, l)| l.to_string())
    }
}

/// Config-level choice of store strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStrategy {
    #[default]
    FirstLine,
    HeaderHeuristic,
}

impl StoreStrategy {
    pub fn build(self) -> Box<dyn StoreNameStrategy> {
        match self {
            StoreStrategy::FirstLine => Box::new(FirstLine),
            StoreStrategy::HeaderHeuristic => Box::new(HeaderHeuristic),
        }
    }
}

pub struct MetadataExtractor {
    store: Box<dyn StoreNameStrategy>,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(Box::new(FirstLine))
    }
}

impl MetadataExtractor {
    pub fn new(store: Box<dyn StoreNameStrategy>) -> Self {
        Self { store }
    }

    pub fn extract(&self, lines: &[String]) -> Metadata {
        Metadata {
            store: self.store.store_name(lines),
            date: find_date(lines),
        }
    }
}

/// Store (first line) and date with the default strategy.
pub fn extract_metadata(lines: &[String]) -> Metadata {
    MetadataExtractor::default().extract(lines)
}

/// First `YYYY-MM-DD`, `DD/MM/YYYY` or `DD-MM-YYYY` substring, scanning
/// lines top to bottom.
pub fn find_date(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .find_map(|l| re_receipt_date().find(l))
        .map(|m| m.as_str().to_string())
}
