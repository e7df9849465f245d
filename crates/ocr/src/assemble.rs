use serde::{Deserialize, Serialize};

use crate::classify::{LineClass, LineClassifier, TotalVocabulary};
use crate::merge::MergedLines;
use crate::metadata::{MetadataExtractor, StoreNameStrategy, StoreStrategy};
use crate::types::{RawText, ReceiptRecord};

/// Which total line wins when a receipt has several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalPolicy {
    #[default]
    LastMatch,
    FirstMatch,
}

/// Tunables for receipt interpretation, read from the `[parser]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub total_vocabulary: TotalVocabulary,
    pub total_policy: TotalPolicy,
    pub store_strategy: StoreStrategy,
}

/// Turns receipt lines into a [`ReceiptRecord`]: metadata from the whole
/// text, then items and total from the merged lines.
pub struct ReceiptAssembler {
    metadata: MetadataExtractor,
    classifier: LineClassifier,
    total_policy: TotalPolicy,
}

impl Default for ReceiptAssembler {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl ReceiptAssembler {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            metadata: MetadataExtractor::new(config.store_strategy.build()),
            classifier: LineClassifier::new(config.total_vocabulary),
            total_policy: config.total_policy,
        }
    }

    /// Replace the configured store strategy with a custom one.
    pub fn with_store_strategy(mut self, strategy: Box<dyn StoreNameStrategy>) -> Self {
        self.metadata = MetadataExtractor::new(strategy);
        self
    }

    pub fn assemble_text(&self, text: &str) -> ReceiptRecord {
        self.assemble(RawText::from_ocr(text).lines())
    }

    pub fn assemble(&self, lines: &[String]) -> ReceiptRecord {
        let metadata = self.metadata.extract(lines);
        let mut record = ReceiptRecord {
            store: metadata.store,
            date: metadata.date,
            ..Default::default()
        };

        for line in MergedLines::new(lines) {
            match self.classifier.classify(&line) {
                LineClass::Item(item) => record.items.push(item),
                LineClass::Total(total) => {
                    let keep_first =
                        self.total_policy == TotalPolicy::FirstMatch && record.total.is_some();
                    if !keep_first {
                        record.total = Some(total);
                    }
                }
                LineClass::Noise => {
                    tracing::trace!(line = %line, "Skipped non-item line");
                }
            }
        }

        tracing::debug!(
            store = record.store.as_deref().unwrap_or("-"),
            items = record.items.len(),
            total = %record.total.map(|t| t.to_string()).unwrap_or_default(),
            "Receipt assembled"
        );
        record
    }
}

/// Assemble with the default configuration.
pub fn assemble(lines: &[String]) -> ReceiptRecord {
    ReceiptAssembler::default().assemble(lines)
}
