use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An immutable snapshot of known item names.
///
/// Every commit to the backing store produces a new snapshot with the
/// version bumped by one; version 0 is the state loaded from disk (or the
/// empty vocabulary when no file exists yet).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub version: u64,
    items: BTreeSet<String>,
}

impl Vocabulary {
    pub fn new(version: u64, items: impl IntoIterator<Item = String>) -> Self {
        let items = items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { version, items }
    }

    /// Parse the newline-delimited on-disk format. Blank lines are ignored.
    pub fn from_lines(version: u64, text: &str) -> Self {
        Self::new(version, text.lines().map(str::to_string))
    }

    /// Render in the on-disk format: one name per line, trailing newline.
    pub fn to_lines(&self) -> String {
        self.items.iter().map(|s| format!("{s}\n")).collect()
    }

    /// Merge `names` into a copy of this snapshot at the next version.
    pub fn with_names(&self, names: impl IntoIterator<Item = String>) -> Self {
        let mut next = Self::new(self.version + 1, names);
        next.items.extend(self.items.iter().cloned());
        next
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
