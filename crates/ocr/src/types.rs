use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tillroll_core::Money;

/// OCR output split into lines, top to bottom. Blank lines are dropped and
/// every line is trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawText {
    lines: Vec<String>,
}

impl RawText {
    pub fn from_ocr(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    /// `None` when the price token could not be parsed as an amount.
    pub price: Option<Money>,
}

/// The structured result of interpreting one receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub store: Option<String>,
    /// The date exactly as printed, e.g. `2024-01-15` or `15/01/2024`.
    pub date: Option<String>,
    pub items: Vec<LineItem>,
    pub total: Option<Money>,
}

impl ReceiptRecord {
    /// Resolve `date` to a calendar date. Slash and dash forms are read
    /// day-first, falling back to month-first when that is the only valid
    /// reading.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%m/%d/%Y", "%m-%d-%Y"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }

    /// Sum of the item prices that parsed.
    pub fn items_total(&self) -> Money {
        self.items.iter().filter_map(|i| i.price).sum()
    }
}
