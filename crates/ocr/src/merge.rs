//! Joining weighted-produce continuations onto their item line.
//!
//! Items sold by weight usually print on two physical lines:
//!
//! ```text
//! BANANAS 2.00 Tb
//! @ 0.54/1b 1.08
//! ```
//!
//! The price on the second line belongs to the first, so the pair is merged
//! into one line before classification.

use std::borrow::Cow;

re!(re_weighted_continuation,
    r"\d+(?:[.,]\d{1,2})?\s*(?:/1b|/lb|\blb\b|\bTb\b|@)|^@\s*\$?\d");

/// Whether `line` carries unit-price or weight detail for the line above.
pub fn is_continuation(line: &str) -> bool {
    re_weighted_continuation().is_match(line.trim())
}

/// Iterator over lines with continuations folded into the preceding line.
/// A consumed continuation is never yielded on its own.
pub struct MergedLines<'a> {
    lines: &'a [String],
    pos: usize,
}

impl<'a> MergedLines<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        Self { lines, pos: 0 }
    }
}

impl<'a> Iterator for MergedLines<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;

        match self.lines.get(self.pos) {
            Some(next) if is_continuation(next) => {
                self.pos += 1;
                tracing::debug!(line = %line, continuation = %next, "Merged weighted line");
                Some(Cow::Owned(format!("{line} {next}")))
            }
            _ => Some(Cow::Borrowed(line.as_str())),
        }
    }
}
