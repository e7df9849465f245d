use crate::types::RawText;

/// Names to add to the vocabulary from a receipt: each line with more than
/// one word, minus its last word (normally the price).
pub fn learnable_names(text: &RawText) -> Vec<String> {
    text.lines()
        .iter()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.split_last() {
                Some((_, rest)) if !rest.is_empty() => Some(rest.join(" ")),
                _ => None,
            }
        })
        .collect()
}
