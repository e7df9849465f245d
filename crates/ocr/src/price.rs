//! Turning OCR numeric tokens into amounts.
//!
//! Two entry points with deliberately different rules:
//! [`parse_amount`] takes the digits at face value and is what the item
//! parser uses, while [`normalize`] also repairs a dropped decimal point and
//! is only used when splitting a trailing price off a line for correction.

use std::str::FromStr;

use rust_decimal::Decimal;
use tillroll_core::Money;

re!(re_number, r"\d+(?:[.,]\d+)?");
re!(re_trailing_number, r"(\d+(?:[.,]\d+)?)\s*$");

/// Values above this with no decimal separator are read as cents.
const MISSING_DECIMAL_THRESHOLD: i64 = 100;

/// Parse the first numeric run in `token`, repairing a missing decimal
/// point: `"1234"` becomes `12.34`, `"45"` stays `45`.
pub fn normalize(token: &str) -> Option<Money> {
    let raw = re_number().find(token)?.as_str();
    let has_separator = raw.contains(['.', ',']);
    let value = Decimal::from_str(&raw.replace(',', ".")).ok()?;

    let value = if !has_separator && value > Decimal::from(MISSING_DECIMAL_THRESHOLD) {
        value / Decimal::from(100)
    } else {
        value
    };
    Some(Money::from_decimal(value))
}

/// Parse an already isolated numeric token (`3.50`, `3,50`, `-1.00`) as is.
pub fn parse_amount(token: &str) -> Option<Money> {
    Decimal::from_str(&token.replace(',', "."))
        .ok()
        .map(Money::from_decimal)
}

/// Split `line` into its product text and the price at the end of the line.
///
/// The price is the rightmost numeric run, which must close the line. Lines
/// without one come back whole with no price.
pub fn split_trailing_price(line: &str) -> (&str, Option<Money>) {
    match re_trailing_number().captures(line).and_then(|c| c.get(1)) {
        Some(m) => (line[..m.start()].trim(), normalize(m.as_str())),
        None => (line.trim(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_two_decimal_prices_round_trip() {
        for (s, cents) in [("3.50", 350), ("0.01", 1), ("99.99", 9999), ("249.00", 24900)] {
            assert_eq!(normalize(s), Some(Money::from_cents(cents)), "{s}");
        }
    }

    #[test]
    fn normalize_accepts_comma_separator() {
        assert_eq!(normalize("3,50"), Some(Money::from_cents(350)));
    }

    #[test]
    fn normalize_repairs_missing_decimal_point() {
        assert_eq!(normalize("1234"), Some(Money::from_cents(1234)));
        assert_eq!(normalize("45"), Some(Money::from_cents(4500)));
        assert_eq!(normalize("100"), Some(Money::from_cents(10000)));
        assert_eq!(normalize("101"), Some(Money::from_cents(101)));
    }

    #[test]
    fn normalize_extracts_digits_from_noise() {
        assert_eq!(normalize("$4.99F"), Some(Money::from_cents(499)));
    }

    #[test]
    fn normalize_rejects_tokens_without_digits() {
        assert_eq!(normalize("abc"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn parse_amount_keeps_sign_and_face_value() {
        assert_eq!(parse_amount("-1.00"), Some(Money::from_cents(-100)));
        assert_eq!(parse_amount("1234"), Some(Money::from_cents(123400)));
    }

    #[test]
    fn split_trailing_price_separates_product() {
        let (product, price) = split_trailing_price("MLK WHOLE GAL 3.49");
        assert_eq!(product, "MLK WHOLE GAL");
        assert_eq!(price, Some(Money::from_cents(349)));
    }

    #[test]
    fn split_trailing_price_applies_decimal_repair() {
        let (product, price) = split_trailing_price("CHEESE 1234");
        assert_eq!(product, "CHEESE");
        assert_eq!(price, Some(Money::from_cents(1234)));
    }

    #[test]
    fn split_trailing_price_without_number() {
        assert_eq!(split_trailing_price("  THANK YOU "), ("THANK YOU", None));
        assert_eq!(split_trailing_price("4 EGGS LARGE"), ("4 EGGS LARGE", None));
    }
}
