//! Monetary cell cleaning.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse a monetary cell.
///
/// Thousands separators and all whitespace are removed. A trailing minus
/// (`"500-"`) marks a negative value. Blank cells and a lone `-` read as zero.
/// Returns `None` when the cleaned text is not a number.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return Some(Decimal::ZERO);
    }

    let signed = match cleaned.strip_suffix('-') {
        Some(body) if !body.starts_with('-') => format!("-{}", body),
        _ => cleaned,
    };

    Decimal::from_str(&signed).ok()
}

/// Parse a monetary cell, defaulting to zero when it is not a number.
pub fn clean_amount(raw: &str) -> Decimal {
    parse_amount(raw).unwrap_or(Decimal::ZERO)
}

/// Whether a cell holds nothing that could be an amount.
pub fn is_blank_amount(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "-"
}
