//! Account metadata from the first page.

use std::sync::OnceLock;

use regex::Regex;

use crate::canonical::normalize_text;
use crate::model::AccountMetadata;

/// Field name and pattern; capture group 1 holds the value.
///
/// Free-text fields run up to the label printed after them on the page.
const FIELD_PATTERNS: [(&str, &str); 12] = [
    ("name", r"(?s)Name:\s*(.+?)\s+A/C Branch:"),
    // Anchored to a line start so "Branch Address:" does not match.
    ("address", r"(?s)(?:\A|\n)[ \t]*Address:\s*(.+?)\s*A/C No:"),
    ("account_number", r"A/C No:\s*(\d+)"),
    ("account_type", r"A/C Type:\s*(\w+)"),
    ("customer_id", r"Cust ID:\s*(\d+)"),
    ("branch", r"(?s)A/C Branch:\s*(.+?)Branch Address:"),
    ("branch_address", r"(?s)Branch Address:\s*(.+?)A/C Type:"),
    ("branch_code", r"Branch Code:\s*(\d+)"),
    ("ifsc_code", r"IFSC Code:\s*(\w+)"),
    ("transaction_period", r"(?s)Transaction Period:\s*(.+?)IFSC Code:"),
    (
        "statement_date",
        r"Statement\s+Request/Download\s+Date:\s*(\d{2}/\d{2}/\d{4})",
    ),
    ("currency", r"Account Currency:\s*(\w+)"),
];

fn field_regexes() -> &'static [(&'static str, Regex)] {
    static REGEXES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        FIELD_PATTERNS
            .iter()
            .map(|(field, pattern)| {
                (
                    *field,
                    Regex::new(pattern).expect("metadata pattern is a valid regex"),
                )
            })
            .collect()
    })
}

/// Extract account metadata from first-page text.
///
/// Never fails: fields without a match stay empty.
pub fn extract_metadata(text: &str) -> AccountMetadata {
    let mut metadata = AccountMetadata::default();

    for (field, re) in field_regexes() {
        let Some(value) = re.captures(text).and_then(|caps| caps.get(1)) else {
            log::debug!("metadata field {} not found", field);
            continue;
        };
        if let Some(slot) = metadata.get_mut(field) {
            *slot = normalize_text(value.as_str());
        }
    }

    metadata
}
