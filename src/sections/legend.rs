//! Transaction code legends printed at the end of a statement.

use std::sync::OnceLock;

use regex::Regex;

use crate::canonical::normalize_text;
use crate::model::LegendEntry;

fn entry_head() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+)\.\s+([A-Z/\s]+?)\s+-\s+").expect("legend head is a valid regex")
    })
}

fn next_entry() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\d+\.").expect("legend separator is a valid regex"))
}

/// Extract `"<ordinal>. <code> - <description>"` entries in text order.
///
/// A description runs until the next line that starts with an ordinal, or
/// the end of the text. Duplicates are kept.
pub fn extract_legends(text: &str) -> Vec<LegendEntry> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while let Some(caps) = entry_head().captures_at(text, pos) {
        let (Some(head), Some(ordinal), Some(code)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            break;
        };

        let desc_start = head.end();
        let Some(first) = text[desc_start..].chars().next() else {
            break;
        };
        // Descriptions are at least one character long.
        let desc_end = next_entry()
            .find_at(text, desc_start + first.len_utf8())
            .map_or(text.len(), |m| m.start());

        match ordinal.as_str().parse::<u32>() {
            Ok(ordinal) => entries.push(LegendEntry::new(
                ordinal,
                code.as_str().trim(),
                normalize_text(&text[desc_start..desc_end]),
            )),
            Err(_) => log::debug!("legend ordinal out of range: {}", ordinal.as_str()),
        }

        pos = desc_end;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_entries() {
        let legends = extract_legends("1. ATM - ATM Withdrawal\n2. POS - Point of Sale");
        assert_eq!(
            legends,
            vec![
                LegendEntry::new(1, "ATM", "ATM Withdrawal"),
                LegendEntry::new(2, "POS", "Point of Sale"),
            ]
        );
    }

    #[test]
    fn test_multiline_description() {
        let legends =
            extract_legends("Legends\n1. NEFT - National Electronic\nFunds Transfer\n2. CHQ - Cheque");
        assert_eq!(legends.len(), 2);
        assert_eq!(legends[0].code, "NEFT");
        assert_eq!(legends[0].description, "National Electronic Funds Transfer");
        assert_eq!(legends[1].description, "Cheque");
    }

    #[test]
    fn test_code_with_slash_and_space() {
        let legends = extract_legends("3. BIL/ONL - Bill Payment Online");
        assert_eq!(legends[0].ordinal, 3);
        assert_eq!(legends[0].code, "BIL/ONL");
        assert_eq!(legends[0].description, "Bill Payment Online");
    }

    #[test]
    fn test_duplicates_preserved() {
        let legends = extract_legends("1. ATM - Cash\n1. ATM - Cash");
        assert_eq!(legends.len(), 2);
        assert_eq!(legends[0], legends[1]);
    }

    #[test]
    fn test_no_entries() {
        assert!(extract_legends("").is_empty());
        assert!(extract_legends("Closing Bal: 10.00").is_empty());
        assert!(extract_legends("1. ATM - ").is_empty());
    }
}
