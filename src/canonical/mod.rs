//! Canonicalization of raw table rows.
//!
//! Raw tables come back from extraction with inconsistent widths, repeated
//! headers and summary lines mixed in. [`RowCanonicalizer`] turns one batch of
//! raw tables into typed [`CanonicalRow`]s:
//!
//! 1. locate an optional header row and map its cells onto canonical columns
//!    by alias, falling back to positional mapping;
//! 2. drop noise rows in one scan with the combined [`NoiseFilter`];
//! 3. admit only rows whose sequence cell is a positive integer;
//! 4. normalize text (newlines to spaces) and amounts ([`clean_amount`]).
//!
//! Width reconciliation in positional mode: cells past the tenth are ignored,
//! and short rows fill the leading canonical columns only.

mod amount;
mod noise;

pub use amount::{clean_amount, is_blank_amount, parse_amount};
pub use noise::{NoiseFilter, NoisePattern, DEFAULT_NOISE_PATTERNS};

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::Warning;
use crate::model::{CanonicalColumn, CanonicalRow, RawTable, CANONICAL_WIDTH};

/// Rows and warnings produced from a batch of raw tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalBatch {
    pub rows: Vec<CanonicalRow>,
    pub warnings: Vec<Warning>,
}

impl CanonicalBatch {
    fn extend(&mut self, other: CanonicalBatch) {
        self.rows.extend(other.rows);
        self.warnings.extend(other.warnings);
    }
}

/// Source cell index for each canonical column.
type ColumnMap = [Option<usize>; CANONICAL_WIDTH];

fn positional_map() -> ColumnMap {
    let mut map = [None; CANONICAL_WIDTH];
    for (i, slot) in map.iter_mut().enumerate() {
        *slot = Some(i);
    }
    map
}

/// Maps raw table rows onto the canonical transaction schema.
#[derive(Debug, Clone)]
pub struct RowCanonicalizer {
    noise: NoiseFilter,
    aliases: HashMap<String, CanonicalColumn>,
}

impl RowCanonicalizer {
    /// Create a canonicalizer with the default noise phrases.
    pub fn new() -> Self {
        Self::with_noise_filter(NoiseFilter::default())
    }

    /// Create a canonicalizer with a custom noise filter.
    pub fn with_noise_filter(noise: NoiseFilter) -> Self {
        let mut aliases = HashMap::new();
        for column in CanonicalColumn::ALL {
            for alias in column.aliases() {
                let key = normalize_header(alias);
                if !key.is_empty() {
                    aliases.entry(key).or_insert(column);
                }
            }
        }
        Self { noise, aliases }
    }

    /// The noise filter in use.
    pub fn noise_filter(&self) -> &NoiseFilter {
        &self.noise
    }

    /// Canonicalize a batch of tables, preserving table and row order.
    pub fn canonicalize_all(&self, tables: &[RawTable]) -> CanonicalBatch {
        let mut batch = CanonicalBatch::default();
        for table in tables {
            batch.extend(self.canonicalize(table));
        }
        batch
    }

    /// Canonicalize one table.
    pub fn canonicalize(&self, table: &RawTable) -> CanonicalBatch {
        let (body_start, map) = match self.locate_header(&table.rows) {
            Some((index, map)) => (index + 1, map),
            None => (0, positional_map()),
        };

        let body = table.rows[body_start..].to_vec();
        let candidates = body.len();
        let body = self.noise.retain_rows(body);

        let mut batch = CanonicalBatch::default();
        for row in &body {
            if row.first().map_or(true, |cell| cell.trim().is_empty()) {
                continue;
            }
            if let Some(canonical) = build_row(row, &map, table.source_page, &mut batch.warnings)
            {
                batch.rows.push(canonical);
            }
        }

        log::debug!(
            "page {}: {} of {} body rows admitted ({} noise)",
            table.source_page,
            batch.rows.len(),
            candidates,
            candidates - body.len()
        );

        batch
    }

    /// Find the header row and derive a column map from it.
    ///
    /// Returns `None` when no row looks like a header or none of its cells
    /// matches a known alias.
    fn locate_header(&self, rows: &[Vec<String>]) -> Option<(usize, ColumnMap)> {
        let index = rows.iter().position(|row| {
            row.first()
                .is_some_and(|cell| cell.to_lowercase().contains("sl"))
        })?;

        let mut map: ColumnMap = [None; CANONICAL_WIDTH];
        for (i, cell) in rows[index].iter().enumerate() {
            if let Some(column) = self.aliases.get(&normalize_header(cell)) {
                let slot = &mut map[column.position()];
                if slot.is_none() {
                    *slot = Some(i);
                }
            }
        }

        if map.iter().all(Option::is_none) {
            return Some((index, positional_map()));
        }
        // The matched header cell is the sequence column
        map[CanonicalColumn::Sequence.position()].get_or_insert(0);
        Some((index, map))
    }
}

impl Default for RowCanonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn build_row(
    row: &[String],
    map: &ColumnMap,
    page: u32,
    warnings: &mut Vec<Warning>,
) -> Option<CanonicalRow> {
    let cell = |column: CanonicalColumn| -> &str {
        map[column.position()]
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    };

    let sequence = parse_sequence(cell(CanonicalColumn::Sequence))?;

    let mut amount = |column: CanonicalColumn, field: &'static str| -> Decimal {
        let raw = cell(column);
        parse_amount(raw).unwrap_or_else(|| {
            let warning = Warning::MalformedRow {
                page,
                sequence,
                field,
                value: raw.to_string(),
            };
            log::warn!("{}", warning);
            warnings.push(warning);
            Decimal::ZERO
        })
    };

    let withdrawal = amount(CanonicalColumn::Withdrawal, "withdrawal");
    let deposit = amount(CanonicalColumn::Deposit, "deposit");
    let balance = if is_blank_amount(cell(CanonicalColumn::Balance)) {
        None
    } else {
        Some(amount(CanonicalColumn::Balance, "balance"))
    };

    Some(CanonicalRow {
        sequence_id: sequence,
        transaction_id: normalize_text(cell(CanonicalColumn::TransactionId)),
        value_date: normalize_text(cell(CanonicalColumn::ValueDate)),
        transaction_date: normalize_text(cell(CanonicalColumn::TransactionDate)),
        posted_date: normalize_text(cell(CanonicalColumn::PostedDate)),
        reference: normalize_text(cell(CanonicalColumn::Reference)),
        remarks: normalize_text(cell(CanonicalColumn::Remarks)),
        withdrawal,
        deposit,
        balance,
        source_page: page,
    })
}

/// Parse a sequence cell as a positive integer.
pub fn parse_sequence(raw: &str) -> Option<u32> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<u32>().ok().filter(|n| *n > 0)
}

/// Collapse newlines in free text to single spaces and trim the ends.
pub fn normalize_text(raw: &str) -> String {
    raw.lines().collect::<Vec<_>>().join(" ").trim().to_string()
}

/// Lowercase a header and keep only ASCII letters and digits.
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable {
            chunk_index: 0,
            source_page: 3,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    const HEADER: &[&str] = &[
        "Sl No",
        "Tran Id",
        "Value Date",
        "Transaction Date",
        "Transaction Posted Date",
        "Cheque no / Ref No",
        "Transaction Remarks",
        "Withdrawal (Dr)",
        "Deposit (Cr)",
        "Balance",
    ];

    #[test]
    fn test_positional_full_width() {
        let raw = table(&[&[
            "1",
            "S100",
            "01/04/2023",
            "01/04/2023",
            "01/04/2023 10:00:00 AM",
            "-",
            "UPI/123/\nGrocer",
            "1,234.00",
            "",
            "10,000.00",
        ]]);
        let batch = RowCanonicalizer::new().canonicalize(&raw);

        assert_eq!(batch.rows.len(), 1);
        assert!(batch.warnings.is_empty());
        let row = &batch.rows[0];
        assert_eq!(row.sequence_id, 1);
        assert_eq!(row.transaction_id, "S100");
        assert_eq!(row.remarks, "UPI/123/ Grocer");
        assert_eq!(row.withdrawal, Decimal::new(123400, 2));
        assert_eq!(row.deposit, Decimal::ZERO);
        assert_eq!(row.balance, Some(Decimal::new(1000000, 2)));
        assert_eq!(row.source_page, 3);
    }

    #[test]
    fn test_wide_rows_truncated() {
        let mut cells: Vec<&str> = vec!["2", "S1", "d", "d", "d", "r", "m", "0", "50.00", "50.00"];
        cells.extend(["extra", "999"]);
        let raw = table(&[&cells]);
        let batch = RowCanonicalizer::new().canonicalize(&raw);
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].deposit, Decimal::new(5000, 2));
        assert_eq!(batch.rows[0].balance, Some(Decimal::new(5000, 2)));
    }

    #[test]
    fn test_narrow_rows_fill_leading_columns() {
        let raw = table(&[&["3", "S9", "02/04/2023"]]);
        let batch = RowCanonicalizer::new().canonicalize(&raw);
        let row = &batch.rows[0];
        assert_eq!(row.value_date, "02/04/2023");
        assert_eq!(row.transaction_date, "");
        assert_eq!(row.remarks, "");
        assert_eq!(row.withdrawal, Decimal::ZERO);
        assert_eq!(row.balance, None);
    }

    #[test]
    fn test_noise_and_admission() {
        let raw = table(&[
            &["Page Total", "", "", "", "", "", "", "100.00", "0.00"],
            &["", "continuation"],
            &["abc", "S1"],
            &["0", "S2"],
            &["4", "S3"],
            &["Opening Bal", "1,000.00"],
        ]);
        let batch = RowCanonicalizer::new().canonicalize(&raw);
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].sequence_id, 4);
    }

    #[test]
    fn test_header_mapping_reorders_columns() {
        let raw = table(&[
            &["Statement of account"],
            &["Sl No", "Remarks", "Tran Id", "Credit", "Debit"],
            &["1", "Salary", "S1", "50,000.00", ""],
            &["2", "Rent", "S2", "", "20,000.00"],
        ]);
        let batch = RowCanonicalizer::new().canonicalize(&raw);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[0].remarks, "Salary");
        assert_eq!(batch.rows[0].transaction_id, "S1");
        assert_eq!(batch.rows[0].deposit, Decimal::new(5000000, 2));
        assert_eq!(batch.rows[1].withdrawal, Decimal::new(2000000, 2));
        assert_eq!(batch.rows[1].value_date, "");
    }

    #[test]
    fn test_unaliased_sequence_header_keeps_rows() {
        let raw = table(&[
            &["Sl", "Tran Id", "Transaction Remarks", "Withdrawal (Dr)"],
            &["1", "S1", "ATM", "500.00"],
            &["2", "S2", "POS", "20.00"],
        ]);
        let batch = RowCanonicalizer::new().canonicalize(&raw);

        assert_eq!(batch.rows.len(), 2);
        assert!(batch.warnings.is_empty());
        assert_eq!(batch.rows[0].sequence_id, 1);
        assert_eq!(batch.rows[0].transaction_id, "S1");
        assert_eq!(batch.rows[1].remarks, "POS");
        assert_eq!(batch.rows[1].withdrawal, Decimal::new(2000, 2));
    }

    #[test]
    fn test_unknown_header_falls_back_to_positional() {
        let raw = table(&[&["SL", "???", "???"], &["5", "S5", "03/04/2023"]]);
        let batch = RowCanonicalizer::new().canonicalize(&raw);
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].transaction_id, "S5");
        assert_eq!(batch.rows[0].value_date, "03/04/2023");
    }

    #[test]
    fn test_canonical_header_row_maps_every_column() {
        let raw = table(&[HEADER, &["7", "S7", "a", "b", "c", "d", "e", "1.00", "", "9.00"]]);
        let batch = RowCanonicalizer::new().canonicalize(&raw);
        let row = &batch.rows[0];
        assert_eq!(row.posted_date, "c");
        assert_eq!(row.reference, "d");
        assert_eq!(row.withdrawal, Decimal::new(100, 2));
        assert_eq!(row.balance, Some(Decimal::new(900, 2)));
    }

    #[test]
    fn test_malformed_amount_defaults_and_warns() {
        let raw = table(&[&["1", "S1", "", "", "", "", "", "12,3x", "", ""]]);
        let batch = RowCanonicalizer::new().canonicalize(&raw);
        assert_eq!(batch.rows[0].withdrawal, Decimal::ZERO);
        assert_eq!(batch.warnings.len(), 1);
        assert!(matches!(
            &batch.warnings[0],
            Warning::MalformedRow { field: "withdrawal", sequence: 1, page: 3, .. }
        ));
    }

    #[test]
    fn test_canonicalize_all_preserves_table_order() {
        let first = table(&[&["2", "A"], &["1", "B"]]);
        let mut second = table(&[&["1", "C"]]);
        second.source_page = 4;
        let batch = RowCanonicalizer::new().canonicalize_all(&[first, second]);
        let ids: Vec<_> = batch.rows.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(batch.rows[2].source_page, 4);
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence(" 12 "), Some(12));
        assert_eq!(parse_sequence("1 2"), Some(12));
        assert_eq!(parse_sequence("0"), None);
        assert_eq!(parse_sequence("-3"), None);
        assert_eq!(parse_sequence("3a"), None);
        assert_eq!(parse_sequence(""), None);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("NEFT\nSALARY\r\nAPRIL "), "NEFT SALARY APRIL");
        assert_eq!(normalize_text("  plain  "), "plain");
    }
}
