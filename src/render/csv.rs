//! CSV output: one file per record set.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ::csv::Writer;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{
    AccountMetadata, CanonicalColumn, CanonicalRow, LegendEntry, PageTotals, Statement,
};

pub const METADATA_FILE: &str = "account_metadata.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";
pub const TOTALS_FILE: &str = "page_totals.csv";
pub const LEGENDS_FILE: &str = "legends.csv";

const TOTALS_HEADER: [&str; 4] = ["opening_balance", "withdrawals", "deposits", "closing_balance"];
const LEGENDS_HEADER: [&str; 3] = ["ordinal", "code", "description"];

/// Write the four CSV files for a statement into `dir`, creating it if needed.
///
/// Returns the paths written, in the order metadata, transactions, totals,
/// legends.
pub fn write_csv_dir<P: AsRef<Path>>(statement: &Statement, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let paths: Vec<PathBuf> = [METADATA_FILE, TRANSACTIONS_FILE, TOTALS_FILE, LEGENDS_FILE]
        .iter()
        .map(|name| dir.join(name))
        .collect();

    write_metadata(&statement.metadata, fs::File::create(&paths[0])?)?;
    write_transactions(&statement.transactions, fs::File::create(&paths[1])?)?;
    write_totals(&statement.totals, fs::File::create(&paths[2])?)?;
    write_legends(&statement.legends, fs::File::create(&paths[3])?)?;

    log::info!("wrote {} CSV files to {}", paths.len(), dir.display());
    Ok(paths)
}

/// Account metadata as a header row and a single value row.
pub fn write_metadata<W: Write>(metadata: &AccountMetadata, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(AccountMetadata::FIELDS)?;
    writer.write_record(metadata.iter().map(|(_, value)| value))?;
    writer.flush()?;
    Ok(())
}

/// Transactions under the canonical column headers.
pub fn write_transactions<W: Write>(rows: &[CanonicalRow], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(CanonicalColumn::ALL.iter().map(|c| c.header()))?;
    for row in rows {
        writer.write_record([
            row.sequence_id.to_string(),
            row.transaction_id.clone(),
            row.value_date.clone(),
            row.transaction_date.clone(),
            row.posted_date.clone(),
            row.reference.clone(),
            row.remarks.clone(),
            row.withdrawal.to_string(),
            row.deposit.to_string(),
            optional(row.balance),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Page totals as a header row and a single value row; missing totals are empty.
pub fn write_totals<W: Write>(totals: &PageTotals, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(TOTALS_HEADER)?;
    writer.write_record([
        optional(totals.opening_balance),
        optional(totals.withdrawals),
        optional(totals.deposits),
        optional(totals.closing_balance),
    ])?;
    writer.flush()?;
    Ok(())
}

/// Legend entries in document order.
pub fn write_legends<W: Write>(legends: &[LegendEntry], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(LEGENDS_HEADER)?;
    for entry in legends {
        writer.write_record([
            entry.ordinal.to_string(),
            entry.code.clone(),
            entry.description.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn optional(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_transactions_header_and_quoting() {
        let rows = vec![CanonicalRow {
            sequence_id: 1,
            transaction_id: "S1".to_string(),
            remarks: "UPI, grocer".to_string(),
            withdrawal: Decimal::new(123400, 2),
            ..Default::default()
        }];
        let out = render(|buf| write_transactions(&rows, buf));
        let mut lines = out.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Sl No,Tran Id,Value Date,Transaction Date,Transaction Posted Date,\
             Cheque no / Ref No,Transaction Remarks,Withdrawal (Dr),Deposit (Cr),Balance"
        );
        assert_eq!(lines.next().unwrap(), "1,S1,,,,,\"UPI, grocer\",1234.00,0,");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_metadata_single_row() {
        let metadata = AccountMetadata {
            name: "A B".to_string(),
            currency: "INR".to_string(),
            ..Default::default()
        };
        let out = render(|buf| write_metadata(&metadata, buf));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("name,address,account_number"));
        assert!(lines[1].starts_with("A B,"));
        assert!(lines[1].ends_with(",INR"));
    }

    #[test]
    fn test_missing_totals_are_empty() {
        let totals = PageTotals {
            opening_balance: Some(Decimal::new(-5000, 2)),
            ..Default::default()
        };
        let out = render(|buf| write_totals(&totals, buf));
        assert_eq!(
            out,
            "opening_balance,withdrawals,deposits,closing_balance\n-50.00,,,\n"
        );
    }

    #[test]
    fn test_write_csv_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut statement = Statement::default();
        statement
            .legends
            .push(LegendEntry::new(1, "ATM", "ATM Withdrawal"));

        let paths = write_csv_dir(&statement, dir.path().join("out")).unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.exists()));

        let legends = fs::read_to_string(&paths[3]).unwrap();
        assert_eq!(legends, "ordinal,code,description\n1,ATM,ATM Withdrawal\n");
    }
}
