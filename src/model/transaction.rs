//! Canonical transaction rows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of columns in the canonical transaction schema.
pub const CANONICAL_WIDTH: usize = 10;

/// Columns of the canonical transaction schema, in positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    Sequence,
    TransactionId,
    ValueDate,
    TransactionDate,
    PostedDate,
    Reference,
    Remarks,
    Withdrawal,
    Deposit,
    /// Reserved trailing field, carries the running balance
    Balance,
}

impl CanonicalColumn {
    /// All columns in positional order.
    pub const ALL: [CanonicalColumn; CANONICAL_WIDTH] = [
        CanonicalColumn::Sequence,
        CanonicalColumn::TransactionId,
        CanonicalColumn::ValueDate,
        CanonicalColumn::TransactionDate,
        CanonicalColumn::PostedDate,
        CanonicalColumn::Reference,
        CanonicalColumn::Remarks,
        CanonicalColumn::Withdrawal,
        CanonicalColumn::Deposit,
        CanonicalColumn::Balance,
    ];

    /// Positional index of the column.
    pub fn position(self) -> usize {
        self as usize
    }

    /// Column header as printed on the statement.
    pub fn header(self) -> &'static str {
        match self {
            CanonicalColumn::Sequence => "Sl No",
            CanonicalColumn::TransactionId => "Tran Id",
            CanonicalColumn::ValueDate => "Value Date",
            CanonicalColumn::TransactionDate => "Transaction Date",
            CanonicalColumn::PostedDate => "Transaction Posted Date",
            CanonicalColumn::Reference => "Cheque no / Ref No",
            CanonicalColumn::Remarks => "Transaction Remarks",
            CanonicalColumn::Withdrawal => "Withdrawal (Dr)",
            CanonicalColumn::Deposit => "Deposit (Cr)",
            CanonicalColumn::Balance => "Balance",
        }
    }

    /// Header spellings seen across statement layouts.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalColumn::Sequence => &["Sl No", "SlNo", "S No", "Sr No", "Serial No"],
            CanonicalColumn::TransactionId => {
                &["Tran Id", "Transaction Id", "Txn Id", "TxnId", "TranID"]
            }
            CanonicalColumn::ValueDate => &["Value Date", "Value Dt", "Val Dt"],
            CanonicalColumn::TransactionDate => &["Transaction Date", "Tran Date", "Txn Date"],
            CanonicalColumn::PostedDate => {
                &["Transaction Posted Date", "Posting Date", "Post Date"]
            }
            CanonicalColumn::Reference => &[
                "Cheque no / Ref No",
                "Cheque No/Ref No",
                "Chq/Ref No",
                "Ref No",
                "Cheque No",
            ],
            CanonicalColumn::Remarks => {
                &["Transaction Remarks", "Remarks", "Description", "Narration"]
            }
            CanonicalColumn::Withdrawal => &[
                "Withdrawal (Dr)",
                "Withdrawal",
                "Withdrawals",
                "Dr Amount",
                "Debit",
            ],
            CanonicalColumn::Deposit => {
                &["Deposit (Cr)", "Deposit", "Deposits", "Cr Amount", "Credit"]
            }
            CanonicalColumn::Balance => &["Balance", "Running Balance", "Closing Balance"],
        }
    }
}

/// A transaction normalized to the canonical schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    /// Contiguous 1-based id, assigned after merge
    pub sequence_id: u32,
    pub transaction_id: String,
    pub value_date: String,
    pub transaction_date: String,
    pub posted_date: String,
    /// Cheque or reference number
    pub reference: String,
    /// Free text with newlines collapsed to spaces
    pub remarks: String,
    pub withdrawal: Decimal,
    pub deposit: Decimal,
    /// Running balance, when the statement prints one
    pub balance: Option<Decimal>,
    /// Page the row was read from
    pub source_page: u32,
}

impl CanonicalRow {
    /// Parsed value date, if it is in `dd/mm/yyyy` or `dd-mm-yyyy` form.
    pub fn value_date(&self) -> Option<NaiveDate> {
        parse_statement_date(&self.value_date)
    }

    /// Parsed transaction date, if it is in `dd/mm/yyyy` or `dd-mm-yyyy` form.
    pub fn transaction_date(&self) -> Option<NaiveDate> {
        parse_statement_date(&self.transaction_date)
    }

    /// Whether exactly one of withdrawal/deposit is non-zero.
    pub fn is_single_sided(&self) -> bool {
        self.withdrawal.is_zero() != self.deposit.is_zero()
    }

    /// Deposit minus withdrawal.
    pub fn net_amount(&self) -> Decimal {
        self.deposit - self.withdrawal
    }
}

fn parse_statement_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // Posted dates carry a time component: "01/04/2023 10:15:22 AM"
    let date_part = text.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d-%m-%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn row(withdrawal: i64, deposit: i64) -> CanonicalRow {
        CanonicalRow {
            sequence_id: 1,
            transaction_id: "S1234".to_string(),
            value_date: "01/04/2023".to_string(),
            transaction_date: "02-04-2023".to_string(),
            posted_date: "02/04/2023 10:15:22 AM".to_string(),
            reference: String::new(),
            remarks: "UPI/payment".to_string(),
            withdrawal: Decimal::new(withdrawal, 2),
            deposit: Decimal::new(deposit, 2),
            balance: None,
            source_page: 1,
        }
    }

    #[test]
    fn test_column_positions() {
        for (i, column) in CanonicalColumn::ALL.iter().enumerate() {
            assert_eq!(column.position(), i);
            assert!(column.aliases().contains(&column.header()));
        }
    }

    #[test]
    fn test_date_accessors() {
        let row = row(10000, 0);
        let value = row.value_date().unwrap();
        assert_eq!((value.day(), value.month(), value.year()), (1, 4, 2023));
        assert_eq!(row.transaction_date().unwrap().day(), 2);
    }

    #[test]
    fn test_unparsable_date() {
        let mut row = row(10000, 0);
        row.value_date = "yesterday".to_string();
        assert!(row.value_date().is_none());
    }

    #[test]
    fn test_single_sided() {
        assert!(row(10000, 0).is_single_sided());
        assert!(row(0, 500).is_single_sided());
        assert!(!row(0, 0).is_single_sided());
        assert!(!row(100, 100).is_single_sided());
        assert_eq!(row(10000, 0).net_amount(), Decimal::new(-10000, 2));
    }
}
