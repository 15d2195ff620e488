//! Statement-level types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CanonicalRow;
use crate::error::Warning;

/// Account details printed on the first page.
///
/// Every field is always present; fields that were not found are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub name: String,
    pub address: String,
    pub account_number: String,
    pub account_type: String,
    pub customer_id: String,
    pub branch: String,
    pub branch_address: String,
    pub branch_code: String,
    pub ifsc_code: String,
    pub transaction_period: String,
    pub statement_date: String,
    pub currency: String,
}

impl AccountMetadata {
    /// Field names in output order.
    pub const FIELDS: [&'static str; 12] = [
        "name",
        "address",
        "account_number",
        "account_type",
        "customer_id",
        "branch",
        "branch_address",
        "branch_code",
        "ifsc_code",
        "transaction_period",
        "statement_date",
        "currency",
    ];

    /// Get a field by name.
    pub fn get(&self, field: &str) -> Option<&str> {
        let value = match field {
            "name" => &self.name,
            "address" => &self.address,
            "account_number" => &self.account_number,
            "account_type" => &self.account_type,
            "customer_id" => &self.customer_id,
            "branch" => &self.branch,
            "branch_address" => &self.branch_address,
            "branch_code" => &self.branch_code,
            "ifsc_code" => &self.ifsc_code,
            "transaction_period" => &self.transaction_period,
            "statement_date" => &self.statement_date,
            "currency" => &self.currency,
            _ => return None,
        };
        Some(value)
    }

    /// Mutable access to a field by name.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut String> {
        let value = match field {
            "name" => &mut self.name,
            "address" => &mut self.address,
            "account_number" => &mut self.account_number,
            "account_type" => &mut self.account_type,
            "customer_id" => &mut self.customer_id,
            "branch" => &mut self.branch,
            "branch_address" => &mut self.branch_address,
            "branch_code" => &mut self.branch_code,
            "ifsc_code" => &mut self.ifsc_code,
            "transaction_period" => &mut self.transaction_period,
            "statement_date" => &mut self.statement_date,
            "currency" => &mut self.currency,
            _ => return None,
        };
        Some(value)
    }

    /// Iterate `(field, value)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        Self::FIELDS
            .iter()
            .map(move |field| (*field, self.get(field).unwrap_or_default()))
    }

    /// Number of fields that were found.
    pub fn filled_count(&self) -> usize {
        self.iter().filter(|(_, value)| !value.is_empty()).count()
    }
}

/// Summary balances from the second-to-last page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTotals {
    pub opening_balance: Option<Decimal>,
    pub withdrawals: Option<Decimal>,
    pub deposits: Option<Decimal>,
    pub closing_balance: Option<Decimal>,
}

impl PageTotals {
    /// Whether no total was found.
    pub fn is_empty(&self) -> bool {
        self.opening_balance.is_none()
            && self.withdrawals.is_none()
            && self.deposits.is_none()
            && self.closing_balance.is_none()
    }

    /// Closing minus opening balance, when both are known.
    pub fn net_change(&self) -> Option<Decimal> {
        Some(self.closing_balance? - self.opening_balance?)
    }
}

/// A transaction code explained at the end of the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    /// Ordinal as printed; not necessarily unique
    pub ordinal: u32,
    pub code: String,
    pub description: String,
}

impl LegendEntry {
    /// Create a legend entry.
    pub fn new(ordinal: u32, code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            ordinal,
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Everything extracted from one statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    /// Total pages in the source document
    pub page_count: u32,
    pub metadata: AccountMetadata,
    /// Transactions in document order, ids `1..=N`
    pub transactions: Vec<CanonicalRow>,
    pub totals: PageTotals,
    /// Legend entries in document order
    pub legends: Vec<LegendEntry>,
    /// Recoverable problems met while parsing
    #[serde(skip_deserializing)]
    pub warnings: Vec<Warning>,
}

impl Statement {
    /// Split into the four record sets.
    pub fn into_parts(
        self,
    ) -> (
        AccountMetadata,
        Vec<CanonicalRow>,
        PageTotals,
        Vec<LegendEntry>,
    ) {
        (self.metadata, self.transactions, self.totals, self.legends)
    }

    /// Whether the parse completed without warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Sum of all withdrawals.
    pub fn total_withdrawals(&self) -> Decimal {
        self.transactions.iter().map(|t| t.withdrawal).sum()
    }

    /// Sum of all deposits.
    pub fn total_deposits(&self) -> Decimal {
        self.transactions.iter().map(|t| t.deposit).sum()
    }
}
