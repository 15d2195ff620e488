//! Statement totals from the second-to-last page.

use std::sync::OnceLock;

use regex::Regex;

use crate::canonical::clean_amount;
use crate::error::{Section, Warning};
use crate::model::PageTotals;

struct TotalsRegexes {
    opening_balance: Regex,
    withdrawals: Regex,
    deposits: Regex,
    closing_balance: Regex,
}

fn regexes() -> &'static TotalsRegexes {
    static REGEXES: OnceLock<TotalsRegexes> = OnceLock::new();
    REGEXES.get_or_init(|| {
        let compile = |pattern: &str| Regex::new(pattern).expect("totals pattern is a valid regex");
        TotalsRegexes {
            opening_balance: compile(r"Opening Bal:\s*(-?[\d,]+\.\d+)"),
            // The statement prints "Withdrawls"
            withdrawals: compile(r"Withdrawa?ls:\s*([\d,]+\.\d+)"),
            deposits: compile(r"Deposits:\s*([\d,]+\.\d+)"),
            closing_balance: compile(r"Closing Bal:\s*(-?[\d,]+\.\d+)"),
        }
    })
}

/// Extract the four summary totals from page text.
///
/// Missing fields stay `None`; each one is reported as a warning.
pub fn extract_totals(text: &str) -> (PageTotals, Vec<Warning>) {
    let re = regexes();
    let mut warnings = Vec::new();

    let mut find = |label: &str, regex: &Regex| {
        let value = regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_amount(m.as_str()));
        if value.is_none() {
            warnings.push(Warning::ParseMismatch {
                section: Section::Totals,
                message: format!("{} not found", label),
            });
        }
        value
    };

    let totals = PageTotals {
        opening_balance: find("opening balance", &re.opening_balance),
        withdrawals: find("withdrawals", &re.withdrawals),
        deposits: find("deposits", &re.deposits),
        closing_balance: find("closing balance", &re.closing_balance),
    };

    (totals, warnings)
}
