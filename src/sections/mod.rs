//! Fixed-page sections: account metadata, totals and legends.
//!
//! These are read from the plain text of known pages and never touch the
//! chunked table pipeline. Missing structure is reported as
//! [`Warning::ParseMismatch`]; nothing here fails a parse.

mod legend;
mod metadata;
mod totals;

pub use legend::extract_legends;
pub use metadata::extract_metadata;
pub use totals::extract_totals;

use crate::error::{Section, Warning};
use crate::model::{AccountMetadata, LegendEntry, PageTotals};
use crate::parser::TextSource;

/// Everything read from the fixed pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionData {
    pub metadata: AccountMetadata,
    pub totals: PageTotals,
    pub legends: Vec<LegendEntry>,
    pub warnings: Vec<Warning>,
}

/// Pages holding the legend: the last two, or the only page.
pub fn legend_pages(page_count: u32) -> std::ops::RangeInclusive<u32> {
    page_count.saturating_sub(1).max(1)..=page_count
}

/// Page holding the totals, if the document has one.
pub fn totals_page(page_count: u32) -> Option<u32> {
    (page_count >= 2).then(|| page_count - 1)
}

/// Read metadata, totals and legends from a document.
pub fn extract_sections<S: TextSource + ?Sized>(source: &S, page_count: u32) -> SectionData {
    let mut data = SectionData::default();

    if page_count == 0 {
        return data;
    }

    match source.page_text(1) {
        Ok(text) => {
            data.metadata = extract_metadata(&text);
            if data.metadata.filled_count() == 0 {
                data.warnings.push(mismatch(
                    Section::Metadata,
                    "no account fields found on page 1".to_string(),
                ));
            }
        }
        Err(e) => data
            .warnings
            .push(mismatch(Section::Metadata, format!("page 1: {}", e))),
    }

    match totals_page(page_count) {
        Some(page) => match source.page_text(page) {
            Ok(text) => {
                let (totals, warnings) = extract_totals(&text);
                data.totals = totals;
                data.warnings.extend(warnings);
            }
            Err(e) => data
                .warnings
                .push(mismatch(Section::Totals, format!("page {}: {}", page, e))),
        },
        None => data.warnings.push(mismatch(
            Section::Totals,
            "document has fewer than two pages".to_string(),
        )),
    }

    for page in legend_pages(page_count) {
        match source.page_text(page) {
            Ok(text) => data.legends.extend(extract_legends(&text)),
            Err(e) => data
                .warnings
                .push(mismatch(Section::Legends, format!("page {}: {}", page, e))),
        }
    }
    if data.legends.is_empty() {
        data.warnings.push(mismatch(
            Section::Legends,
            "no legend entries found".to_string(),
        ));
    }

    for warning in &data.warnings {
        log::warn!("{}", warning);
    }
    log::info!(
        "sections: {} metadata fields, {} legend entries",
        data.metadata.filled_count(),
        data.legends.len()
    );

    data
}

fn mismatch(section: Section, message: String) -> Warning {
    Warning::ParseMismatch { section, message }
}
