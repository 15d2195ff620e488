//! Statement source capabilities.
//!
//! The pipeline reads a document through two narrow capabilities: plain
//! page text for the fixed-page sections, and table extraction over a page
//! range for the transaction ledger. Any type providing both can be parsed;
//! [`LopdfBackend`] is the PDF implementation.

use std::ops::RangeInclusive;

use super::backend::{LopdfBackend, PdfBackend};
use super::layout::extract_page_layout;
use super::options::Strategy;
use super::ruled::RuledDetector;
use super::table_detector::TableDetector;
use crate::error::{Error, Result};
use crate::model::PageTable;

/// Plain text of a page.
pub trait TextSource {
    /// Text of a 1-indexed page.
    fn page_text(&self, page: u32) -> Result<String>;
}

/// Tables over a range of pages.
pub trait TableSource {
    /// Tables found on the 1-indexed, inclusive page range, in page order.
    fn extract_tables(&self, pages: RangeInclusive<u32>, strategy: Strategy)
        -> Result<Vec<PageTable>>;
}

/// A document the statement pipeline can read.
///
/// Implementations must be safe to read from several workers at once.
pub trait StatementSource: TextSource + TableSource + Send + Sync {
    /// Total number of pages.
    fn page_count(&self) -> u32;
}

impl TextSource for LopdfBackend {
    fn page_text(&self, page: u32) -> Result<String> {
        self.plain_text(page)
    }
}

impl TableSource for LopdfBackend {
    fn extract_tables(
        &self,
        pages: RangeInclusive<u32>,
        strategy: Strategy,
    ) -> Result<Vec<PageTable>> {
        let page_count = self.page_count();
        if *pages.end() > page_count || *pages.start() == 0 {
            return Err(Error::PageOutOfRange(*pages.end(), page_count));
        }

        let sparse = TableDetector::new();
        let ruled = RuledDetector::new();
        let mut tables = Vec::new();

        for page in pages {
            let layout = extract_page_layout(self, page)
                .map_err(|e| Error::TableExtract(format!("page {}: {}", page, e)))?;
            let found = match strategy {
                Strategy::Sparse => sparse.extract(page, layout.spans),
                Strategy::Ruled => ruled.extract(page, &layout),
            };
            log::debug!("{} strategy: page {} has {} tables", strategy, page, found.len());
            tables.extend(found);
        }

        Ok(tables)
    }
}

impl StatementSource for LopdfBackend {
    fn page_count(&self) -> u32 {
        LopdfBackend::page_count(self)
    }
}
