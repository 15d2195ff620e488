//! Table extraction with strategy fallback.

use super::options::Strategy;
use super::source::TableSource;
use crate::error::{Error, Result};
use crate::model::{PageChunk, RawTable};

/// Runs the primary strategy over a chunk and retries once with the
/// fallback when the primary fails or finds nothing.
#[derive(Debug, Clone, Copy)]
pub struct TableExtractor {
    primary: Strategy,
    fallback: Option<Strategy>,
}

impl TableExtractor {
    /// Create an extractor.
    pub fn new(primary: Strategy, fallback: Option<Strategy>) -> Self {
        Self { primary, fallback }
    }

    /// Extract the chunk's tables, tagged with the chunk index.
    ///
    /// Fails only when every attempted strategy fails.
    pub fn extract<S: TableSource + ?Sized>(
        &self,
        source: &S,
        chunk: &PageChunk,
    ) -> Result<Vec<RawTable>> {
        let primary = source.extract_tables(chunk.pages_range(), self.primary);

        let tables = match (primary, self.fallback) {
            (Ok(tables), _) if !tables.is_empty() => tables,
            (Ok(tables), None) => tables,
            (Err(e), None) => return Err(e),
            (Ok(_), Some(fallback)) => {
                log::debug!(
                    "chunk {}: {} strategy found no tables, trying {}",
                    chunk,
                    self.primary,
                    fallback
                );
                match source.extract_tables(chunk.pages_range(), fallback) {
                    Ok(tables) => tables,
                    Err(e) => {
                        log::debug!("chunk {}: {} strategy failed: {}", chunk, fallback, e);
                        Vec::new()
                    }
                }
            }
            (Err(primary_err), Some(fallback)) => {
                log::debug!(
                    "chunk {}: {} strategy failed: {}, trying {}",
                    chunk,
                    self.primary,
                    primary_err,
                    fallback
                );
                source
                    .extract_tables(chunk.pages_range(), fallback)
                    .map_err(|fallback_err| {
                        Error::TableExtract(format!(
                            "{}: {}; {}: {}",
                            self.primary, primary_err, fallback, fallback_err
                        ))
                    })?
            }
        };

        Ok(tables
            .into_iter()
            .map(|table| RawTable::from_page_table(chunk.index, table))
            .collect())
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new(Strategy::Sparse, Some(Strategy::Ruled))
    }
}
