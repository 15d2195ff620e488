//! Raw table types.

use serde::{Deserialize, Serialize};

/// A table as returned by a table-extraction capability for one page.
///
/// Row widths may vary within a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTable {
    /// 1-indexed page the table was found on
    pub page: u32,
    /// Cell text, row-major
    pub rows: Vec<Vec<String>>,
}

impl PageTable {
    /// Create a table for a page.
    pub fn new(page: u32, rows: Vec<Vec<String>>) -> Self {
        Self { page, rows }
    }

    /// Create a table from string-like rows.
    pub fn from_rows<R, S>(page: u32, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            page,
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A page table tagged with the chunk that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Chunk the table was extracted in
    pub chunk_index: usize,
    /// 1-indexed source page
    pub source_page: u32,
    /// Cell text, row-major
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Tag a page table with its chunk.
    pub fn from_page_table(chunk_index: usize, table: PageTable) -> Self {
        Self {
            chunk_index,
            source_page: table.page,
            rows: table.rows,
        }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row in the table.
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_table_from_page_table() {
        let table = PageTable::from_rows(4, [vec!["1", "T1"], vec!["2", "T2", "extra"]]);
        let raw = RawTable::from_page_table(2, table);

        assert_eq!(raw.chunk_index, 2);
        assert_eq!(raw.source_page, 4);
        assert_eq!(raw.row_count(), 2);
        assert_eq!(raw.max_width(), 3);
        assert!(!raw.is_empty());
    }

    #[test]
    fn test_empty_table() {
        let raw = RawTable::from_page_table(0, PageTable::new(1, vec![]));
        assert!(raw.is_empty());
        assert_eq!(raw.max_width(), 0);
    }
}
