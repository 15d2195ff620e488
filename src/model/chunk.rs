//! Page chunks.

use serde::{Deserialize, Serialize};

/// A contiguous, inclusive range of 1-indexed pages processed as one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageChunk {
    /// Position of this chunk in the plan (0-based)
    pub index: usize,
    /// First page (1-indexed, inclusive)
    pub start_page: u32,
    /// Last page (1-indexed, inclusive)
    pub end_page: u32,
}

impl PageChunk {
    /// Create a new chunk.
    pub fn new(index: usize, start_page: u32, end_page: u32) -> Self {
        Self {
            index,
            start_page,
            end_page,
        }
    }

    /// Number of pages in the chunk.
    pub fn len(&self) -> u32 {
        self.end_page + 1 - self.start_page
    }

    /// Chunks are never empty; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.end_page < self.start_page
    }

    /// Iterate the page numbers of the chunk.
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start_page..=self.end_page
    }

    /// The chunk's pages as an inclusive range.
    pub fn pages_range(&self) -> std::ops::RangeInclusive<u32> {
        self.start_page..=self.end_page
    }

    /// Check if a page falls within this chunk.
    pub fn contains(&self, page: u32) -> bool {
        (self.start_page..=self.end_page).contains(&page)
    }
}

impl std::fmt::Display for PageChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} [{}-{}]", self.index, self.start_page, self.end_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_pages() {
        let chunk = PageChunk::new(1, 16, 30);
        assert_eq!(chunk.len(), 15);
        assert!(!chunk.is_empty());
        assert!(chunk.contains(16));
        assert!(chunk.contains(30));
        assert!(!chunk.contains(31));
        assert_eq!(chunk.pages().count(), 15);
        assert_eq!(chunk.to_string(), "#1 [16-30]");
    }
}
