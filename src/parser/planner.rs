//! Page chunk planning.

use crate::error::{Error, Result};
use crate::model::PageChunk;

/// Partition pages `1..=total_pages` into contiguous chunks of `chunk_size`.
///
/// The last chunk may be shorter. Both arguments must be positive.
pub fn plan_chunks(total_pages: u32, chunk_size: u32) -> Result<Vec<PageChunk>> {
    if chunk_size == 0 {
        return Err(Error::config("chunk_size must be positive"));
    }
    if total_pages == 0 {
        return Err(Error::config("document has no pages"));
    }

    let chunks = (1..=total_pages)
        .step_by(chunk_size as usize)
        .enumerate()
        .map(|(index, start)| {
            let end = start.saturating_add(chunk_size - 1).min(total_pages);
            PageChunk::new(index, start, end)
        })
        .collect();

    Ok(chunks)
}
