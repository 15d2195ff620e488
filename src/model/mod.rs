//! Record types produced by a statement parse.
//!
//! Everything here is created once per parse and never mutated afterwards.
//! The raw table types carry extraction output as-is; the canonical types
//! are the normalized contract handed to downstream storage.

mod chunk;
mod statement;
mod table;
mod transaction;

pub use chunk::PageChunk;
pub use statement::{AccountMetadata, LegendEntry, PageTotals, Statement};
pub use table::{PageTable, RawTable};
pub use transaction::{CanonicalColumn, CanonicalRow, CANONICAL_WIDTH};
