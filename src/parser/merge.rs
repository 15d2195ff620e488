//! Merging chunk outcomes and sanity checks.

use super::dispatcher::ChunkOutcome;
use super::options::ValidationOptions;
use crate::error::Warning;
use crate::model::CanonicalRow;

/// Ledger assembled from all chunks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedLedger {
    pub rows: Vec<CanonicalRow>,
    pub warnings: Vec<Warning>,
}

/// Concatenate chunk rows in chunk order and renumber them `1..=N`.
///
/// Chunk warnings are kept in chunk order.
pub fn merge(mut outcomes: Vec<ChunkOutcome>) -> MergedLedger {
    outcomes.sort_by_key(|o| o.chunk.index);

    let mut ledger = MergedLedger::default();
    for outcome in outcomes {
        ledger.rows.extend(outcome.rows);
        ledger.warnings.extend(outcome.warnings);
    }

    renumber(&mut ledger.rows);
    ledger
}

/// Overwrite sequence ids with their position, starting at 1.
pub fn renumber(rows: &mut [CanonicalRow]) {
    for (i, row) in rows.iter_mut().enumerate() {
        row.sequence_id = i as u32 + 1;
    }
}

/// Informational checks on a merged ledger. Never fails.
pub fn validate(rows: &[CanonicalRow], page_count: u32, bounds: &ValidationOptions) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if page_count > 0 {
        let per_page = rows.len() as f32 / page_count as f32;
        if per_page < bounds.min_rows_per_page || per_page > bounds.max_rows_per_page {
            warnings.push(Warning::RowCountDeviation {
                rows: rows.len(),
                pages: page_count,
                min: bounds.min_rows_per_page,
                max: bounds.max_rows_per_page,
            });
        }
    }

    let unbalanced: Vec<u32> = rows
        .iter()
        .filter(|row| !row.is_single_sided())
        .map(|row| row.sequence_id)
        .collect();
    if !unbalanced.is_empty() {
        warnings.push(Warning::UnbalancedRows {
            count: unbalanced.len(),
            sequence_ids: unbalanced,
        });
    }

    for warning in &warnings {
        log::warn!("{}", warning);
    }
    warnings
}
