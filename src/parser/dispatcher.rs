//! Chunk dispatch.
//!
//! Each chunk is an independent job: extract its tables, canonicalize the
//! rows. Jobs run on the calling thread for short documents, otherwise on a
//! dedicated rayon pool sized for the run. Results come back over a channel
//! and are slotted by chunk index, so completion order never affects output.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::unbounded;
use rayon::ThreadPoolBuilder;

use super::extractor::TableExtractor;
use super::options::ParseOptions;
use super::source::{StatementSource, TableSource};
use crate::canonical::RowCanonicalizer;
use crate::error::Warning;
use crate::model::{CanonicalRow, PageChunk};

/// Rows and warnings of one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutcome {
    pub chunk: PageChunk,
    pub rows: Vec<CanonicalRow>,
    pub warnings: Vec<Warning>,
}

impl ChunkOutcome {
    fn failed(chunk: PageChunk, warning: Warning) -> Self {
        log::warn!("{}", warning);
        Self {
            chunk,
            rows: Vec::new(),
            warnings: vec![warning],
        }
    }

    fn timed_out(chunk: PageChunk) -> Self {
        Self::failed(
            chunk,
            Warning::ChunkTimedOut {
                chunk_index: chunk.index,
                start_page: chunk.start_page,
                end_page: chunk.end_page,
            },
        )
    }
}

/// Outcomes in chunk order, plus run-level warnings.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<ChunkOutcome>,
    pub warnings: Vec<Warning>,
}

/// Process one chunk. A pure function of its inputs.
///
/// Extraction failures become a warning and an empty row set.
pub fn process_chunk<S: TableSource + ?Sized>(
    source: &S,
    chunk: &PageChunk,
    extractor: &TableExtractor,
    canonicalizer: &RowCanonicalizer,
) -> ChunkOutcome {
    match extractor.extract(source, chunk) {
        Ok(tables) => {
            let batch = canonicalizer.canonicalize_all(&tables);
            log::debug!(
                "chunk {}: {} tables, {} rows",
                chunk,
                tables.len(),
                batch.rows.len()
            );
            ChunkOutcome {
                chunk: *chunk,
                rows: batch.rows,
                warnings: batch.warnings,
            }
        }
        Err(e) => ChunkOutcome::failed(
            *chunk,
            Warning::ExtractionFailure {
                chunk_index: chunk.index,
                start_page: chunk.start_page,
                end_page: chunk.end_page,
                message: e.to_string(),
            },
        ),
    }
}

/// [`process_chunk`], with a panic reported as an extraction failure.
fn process_chunk_guarded<S: TableSource + ?Sized>(
    source: &S,
    chunk: &PageChunk,
    extractor: &TableExtractor,
    canonicalizer: &RowCanonicalizer,
) -> ChunkOutcome {
    catch_unwind(AssertUnwindSafe(|| {
        process_chunk(source, chunk, extractor, canonicalizer)
    }))
    .unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ChunkOutcome::failed(
            *chunk,
            Warning::ExtractionFailure {
                chunk_index: chunk.index,
                start_page: chunk.start_page,
                end_page: chunk.end_page,
                message: format!("worker panicked: {}", message),
            },
        )
    })
}

/// Runs chunk jobs sequentially or on a worker pool.
pub struct Dispatcher<'a> {
    options: &'a ParseOptions,
    extractor: TableExtractor,
    canonicalizer: Arc<RowCanonicalizer>,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher for one run.
    pub fn new(options: &'a ParseOptions, canonicalizer: Arc<RowCanonicalizer>) -> Self {
        Self {
            options,
            extractor: TableExtractor::new(options.primary_strategy, options.fallback_strategy),
            canonicalizer,
        }
    }

    /// Process every chunk and return outcomes in chunk order.
    pub fn run<S>(&self, source: &Arc<S>, chunks: &[PageChunk]) -> DispatchReport
    where
        S: StatementSource + ?Sized + 'static,
    {
        let total_pages = chunks.last().map_or(0, |c| c.end_page);

        if self.options.runs_sequentially(total_pages) || chunks.len() < 2 {
            log::info!("dispatching {} chunks sequentially", chunks.len());
            return self.run_sequential(source.as_ref(), chunks);
        }

        let workers = self.options.worker_count(chunks.len());
        let pool = match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bankstmt-worker-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                let warning = Warning::PoolFallback {
                    message: e.to_string(),
                };
                log::warn!("{}", warning);
                let mut report = self.run_sequential(source.as_ref(), chunks);
                report.warnings.insert(0, warning);
                return report;
            }
        };

        log::info!(
            "dispatching {} chunks on {} workers",
            chunks.len(),
            workers
        );

        let (tx, rx) = unbounded::<(usize, ChunkOutcome)>();
        for (slot, chunk) in chunks.iter().enumerate() {
            let tx = tx.clone();
            let source = Arc::clone(source);
            let canonicalizer = Arc::clone(&self.canonicalizer);
            let extractor = self.extractor;
            let chunk = *chunk;
            pool.spawn(move || {
                let outcome =
                    process_chunk_guarded(source.as_ref(), &chunk, &extractor, &canonicalizer);
                // The receiver is gone once the run has timed out.
                let _ = tx.send((slot, outcome));
            });
        }
        drop(tx);

        let total = chunks.len();
        let deadline = self.options.timeout.map(|t| Instant::now() + t);
        let mut slots: Vec<Option<ChunkOutcome>> = (0..total).map(|_| None).collect();
        let mut completed = 0;

        while completed < total {
            let received = match deadline {
                Some(deadline) => rx.recv_deadline(deadline).ok(),
                None => rx.recv().ok(),
            };
            let Some((slot, outcome)) = received else {
                break;
            };
            slots[slot] = Some(outcome);
            completed += 1;
            self.options.report_progress(completed, total);
        }

        let outcomes = slots
            .into_iter()
            .zip(chunks)
            .map(|(outcome, chunk)| outcome.unwrap_or_else(|| ChunkOutcome::timed_out(*chunk)))
            .collect();

        DispatchReport {
            outcomes,
            warnings: Vec::new(),
        }
    }

    fn run_sequential<S: TableSource + ?Sized>(
        &self,
        source: &S,
        chunks: &[PageChunk],
    ) -> DispatchReport {
        let total = chunks.len();
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(total);

        for (i, chunk) in chunks.iter().enumerate() {
            let timed_out = self
                .options
                .timeout
                .is_some_and(|timeout| started.elapsed() >= timeout);
            let outcome = if timed_out {
                ChunkOutcome::timed_out(*chunk)
            } else {
                process_chunk_guarded(source, chunk, &self.extractor, &self.canonicalizer)
            };
            outcomes.push(outcome);
            self.options.report_progress(i + 1, total);
        }

        DispatchReport {
            outcomes,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::PageTable;
    use crate::parser::options::Strategy;
    use crate::parser::planner::plan_chunks;
    use crate::parser::source::TextSource;
    use std::ops::RangeInclusive;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One transaction per page; listed pages fail or panic.
    struct PagedSource {
        pages: u32,
        failing_page: Option<u32>,
        panicking_page: Option<u32>,
    }

    impl PagedSource {
        fn new(pages: u32) -> Self {
            Self {
                pages,
                failing_page: None,
                panicking_page: None,
            }
        }
    }

    impl TextSource for PagedSource {
        fn page_text(&self, _page: u32) -> Result<String> {
            Ok(String::new())
        }
    }

    impl TableSource for PagedSource {
        fn extract_tables(
            &self,
            pages: RangeInclusive<u32>,
            _strategy: Strategy,
        ) -> Result<Vec<PageTable>> {
            if self.failing_page.is_some_and(|p| pages.contains(&p)) {
                return Err(Error::TableExtract("corrupt page".to_string()));
            }
            if self.panicking_page.is_some_and(|p| pages.contains(&p)) {
                panic!("decoder bug");
            }
            Ok(pages
                .map(|p| PageTable::from_rows(p, [vec!["1".to_string(), format!("T{}", p)]]))
                .collect())
        }
    }

    impl StatementSource for PagedSource {
        fn page_count(&self) -> u32 {
            self.pages
        }
    }

    fn run(source: PagedSource, options: &ParseOptions) -> DispatchReport {
        let chunks = plan_chunks(source.pages, options.chunk_size).unwrap();
        let dispatcher = Dispatcher::new(options, Arc::new(RowCanonicalizer::new()));
        dispatcher.run(&Arc::new(source), &chunks)
    }

    fn transaction_ids(report: &DispatchReport) -> Vec<String> {
        report
            .outcomes
            .iter()
            .flat_map(|o| o.rows.iter().map(|r| r.transaction_id.clone()))
            .collect()
    }

    #[test]
    fn test_parallel_preserves_chunk_order() {
        let options = ParseOptions::default().with_chunk_size(5).with_max_workers(4);
        let report = run(PagedSource::new(60), &options);

        assert_eq!(report.outcomes.len(), 12);
        for (i, outcome) in report.outcomes.iter().enumerate() {
            assert_eq!(outcome.chunk.index, i);
        }
        let expected: Vec<String> = (1..=60).map(|p| format!("T{}", p)).collect();
        assert_eq!(transaction_ids(&report), expected);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let parallel = run(PagedSource::new(45), &ParseOptions::default());
        let sequential = run(PagedSource::new(45), &ParseOptions::default().sequential());
        assert_eq!(parallel.outcomes, sequential.outcomes);
    }

    #[test]
    fn test_failed_chunk_is_isolated() {
        let mut source = PagedSource::new(45);
        source.failing_page = Some(20);
        let report = run(source, &ParseOptions::default());

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[1].rows.is_empty());
        assert!(matches!(
            report.outcomes[1].warnings[..],
            [Warning::ExtractionFailure {
                chunk_index: 1,
                start_page: 16,
                end_page: 30,
                ..
            }]
        ));
        assert_eq!(report.outcomes[0].rows.len(), 15);
        assert_eq!(report.outcomes[2].rows.len(), 15);
    }

    #[test]
    fn test_panicking_chunk_is_isolated() {
        let mut source = PagedSource::new(45);
        source.panicking_page = Some(40);
        let report = run(source, &ParseOptions::default());

        assert_eq!(report.outcomes[0].rows.len(), 15);
        assert!(report.outcomes[2].rows.is_empty());
        match &report.outcomes[2].warnings[0] {
            Warning::ExtractionFailure { message, .. } => assert!(message.contains("decoder bug")),
            other => panic!("unexpected warning {:?}", other),
        }
    }

    #[test]
    fn test_progress_reports_every_chunk() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));
        let (calls_seen, last_seen) = (Arc::clone(&calls), Arc::clone(&last));
        let options = ParseOptions::default().with_progress(move |done, total| {
            assert!(done <= total);
            calls_seen.fetch_add(1, Ordering::SeqCst);
            last_seen.store(done, Ordering::SeqCst);
        });

        run(PagedSource::new(45), &options);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(last.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_zero_timeout_times_out_sequential_chunks() {
        let options = ParseOptions::default()
            .sequential()
            .with_timeout(std::time::Duration::ZERO);
        let report = run(PagedSource::new(30), &options);

        assert!(report.outcomes.iter().all(|o| o.rows.is_empty()));
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.warnings[..], [Warning::ChunkTimedOut { .. }])));
    }
}
