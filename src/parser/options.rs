//! Parsing options and configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

/// Called with `(chunks_completed, total_chunks)` after each chunk.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Default number of pages per chunk.
pub const DEFAULT_CHUNK_SIZE: u32 = 15;

/// Default upper bound on worker threads.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Documents shorter than this are processed sequentially.
pub const DEFAULT_SEQUENTIAL_THRESHOLD: u32 = 20;

/// Table extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Whitespace-delimited tables, columns found from text alignment
    #[default]
    Sparse,
    /// Tables delimited by drawn rules
    Ruled,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Sparse => write!(f, "sparse"),
            Strategy::Ruled => write!(f, "ruled"),
        }
    }
}

/// Bounds for the row-count sanity check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationOptions {
    /// Fewer transactions per page than this is reported
    pub min_rows_per_page: f32,
    /// More transactions per page than this is reported
    pub max_rows_per_page: f32,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            min_rows_per_page: 0.5,
            max_rows_per_page: 100.0,
        }
    }
}

/// Options for parsing bank statements.
#[derive(Clone)]
pub struct ParseOptions {
    /// Pages per chunk
    pub chunk_size: u32,

    /// Upper bound on worker threads
    pub max_workers: usize,

    /// Whether to use parallel processing
    pub parallel: bool,

    /// Page count below which parallel mode is skipped
    pub sequential_threshold: u32,

    /// Give up waiting for chunks after this long
    pub timeout: Option<Duration>,

    /// Strategy tried first for every chunk
    pub primary_strategy: Strategy,

    /// Strategy tried once when the primary fails or finds nothing
    pub fallback_strategy: Option<Strategy>,

    /// Chunk completion callback
    pub progress: Option<ProgressCallback>,

    /// Row-count sanity bounds
    pub validation: ValidationOptions,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pages per chunk.
    pub fn with_chunk_size(mut self, chunk_size: u32) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the worker upper bound.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the page count below which work stays on the calling thread.
    pub fn with_sequential_threshold(mut self, pages: u32) -> Self {
        self.sequential_threshold = pages;
        self
    }

    /// Set a deadline for chunk collection.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the primary and fallback strategies.
    pub fn with_strategies(mut self, primary: Strategy, fallback: Option<Strategy>) -> Self {
        self.primary_strategy = primary;
        self.fallback_strategy = fallback;
        self
    }

    /// Set a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Set validation bounds.
    pub fn with_validation(mut self, validation: ValidationOptions) -> Self {
        self.validation = validation;
        self
    }

    /// Reject settings no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size must be positive"));
        }
        if self.max_workers == 0 {
            return Err(Error::config("max_workers must be positive"));
        }
        Ok(())
    }

    /// Whether a document of this size runs on the calling thread.
    pub fn runs_sequentially(&self, total_pages: u32) -> bool {
        !self.parallel || total_pages < self.sequential_threshold
    }

    /// Worker threads for a run over `chunks` chunks.
    pub fn worker_count(&self, chunks: usize) -> usize {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.max_workers.min(cpus).min(chunks).max(1)
    }

    pub(crate) fn report_progress(&self, completed: usize, total: usize) {
        if let Some(callback) = &self.progress {
            callback(completed, total);
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            parallel: true,
            sequential_threshold: DEFAULT_SEQUENTIAL_THRESHOLD,
            timeout: None,
            primary_strategy: Strategy::Sparse,
            fallback_strategy: Some(Strategy::Ruled),
            progress: None,
            validation: ValidationOptions::default(),
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("chunk_size", &self.chunk_size)
            .field("max_workers", &self.max_workers)
            .field("parallel", &self.parallel)
            .field("sequential_threshold", &self.sequential_threshold)
            .field("timeout", &self.timeout)
            .field("primary_strategy", &self.primary_strategy)
            .field("fallback_strategy", &self.fallback_strategy)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .field("validation", &self.validation)
            .finish()
    }
}
