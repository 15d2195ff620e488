//! Statement parser: the full pipeline over one document.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::canonical::RowCanonicalizer;
use crate::error::{Error, Result};
use crate::model::Statement;
use crate::sections::extract_sections;

use super::backend::LopdfBackend;
use super::dispatcher::Dispatcher;
use super::merge::{merge, validate};
use super::options::ParseOptions;
use super::planner::plan_chunks;
use super::source::StatementSource;

/// Bank statement parser.
///
/// Owns its document for the duration of one [`parse`](Self::parse) call.
pub struct StatementParser<S: StatementSource + ?Sized + 'static> {
    source: Arc<S>,
    options: ParseOptions,
    canonicalizer: RowCanonicalizer,
}

impl StatementParser<LopdfBackend> {
    /// Open a PDF statement.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF statement with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        // Bad options fail before the document is loaded.
        options.validate()?;
        let backend = LopdfBackend::load_file(path)?;
        Self::from_source(Arc::new(backend), options)
    }

    /// Parse a PDF statement from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a PDF statement from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        options.validate()?;
        let backend = LopdfBackend::load_bytes(data)?;
        Self::from_source(Arc::new(backend), options)
    }

    /// Parse a PDF statement from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }
}

impl<S: StatementSource + ?Sized + 'static> StatementParser<S> {
    /// Parse any statement source.
    pub fn from_source(source: Arc<S>, options: ParseOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            source,
            options,
            canonicalizer: RowCanonicalizer::new(),
        })
    }

    /// Replace the row canonicalizer (e.g. for custom noise phrases).
    pub fn with_canonicalizer(mut self, canonicalizer: RowCanonicalizer) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    /// The options this parser runs with.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Run the pipeline.
    ///
    /// Only configuration problems fail; everything else is reported in
    /// [`Statement::warnings`].
    pub fn parse(self) -> Result<Statement> {
        let page_count = self.source.page_count();
        if page_count == 0 {
            return Err(Error::config("document has no pages"));
        }

        let chunks = plan_chunks(page_count, self.options.chunk_size)?;
        log::info!(
            "parsing {} pages in {} chunks of up to {}",
            page_count,
            chunks.len(),
            self.options.chunk_size
        );

        let sections = extract_sections(self.source.as_ref(), page_count);

        let dispatcher = Dispatcher::new(&self.options, Arc::new(self.canonicalizer));
        let report = dispatcher.run(&self.source, &chunks);

        let ledger = merge(report.outcomes);
        let validation = validate(&ledger.rows, page_count, &self.options.validation);

        let mut warnings = report.warnings;
        warnings.extend(ledger.warnings);
        warnings.extend(validation);
        warnings.extend(sections.warnings);

        log::info!(
            "parsed {} transactions with {} warnings",
            ledger.rows.len(),
            warnings.len()
        );

        Ok(Statement {
            page_count,
            metadata: sections.metadata,
            transactions: ledger.rows,
            totals: sections.totals,
            legends: sections.legends,
            warnings,
        })
    }
}
