//! # bankstmt
//!
//! Parallel extraction of bank-statement PDFs into typed records.
//!
//! A statement is split into fixed-size page chunks. Each chunk goes through
//! table extraction (a sparse whitespace strategy with a ruled-line fallback)
//! and row canonicalization on a worker pool; the results are merged back in
//! document order with contiguous sequence ids. Account metadata, page totals
//! and the transaction-code legend are read from fixed pages on the side.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bankstmt::{parse_file, render};
//!
//! fn main() -> bankstmt::Result<()> {
//!     let statement = parse_file("statement.pdf")?;
//!
//!     println!("{} transactions", statement.transactions.len());
//!     for warning in &statement.warnings {
//!         eprintln!("warning: {}", warning);
//!     }
//!
//!     render::write_csv_dir(&statement, "out")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! Only configuration problems (bad chunk size or worker count, a missing
//! input document, an unreadable file) fail a parse. A chunk whose tables
//! cannot be extracted, a page that does not look like it should, or an
//! amount that does not parse are all reported as [`Warning`]s next to the
//! best-effort [`Statement`].

pub mod canonical;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod sections;

// Re-export commonly used types
pub use canonical::{clean_amount, NoiseFilter, NoisePattern, RowCanonicalizer};
pub use detect::{is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result, Section, Warning};
pub use model::{
    AccountMetadata, CanonicalColumn, CanonicalRow, LegendEntry, PageChunk, PageTable,
    PageTotals, RawTable, Statement,
};
pub use parser::{
    plan_chunks, LopdfBackend, ParseOptions, ProgressCallback, StatementParser, StatementSource,
    Strategy, TableSource, TextSource, ValidationOptions,
};
pub use render::JsonFormat;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Parse a statement PDF with default options.
///
/// # Example
///
/// ```no_run
/// use bankstmt::parse_file;
///
/// let statement = parse_file("statement.pdf").unwrap();
/// println!("Account: {}", statement.metadata.account_number);
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Statement> {
    StatementParser::open(path)?.parse()
}

/// Parse a statement PDF with custom options.
///
/// # Example
///
/// ```no_run
/// use bankstmt::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new()
///     .with_chunk_size(10)
///     .with_max_workers(4);
/// let statement = parse_file_with_options("statement.pdf", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Statement> {
    StatementParser::open_with_options(path, options)?.parse()
}

/// Parse a statement PDF held in memory.
///
/// # Example
///
/// ```no_run
/// use bankstmt::parse_bytes;
///
/// let data = std::fs::read("statement.pdf").unwrap();
/// let statement = parse_bytes(&data).unwrap();
/// ```
pub fn parse_bytes(data: &[u8]) -> Result<Statement> {
    StatementParser::from_bytes(data)?.parse()
}

/// Parse a statement PDF held in memory with custom options.
pub fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Statement> {
    StatementParser::from_bytes_with_options(data, options)?.parse()
}

/// Parse a statement PDF from a reader.
///
/// # Example
///
/// ```no_run
/// use bankstmt::{parse_reader_with_options, ParseOptions};
/// use std::fs::File;
///
/// let file = File::open("statement.pdf").unwrap();
/// let statement = parse_reader_with_options(file, ParseOptions::new().sequential()).unwrap();
/// ```
pub fn parse_reader_with_options<R: Read>(reader: R, options: ParseOptions) -> Result<Statement> {
    StatementParser::from_reader_with_options(reader, options)?.parse()
}

/// Parse any source that provides page text and table extraction.
///
/// This is the entry point for alternative PDF backends and for tests that
/// drive the pipeline with synthetic pages.
pub fn parse_source<S>(source: Arc<S>, options: ParseOptions) -> Result<Statement>
where
    S: StatementSource + ?Sized + 'static,
{
    StatementParser::from_source(source, options)?.parse()
}
