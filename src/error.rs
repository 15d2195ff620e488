//! Error and warning types for bankstmt.
//!
//! Only [`Error`] aborts a parse. Everything the pipeline can recover from
//! is reported as a [`Warning`] next to the best-effort result.

use std::io;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for bankstmt operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Hard failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid chunk size, worker count, page count, or missing input document.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error extracting tables with a given strategy.
    #[error("Table extraction error: {0}")]
    TableExtract(String),

    /// Error while writing JSON or CSV output.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Whether this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Render(format!("CSV error: {}", err))
    }
}

/// Which fixed-page section a [`Warning::ParseMismatch`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Account metadata on the first page
    Metadata,
    /// Balance totals on the second-to-last page
    Totals,
    /// Transaction code legend on the last two pages
    Legends,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Metadata => write!(f, "metadata"),
            Section::Totals => write!(f, "totals"),
            Section::Legends => write!(f, "legends"),
        }
    }
}

/// Recoverable conditions surfaced alongside a parse result.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A chunk's tables could not be extracted with any strategy.
    #[error("chunk {chunk_index} (pages {start_page}-{end_page}) failed: {message}")]
    ExtractionFailure {
        chunk_index: usize,
        start_page: u32,
        end_page: u32,
        message: String,
    },

    /// A chunk did not finish before the configured timeout.
    #[error("chunk {chunk_index} (pages {start_page}-{end_page}) timed out")]
    ChunkTimedOut {
        chunk_index: usize,
        start_page: u32,
        end_page: u32,
    },

    /// A fixed-page section did not have the expected structure.
    #[error("{section} section mismatch: {message}")]
    ParseMismatch { section: Section, message: String },

    /// A monetary cell could not be parsed and was defaulted.
    #[error("page {page}, row {sequence}: unparsable {field} {value:?}, defaulted to 0")]
    MalformedRow {
        page: u32,
        sequence: u32,
        field: &'static str,
        value: String,
    },

    /// Transaction count is far from what the page count suggests.
    #[error("{rows} transactions over {pages} pages is outside {min}-{max} rows per page")]
    RowCountDeviation {
        rows: usize,
        pages: u32,
        min: f32,
        max: f32,
    },

    /// Rows where withdrawal and deposit are both zero or both non-zero.
    #[error("{count} transactions do not have exactly one of withdrawal/deposit set")]
    UnbalancedRows { count: usize, sequence_ids: Vec<u32> },

    /// The worker pool could not be created; chunks ran in-process.
    #[error("worker pool unavailable, ran sequentially: {message}")]
    PoolFallback { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("chunk_size must be greater than 0");
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Configuration error: chunk_size must be greater than 0"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::ExtractionFailure {
            chunk_index: 1,
            start_page: 16,
            end_page: 30,
            message: "no tables".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "chunk 1 (pages 16-30) failed: no tables"
        );

        let warning = Warning::ParseMismatch {
            section: Section::Totals,
            message: "Opening Bal: not found".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "totals section mismatch: Opening Bal: not found"
        );
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = Warning::ChunkTimedOut {
            chunk_index: 2,
            start_page: 31,
            end_page: 45,
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("\"kind\":\"chunk_timed_out\""));
        assert!(json.contains("\"chunk_index\":2"));
    }
}
