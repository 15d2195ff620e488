//! Statement parsing pipeline.

mod backend;
mod dispatcher;
mod extractor;
mod layout;
mod merge;
mod options;
mod planner;
mod ruled;
mod source;
mod statement_parser;
mod table_detector;

pub use backend::{decode_text_simple, ContentOp, LopdfBackend, PageId, PdfBackend, PdfValue};
pub use dispatcher::{process_chunk, ChunkOutcome, DispatchReport, Dispatcher};
pub use extractor::TableExtractor;
pub use layout::{extract_page_layout, PageLayout, Rule, RuleKind, TextSpan};
pub use merge::{merge, renumber, validate, MergedLedger};
pub use options::{
    ParseOptions, ProgressCallback, Strategy, ValidationOptions, DEFAULT_CHUNK_SIZE,
    DEFAULT_MAX_WORKERS, DEFAULT_SEQUENTIAL_THRESHOLD,
};
pub use planner::plan_chunks;
pub use ruled::{RuledConfig, RuledDetector};
pub use source::{StatementSource, TableSource, TextSource};
pub use statement_parser::StatementParser;
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};
