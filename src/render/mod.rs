//! Rendering parsed statements to JSON and CSV.

mod csv;
mod json;

pub use self::csv::{
    write_csv_dir, write_legends, write_metadata, write_totals, write_transactions,
    LEGENDS_FILE, METADATA_FILE, TOTALS_FILE, TRANSACTIONS_FILE,
};
pub use self::json::{to_json, JsonFormat};
