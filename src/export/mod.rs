//! CSV export
//!
//! The exporter expands collected stats into headers, then projects every
//! record onto those headers. Field options change how a field is expanded:
//! `named` turns runtime values into column names, `grouped` fits a whole
//! field into one cell.

mod exporter;
mod headers;
mod options;
mod row;
mod writer;

pub use exporter::Exporter;
pub use options::ALLOWED_SEPARATORS;
pub use row::escape_grouped;
pub use writer::CsvExport;
