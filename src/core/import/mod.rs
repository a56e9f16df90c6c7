//! Bulk import of reference data

pub mod billables;
pub mod summary;

pub use billables::{import_billables, import_billables_from_file, parse_billable_row, parse_cost};
pub use summary::{ImportSummary, SkippedRow};
