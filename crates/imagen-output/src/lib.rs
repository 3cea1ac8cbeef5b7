//! Table export for the IMAGEN instrument pipeline.
//!
//! Exported tables are plain CSV with a header row and no index column
//! unless one is requested.

pub mod error;
pub mod export;

pub use error::{ExportError, Result};
pub use export::{ExportOptions, INDEX_COLUMN, export_table, export_tables};
