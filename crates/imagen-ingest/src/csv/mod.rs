//! CSV reading utilities.

mod reader;

pub use reader::{
    DEFAULT_INFER_SCHEMA_LENGTH, read_source_table, read_table, read_typed_table,
    require_columns,
};
