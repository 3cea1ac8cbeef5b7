//! IMAGEN data ingestion.
//!
//! This crate reads the raw inputs of the instrument pipeline into Polars
//! DataFrames and typed records.
//!
//! # Features
//!
//! - **CSV Loading**: raw questionnaire exports (all text) and exported tables (typed)
//! - **Identifier Normalization**: user-code and plain-integer subject IDs
//! - **Label Stores**: decode labelled-dataset files into cohort labels
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use imagen_ingest::{IdentifierNormalizer, read_source_table};
//! use imagen_model::Session;
//!
//! let path = Path::new("IMAGEN-IMGN_NEO_FFI_FU3.csv");
//! let df = read_source_table(path)?;
//! let normalizer = IdentifierNormalizer::new([Session::FollowUp3]);
//! let id = normalizer.normalize("71766352", Session::FollowUp3)?;
//! ```

mod csv;
mod error;
mod identifier;
pub mod labels;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{
    DEFAULT_INFER_SCHEMA_LENGTH, read_source_table, read_table, read_typed_table, require_columns,
};

// === Identifiers ===
pub use identifier::{
    IdEncoding, IdentifierError, IdentifierNormalizer, USER_CODE_PREFIX_LEN, normalize_plain,
    normalize_user_code,
};

// === Labels ===
pub use labels::{
    LABEL_TABLE_COLUMNS, LabelArrays, decode_labels, labels_from_frame, labels_to_frame,
    load_label_set, read_label_arrays, read_label_table,
};
