//! Instrument table construction.
//!
//! The stages of one instrument's build, each a plain function over owned
//! or borrowed tables:
//!
//! 1. [`load_session`]: one raw file to a [`SessionTable`]
//! 2. [`merge_sessions`]: session tables to an [`InstrumentTable`]
//! 3. [`annotate`]: left-join of cohort labels
//!
//! # Example
//!
//! ```ignore
//! use imagen_standards::{DataLayout, load_default_registry};
//! use imagen_transform::{load_instrument, merge_sessions};
//!
//! let registry = load_default_registry()?;
//! let schema = registry.schema_for("CTQ")?;
//! let layout = DataLayout::from_env();
//! let sessions = load_instrument(schema, &layout)?;
//! let merged = merge_sessions(schema, &sessions)?;
//! ```

pub mod annotate;
pub mod derive;
pub mod error;
pub mod frame;
pub mod loader;
pub mod merge;

pub use annotate::{ANNOTATION_COLUMNS, AnnotationOutcome, annotate, labels_for_session};
pub use derive::{DerivedColumn, derive_column};
pub use error::{Result, TransformError};
pub use frame::{
    InstrumentTable, SessionTable, empty_instrument_frame, expected_columns, filter_session,
    instrument_dtypes, record_keys,
};
pub use loader::{load_instrument, load_session, load_session_from_path};
pub use merge::{DuplicateRecord, MergeOutcome, find_duplicates, merge_sessions};
