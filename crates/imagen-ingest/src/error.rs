//! Error types for IMAGEN data ingestion.

use std::path::PathBuf;

use imagen_model::Session;
use thiserror::Error;

/// Errors that can occur while reading raw exports and label stores.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// A declared source file does not exist.
    #[error("source file not found: {path}")]
    SourceFileMissing { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Expected source columns are absent.
    #[error("{path} is missing expected column(s): {}", missing.join(", "))]
    SourceSchemaMismatch { path: PathBuf, missing: Vec<String> },

    // === Identifier Errors ===
    /// An identifier cell could not be normalized; the whole file is rejected.
    #[error("malformed identifier '{value}' in {path} ({session}, row {row}): {reason}")]
    MalformedIdentifier {
        path: PathBuf,
        session: Session,
        row: usize,
        value: String,
        reason: &'static str,
    },

    // === Label Store Errors ===
    /// The labelled-dataset store is inconsistent.
    #[error("malformed label store {path}: {message}")]
    LabelStoreMalformed { path: PathBuf, message: String },

    /// HDF5 support was not compiled in.
    #[error("cannot read {path}: HDF5 support is disabled (rebuild with the `hdf5` feature)")]
    LabelStoreUnsupported { path: PathBuf },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl IngestError {
    /// Stable error-kind label for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceFileMissing { .. } => "SourceFileMissing",
            Self::FileRead { .. } => "FileRead",
            Self::CsvParse { .. } => "CsvParse",
            Self::SourceSchemaMismatch { .. } => "SourceSchemaMismatch",
            Self::MalformedIdentifier { .. } => "MalformedIdentifier",
            Self::LabelStoreMalformed { .. } => "LabelStoreMalformed",
            Self::LabelStoreUnsupported { .. } => "LabelStoreUnsupported",
            Self::DataFrame { .. } => "DataFrame",
        }
    }

    pub(crate) fn label_store(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::LabelStoreMalformed {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
