//! Result types of the pipeline commands.

use std::path::PathBuf;

use imagen_ingest::IngestError;
use imagen_model::Session;
use imagen_output::ExportError;
use imagen_standards::StandardsError;
use imagen_transform::{DuplicateRecord, TransformError};
use serde::Serialize;
use thiserror::Error;

/// Failure of one instrument (or label set) pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Standards(#[from] StandardsError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl BuildError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Standards(err) => err.kind(),
            Self::Ingest(err) => err.kind(),
            Self::Transform(err) => err.kind(),
            Self::Export(err) => err.kind(),
        }
    }

    pub fn session(&self) -> Option<Session> {
        match self {
            Self::Transform(err) => err.session(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationSummary {
    pub label_set: String,
    pub session: Option<Session>,
    pub records: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub conflicting_keys: usize,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentSummary {
    pub instrument: String,
    pub description: Option<String>,
    pub sessions: Vec<Session>,
    pub records: usize,
    pub excluded: usize,
    pub dropped_cells: usize,
    pub duplicates: Vec<DuplicateRecord>,
    pub output: Option<PathBuf>,
    pub annotation: Option<AnnotationSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentFailure {
    pub instrument: String,
    pub kind: &'static str,
    pub session: Option<Session>,
    pub message: String,
}

impl InstrumentFailure {
    pub fn new(instrument: impl Into<String>, error: &BuildError) -> Self {
        Self {
            instrument: instrument.into(),
            kind: error.kind(),
            session: error.session(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a batch build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildResult {
    pub built: Vec<InstrumentSummary>,
    pub failed: Vec<InstrumentFailure>,
}

impl BuildResult {
    pub fn has_errors(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn duplicate_count(&self) -> usize {
        self.built.iter().map(|summary| summary.duplicates.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelSetSummary {
    pub label_set: String,
    pub records: usize,
    pub sessions: Vec<Session>,
    pub output: Option<PathBuf>,
}
