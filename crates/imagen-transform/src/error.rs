//! Error types for instrument table construction.

use std::path::PathBuf;

use imagen_ingest::IngestError;
use imagen_model::Session;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// Reading or normalizing one session's source failed.
    #[error("session {session}: {source}")]
    Ingest {
        session: Session,
        #[source]
        source: IngestError,
    },

    /// The instrument does not declare the requested session.
    #[error("instrument {instrument} is not collected at session {session}")]
    SessionNotDeclared { instrument: String, session: Session },

    /// A session table does not carry the instrument's declared columns.
    #[error("session {session} table from {path} has columns [{found}], expected [{expected}]")]
    ColumnMismatch {
        session: Session,
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// A table lacks a column the operation needs.
    #[error("table has no '{column}' column")]
    MissingColumn { column: String },

    /// A cell of a key column cannot be read back.
    #[error("row {row} of column '{column}' holds invalid value '{value}'")]
    InvalidKey {
        column: String,
        row: usize,
        value: String,
    },

    /// Annotation would overwrite an existing column.
    #[error("table already has a '{column}' column")]
    ColumnConflict { column: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl TransformError {
    pub(crate) fn ingest(session: Session, source: IngestError) -> Self {
        Self::Ingest { session, source }
    }

    /// Stable error-kind label for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ingest { source, .. } => source.kind(),
            Self::SessionNotDeclared { .. } => "SessionNotDeclared",
            Self::ColumnMismatch { .. } => "SourceSchemaMismatch",
            Self::MissingColumn { .. } => "MissingColumn",
            Self::InvalidKey { .. } => "InvalidKey",
            Self::ColumnConflict { .. } => "ColumnConflict",
            Self::DataFrame { .. } => "DataFrame",
        }
    }

    /// Session that triggered the error, if any.
    pub fn session(&self) -> Option<Session> {
        match self {
            Self::Ingest { session, .. }
            | Self::SessionNotDeclared { session, .. }
            | Self::ColumnMismatch { session, .. } => Some(*session),
            _ => None,
        }
    }
}

impl From<polars::prelude::PolarsError> for TransformError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_errors_keep_their_kind() {
        let err = TransformError::ingest(
            Session::FollowUp2,
            IngestError::SourceFileMissing {
                path: PathBuf::from("ctq.csv"),
            },
        );
        assert_eq!(err.kind(), "SourceFileMissing");
        assert_eq!(err.session(), Some(Session::FollowUp2));
        assert_eq!(
            err.to_string(),
            "session FU2: source file not found: ctq.csv"
        );
    }
}
