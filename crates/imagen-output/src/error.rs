//! Export error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// The destination (or its temporary sibling) could not be written.
    #[error("failed to {operation} {path}: {source}")]
    DestinationUnwritable {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub(crate) fn unwritable(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::DestinationUnwritable {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Stable error-kind label for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DestinationUnwritable { .. } => "DestinationUnwritable",
        }
    }

    /// Path the failing operation touched.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::DestinationUnwritable { path, .. } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
