//! Statistics error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    /// The table lacks a requested column.
    #[error("table has no '{column}' column")]
    MissingColumn { column: String },

    /// A group has too few non-missing values for the statistic.
    #[error("column '{column}' has {count} value(s) in group '{group}', need at least {required}")]
    InsufficientData {
        column: String,
        group: String,
        count: usize,
        required: usize,
    },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl StatsError {
    /// Stable error-kind label for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingColumn { .. } => "MissingColumn",
            Self::InsufficientData { .. } => "InsufficientData",
            Self::DataFrame { .. } => "DataFrame",
        }
    }
}

impl From<polars::prelude::PolarsError> for StatsError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
