//! Statistics over annotated IMAGEN instrument tables.
//!
//! Every function reads a table and returns plain values; tables are never
//! modified. Missing values are skipped, never imputed.

pub mod crosstab;
pub mod describe;
pub mod error;
pub mod inference;
pub mod special;

pub use crosstab::{Crosstab, crosstab};
pub use describe::{ColumnSummary, Summary, describe, numeric_columns, summarize};
pub use error::{Result, StatsError};
pub use inference::{
    ColumnComparison, GroupComparison, TestResult, bartlett, compare_groups, compare_samples,
    levene, student_t, welch_t,
};
